//! docsite: generate an HTML documentation site from `jsdoc -X` output.
//!
//! - **file mode**: `docsite -c conf.json -d site doclets/*.json`
//! - **stdin mode**: `jsdoc -X src | docsite -d site`

use anyhow::{Context, Result};
use clap::Parser;
use docsite::{parse_doclets, publish, Config, Doclet, PublishOptions};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "docsite",
    version,
    about = "Generate a cross-linked HTML documentation site from jsdoc doclets"
)]
struct Cli {
    /// Doclet dumps (JSON files, directories or glob patterns). If omitted,
    /// reads one dump from stdin.
    files: Vec<String>,

    /// Configuration file
    #[arg(short = 'c', long)]
    configure: Option<PathBuf>,

    /// Output directory [default: out]
    #[arg(short = 'd', long)]
    destination: Option<PathBuf>,

    /// README embedded in the main page
    #[arg(short = 'R', long)]
    readme: Option<PathBuf>,

    /// Include symbols marked @private
    #[arg(short = 'p', long)]
    private: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match cli.configure.as_deref() {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let doclets = if cli.files.is_empty() {
        read_stdin()?
    } else {
        read_files(&expand_globs(&cli.files)?)?
    };
    tracing::info!("loaded {} doclets", doclets.len());

    let readme = match cli.readme.as_deref().or(config.opts.readme.as_deref()) {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read README {}", path.display()))?,
        ),
        None => None,
    };

    let options = PublishOptions {
        destination: cli
            .destination
            .clone()
            .or_else(|| config.opts.destination.clone())
            .unwrap_or_else(|| PathBuf::from("out")),
        readme,
        private: cli.private || config.opts.private,
        mainpagetitle: config.opts.mainpagetitle.clone(),
    };

    let summary = publish(doclets, &config, &options)?;
    println!("{}", summary.outdir.display());
    Ok(())
}

fn read_stdin() -> Result<Vec<Doclet>> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;
    parse_doclets(&input).context("invalid doclet JSON on stdin")
}

/// Concatenate the doclets of every dump, in path order.
fn read_files(paths: &[PathBuf]) -> Result<Vec<Doclet>> {
    let mut doclets = Vec::new();
    for path in paths {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let parsed = parse_doclets(&content)
            .with_context(|| format!("invalid doclet JSON in {}", path.display()))?;
        tracing::debug!("{}: {} doclets", path.display(), parsed.len());
        doclets.extend(parsed);
    }
    Ok(doclets)
}

/// File extensions recognized as doclet dumps.
const SUPPORTED_EXTENSIONS: &[&str] = &["json"];

/// Expand glob patterns into a list of real file paths.
/// Also handles bare directory paths by scanning for doclet dumps.
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        // Directories are scanned one level deep
        if path.is_dir() {
            let entries = fs::read_dir(path)
                .with_context(|| format!("failed to read directory: {}", path.display()))?;
            for entry in entries.flatten() {
                let p = entry.path();
                if p.is_file() {
                    if let Some(ext) = p.extension().and_then(|e| e.to_str()) {
                        if SUPPORTED_EXTENSIONS.contains(&ext) {
                            files.push(p);
                        }
                    }
                }
            }
            continue;
        }
        let matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            tracing::warn!("no files matched: {}", pattern);
        }
        files.extend(matches);
    }
    // Sort for deterministic output
    files.sort();
    files.dedup();
    Ok(files)
}

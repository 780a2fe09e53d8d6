//! Page emitter: runs the pipeline end to end and writes the site.

use crate::config::Config;
use crate::html::htmlsafe;
use crate::link::{register_doclets, LinkRegistry};
use crate::members::{attach_module_symbols, get_members};
use crate::model::{Doclet, Kind};
use crate::nav::{nav_addons, nav_title, NavBuilder};
use crate::normalize::{normalize, SourceFile};
use crate::query::{DocletFilter, DocletStore};
use crate::render::{create_template, Page, Template, View};
use crate::search::SearchIndex;
use crate::signature::synthesize;
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const STATIC_SCAN_DEPTH: usize = 10;

/// Run options resolved from the command line and `opts`.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub destination: PathBuf,
    /// README content for the main page.
    pub readme: Option<String>,
    pub private: bool,
    pub mainpagetitle: Option<String>,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            destination: PathBuf::from("out"),
            readme: None,
            private: false,
            mainpagetitle: None,
        }
    }
}

#[derive(Debug)]
pub struct PublishSummary {
    /// Directory the site was written to.
    pub outdir: PathBuf,
    /// Number of pages written, overwrites included.
    pub pages: usize,
}

/// Generate the documentation site for `doclets`.
pub fn publish(doclets: Vec<Doclet>, config: &Config, options: &PublishOptions) -> Result<PublishSummary> {
    let template = create_template(config.templates.default.layout_file.as_deref())?;

    let mut store = DocletStore::new(doclets);
    let sources = normalize(&mut store, options.private);

    let outdir = package_outdir(&store, &options.destination);
    fs::create_dir_all(&outdir)
        .with_context(|| format!("failed to create output directory {}", outdir.display()))?;

    let copied = copy_static_files(config, &outdir)?;
    if copied > 0 {
        tracing::info!("copied {} static files", copied);
    }

    let mut links = LinkRegistry::new();
    register_doclets(&mut links, &mut store, &sources);
    synthesize(&mut store, &links);

    let favicon = match config.template_options.favicon.as_deref() {
        Some(path) => Some(copy_asset(path, &outdir)?),
        None => None,
    };
    let icon = match config.template_options.icon.as_deref() {
        Some(path) => Some(copy_asset(path, &outdir)?),
        None => None,
    };

    let mut search = SearchIndex::new(config.search_enabled());
    let nav = {
        let members = get_members(&store);
        NavBuilder::new(&store, &links, &mut search).build(&members)
    };
    attach_module_symbols(&mut store);
    let search = if search.is_enabled() {
        Some(search.to_json()?)
    } else {
        None
    };

    let view = View {
        store: &store,
        links: &links,
        nav,
        nav_title: nav_title(&config.template_options, icon.as_deref()),
        nav_addons: config.menu().map(|menu| nav_addons(&menu)).unwrap_or_default(),
        footer: config.template_options.footer.clone(),
        favicon,
        search,
        output_source_files: config.output_source_files(),
    };
    let mut emitter = Emitter {
        template: template.as_ref(),
        view: &view,
        outdir: &outdir,
        pages: 0,
    };

    if view.output_source_files {
        for source in sources.iter() {
            emitter.source_page(source)?;
        }
    }

    let members = get_members(&store);
    if !members.globals.is_empty() {
        let global = Doclet::synthetic(Kind::Globalobj, "");
        emitter.generate("Global", &[&global], links.global_url(), true)?;
    }

    let mut main = Doclet::synthetic(
        Kind::Mainpage,
        options.mainpagetitle.as_deref().unwrap_or("Main Page"),
    );
    main.readme = options.readme.clone();
    let mut home = store.find(&DocletFilter::new().kind(Kind::Package));
    home.push(&main);
    home.extend(store.find(&DocletFilter::new().kind(Kind::File)));
    emitter.generate("Home", &home, links.index_url(), true)?;

    let groups = [
        ("Module", by_longname(&members.modules)),
        ("Class", by_longname(&members.classes)),
        ("Namespace", by_longname(&members.namespaces)),
        ("Mixin", by_longname(&members.mixins)),
        ("External", by_longname(&members.externals)),
        ("Interface", by_longname(&members.interfaces)),
    ];
    for longname in links.longnames() {
        let Some(url) = links.url(longname) else {
            continue;
        };
        for (label, group) in &groups {
            if let Some(mine) = group.get(longname) {
                let title = format!("{}: {}", label, mine[0].name);
                emitter.generate(&title, mine, url, true)?;
            }
        }
    }

    let pages = emitter.pages;
    tracing::info!("wrote {} pages to {}", pages, outdir.display());
    Ok(PublishSummary { outdir, pages })
}

/// Group doclets sharing a longname, keeping store order within each group.
fn by_longname<'d>(doclets: &[&'d Doclet]) -> HashMap<&'d str, Vec<&'d Doclet>> {
    let mut groups: HashMap<&str, Vec<&Doclet>> = HashMap::new();
    for &doclet in doclets {
        groups.entry(doclet.longname.as_str()).or_default().push(doclet);
    }
    groups
}

/// `<destination>/<package>/<version>` when a named package is documented.
fn package_outdir(store: &DocletStore, destination: &Path) -> PathBuf {
    let packages = store.find(&DocletFilter::new().kind(Kind::Package));
    match packages.first() {
        Some(package) if !package.name.is_empty() => destination
            .join(&package.name)
            .join(package.version.as_deref().unwrap_or_default()),
        _ => destination.to_path_buf(),
    }
}

struct Emitter<'a> {
    template: &'a dyn Template,
    view: &'a View<'a>,
    outdir: &'a Path,
    pages: usize,
}

impl<'a> Emitter<'a> {
    /// Render `doclets` into `filename`. Source listings skip link
    /// resolution so code is shown verbatim.
    fn generate(&mut self, title: &str, doclets: &[&Doclet], filename: &str, resolve: bool) -> Result<()> {
        let page = Page {
            title,
            doclets,
            env: self.view,
        };
        let mut html = self.template.render("container", &page)?;
        if resolve {
            html = self.view.links.resolve_links(&html);
        }
        let path = self.outdir.join(filename);
        fs::write(&path, html).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!("wrote {}", path.display());
        self.pages += 1;
        Ok(())
    }

    /// A source listing. Unreadable sources are logged and skipped.
    fn source_page(&mut self, source: &SourceFile) -> Result<()> {
        let view = self.view;
        let Some(url) = view.links.source_url(&source.shortened) else {
            return Ok(());
        };
        let code = match fs::read_to_string(&source.resolved) {
            Ok(text) => htmlsafe(&text),
            Err(e) => {
                tracing::error!("error while generating source file {}: {}", source.resolved, e);
                return Ok(());
            }
        };
        let mut doc = Doclet::synthetic(Kind::Source, source.shortened.as_str());
        doc.code = Some(code);
        self.generate(&format!("Source: {}", source.shortened), &[&doc], url, false)
    }
}

/// `includePattern`/`excludePattern` applied to candidate static files.
struct StaticFilter {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl StaticFilter {
    fn from_config(config: &Config) -> Result<Self> {
        let files = config.templates.default.static_files.as_ref();
        let compile = |pattern: Option<&String>| -> Result<Option<Regex>> {
            pattern
                .map(|p| Regex::new(p).with_context(|| format!("invalid static file pattern: {}", p)))
                .transpose()
        };
        Ok(Self {
            include: compile(files.and_then(|f| f.include_pattern.as_ref()))?,
            exclude: compile(files.and_then(|f| f.exclude_pattern.as_ref()))?,
        })
    }

    fn accepts(&self, path: &Path) -> bool {
        let text = path.to_string_lossy().replace('\\', "/");
        self.include.as_ref().map_or(true, |re| re.is_match(&text))
            && !self.exclude.as_ref().is_some_and(|re| re.is_match(&text))
    }
}

/// Copy the configured static files, preserving their paths relative to
/// each include root. Returns the number of files copied.
fn copy_static_files(config: &Config, outdir: &Path) -> Result<usize> {
    let roots = config.static_file_paths();
    if roots.is_empty() {
        return Ok(0);
    }
    let filter = StaticFilter::from_config(config)?;

    let mut copied = 0;
    for root in roots {
        for entry in WalkDir::new(&root)
            .max_depth(STATIC_SCAN_DEPTH)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !filter.accepts(path) {
                continue;
            }
            let relative = match path.strip_prefix(&root) {
                Ok(rel) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
                _ => PathBuf::from(path.file_name().unwrap_or_default()),
            };
            let target = outdir.join(relative);
            copy_file(path, &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Copy an icon or favicon under the same relative path in the output
/// directory and return the href pages should use for it. Absolute paths
/// and `..` components are dropped so the copy stays inside `outdir`.
fn copy_asset(path: &Path, outdir: &Path) -> Result<String> {
    let relative: PathBuf = path
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    copy_file(path, &outdir.join(&relative))?;
    Ok(relative.to_string_lossy().replace('\\', "/"))
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::copy(from, to)
        .with_context(|| format!("failed to copy {} to {}", from.display(), to.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{parse_doclets, Scope};
    use tempfile::TempDir;

    fn options(dir: &TempDir) -> PublishOptions {
        PublishOptions {
            destination: dir.path().join("out"),
            ..Default::default()
        }
    }

    fn html_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".html"))
            .collect();
        names.sort();
        names
    }

    fn widget() -> Vec<Doclet> {
        parse_doclets(
            r#"[
                {"longname": "module:widget", "name": "widget", "kind": "module"},
                {"longname": "module:widget.render", "name": "render", "kind": "function",
                 "memberof": "module:widget", "scope": "static"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn module_with_function_end_to_end() {
        let dir = TempDir::new().unwrap();
        let summary = publish(widget(), &Config::default(), &options(&dir)).unwrap();

        assert_eq!(html_files(&summary.outdir), ["index.html", "module-widget.html"]);
        let page = fs::read_to_string(summary.outdir.join("module-widget.html")).unwrap();
        assert!(page.contains("<title>Module: widget</title>"));
        assert!(page.contains("id=\".render\""));
        assert!(page.contains("<a href=\"module-widget.html#.render\">render</a>"));

        let list_start = page.find("id=\"search-data\">").unwrap();
        let json_start = list_start + "id=\"search-data\">".len();
        let json_end = json_start + page[json_start..].find("</script>").unwrap();
        let search: serde_json::Value = serde_json::from_str(&page[json_start..json_end]).unwrap();
        assert_eq!(search["list"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn globals_page_only_with_globals() {
        let dir = TempDir::new().unwrap();
        let mut doclets = widget();
        doclets.push(Doclet {
            longname: "start".to_string(),
            name: "start".to_string(),
            kind: Kind::Function,
            scope: Some(Scope::Global),
            ..Default::default()
        });
        let summary = publish(doclets, &Config::default(), &options(&dir)).unwrap();
        let global = fs::read_to_string(summary.outdir.join("global.html")).unwrap();
        assert!(global.contains("<title>Global</title>"));
        assert!(global.contains(">start"));
    }

    #[test]
    fn source_pages_and_unreadable_sources() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.js"), "if (a < b) {}").unwrap();

        let json = serde_json::json!([
            {"longname": "A", "name": "A", "kind": "class",
             "meta": {"filename": "a.js", "path": src.to_string_lossy(), "lineno": 3}},
            {"longname": "B", "name": "B", "kind": "class",
             "meta": {"filename": "missing.js", "path": src.to_string_lossy(), "lineno": 1}}
        ]);
        let doclets = parse_doclets(&json.to_string()).unwrap();
        let summary = publish(doclets, &Config::default(), &options(&dir)).unwrap();

        let source = fs::read_to_string(summary.outdir.join("a.js.html")).unwrap();
        assert!(source.contains("<title>Source: a.js</title>"));
        assert!(source.contains("if (a &lt; b) {}"));
        assert!(!summary.outdir.join("missing.js.html").exists());

        let class_page = fs::read_to_string(summary.outdir.join("A.html")).unwrap();
        assert!(class_page.contains("<a href=\"a.js.html#line3\">line 3</a>"));
    }

    #[test]
    fn file_doclet_named_after_its_source() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("lib")).unwrap();
        fs::create_dir_all(src.join("app")).unwrap();
        fs::write(src.join("lib/util.js"), "const UTIL_TEXT = 1;").unwrap();
        fs::write(src.join("app/main.js"), "main();").unwrap();

        let json = serde_json::json!([
            {"longname": "lib/util.js", "name": "lib/util.js", "kind": "file",
             "description": "Helpers.",
             "meta": {"filename": "util.js", "path": src.join("lib").to_string_lossy(), "lineno": 1}},
            {"longname": "App", "name": "App", "kind": "class",
             "meta": {"filename": "main.js", "path": src.join("app").to_string_lossy(), "lineno": 4}}
        ]);
        let doclets = parse_doclets(&json.to_string()).unwrap();
        let summary = publish(doclets, &Config::default(), &options(&dir)).unwrap();

        assert_eq!(
            html_files(&summary.outdir),
            ["App.html", "app_main.js.html", "index.html", "lib_util.js.html"]
        );
        let listing = fs::read_to_string(summary.outdir.join("lib_util.js.html")).unwrap();
        assert!(listing.contains("const UTIL_TEXT = 1;"));
        let home = fs::read_to_string(summary.outdir.join("index.html")).unwrap();
        assert!(home.contains("<a href=\"lib_util.js.html#line1\">line 1</a>"));
    }

    #[test]
    fn source_listing_next_to_same_named_namespace() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("util.js"), "const UTIL_TEXT = 1;").unwrap();

        let json = serde_json::json!([
            {"longname": "util.js", "name": "util.js", "kind": "namespace",
             "meta": {"filename": "util.js", "path": src.to_string_lossy(), "lineno": 2}}
        ]);
        let doclets = parse_doclets(&json.to_string()).unwrap();
        let summary = publish(doclets, &Config::default(), &options(&dir)).unwrap();

        let listing = fs::read_to_string(summary.outdir.join("util.js-1.html")).unwrap();
        assert!(listing.contains("const UTIL_TEXT = 1;"));
        let page = fs::read_to_string(summary.outdir.join("util.js.html")).unwrap();
        assert!(page.contains("<title>Namespace: util.js</title>"));
        assert!(page.contains("<a href=\"util.js-1.html#line2\">line 2</a>"));
    }

    #[test]
    fn unwritable_destination_aborts() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let opts = PublishOptions {
            destination: blocker.join("out"),
            ..Default::default()
        };
        let err = publish(widget(), &Config::default(), &opts).unwrap_err();
        let message = format!("{:#}", err);
        assert!(
            message.contains("failed to create output directory") || message.contains("failed to write"),
            "unexpected error: {}",
            message
        );
        assert!(message.contains("blocker"));
    }

    #[test]
    fn source_output_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        let json = serde_json::json!([
            {"longname": "A", "name": "A", "kind": "class",
             "meta": {"filename": "a.js", "path": "/nowhere", "lineno": 3}}
        ]);
        let config: Config =
            serde_json::from_str(r#"{"templates": {"default": {"outputSourceFiles": false}}}"#).unwrap();
        let doclets = parse_doclets(&json.to_string()).unwrap();
        let summary = publish(doclets, &config, &options(&dir)).unwrap();
        assert_eq!(html_files(&summary.outdir), ["A.html", "index.html"]);
        let class_page = fs::read_to_string(summary.outdir.join("A.html")).unwrap();
        assert!(!class_page.contains("line3"));
    }

    #[test]
    fn package_nests_outdir_and_feeds_home() {
        let dir = TempDir::new().unwrap();
        let doclets = parse_doclets(
            r#"[{"longname": "package:kit", "name": "kit", "kind": "package", "version": "1.2.0"}]"#,
        )
        .unwrap();
        let opts = PublishOptions {
            readme: Some("<p>Read me {@link https://example.com|here}</p>".to_string()),
            mainpagetitle: Some("Kit".to_string()),
            ..options(&dir)
        };
        let summary = publish(doclets, &Config::default(), &opts).unwrap();
        assert_eq!(summary.outdir, dir.path().join("out").join("kit").join("1.2.0"));
        let home = fs::read_to_string(summary.outdir.join("index.html")).unwrap();
        assert!(home.contains("<h3 class=\"package\">kit 1.2.0</h3>"));
        assert!(home.contains("<a href=\"https://example.com\">here</a>"));
    }

    #[test]
    fn later_kind_group_overwrites_page() {
        let dir = TempDir::new().unwrap();
        let doclets = parse_doclets(
            r#"[
                {"longname": "Shape", "name": "Shape", "kind": "class"},
                {"longname": "Shape", "name": "Shape", "kind": "interface"}
            ]"#,
        )
        .unwrap();
        let summary = publish(doclets, &Config::default(), &options(&dir)).unwrap();
        let page = fs::read_to_string(summary.outdir.join("Shape.html")).unwrap();
        assert!(page.contains("<title>Interface: Shape</title>"));
        assert_eq!(summary.pages, 3);
    }

    #[test]
    fn static_files_icon_and_layout() {
        let dir = TempDir::new().unwrap();
        let assets = dir.path().join("assets");
        fs::create_dir_all(assets.join("css")).unwrap();
        fs::write(assets.join("css/site.css"), "body {}").unwrap();
        fs::write(assets.join("notes.txt"), "skip").unwrap();
        fs::write(dir.path().join("logo.png"), "png").unwrap();
        fs::write(dir.path().join("layout.html"), "<main>${title}|${navTitle}</main>").unwrap();

        let config: Config = serde_json::from_value(serde_json::json!({
            "templates": {"default": {
                "layoutFile": dir.path().join("layout.html"),
                "staticFiles": {"include": [assets], "excludePattern": "\\.txt$"}
            }},
            "templateOptions": {"icon": dir.path().join("logo.png"), "title": "Kit"}
        }))
        .unwrap();
        let summary = publish(widget(), &config, &options(&dir)).unwrap();

        assert!(summary.outdir.join("css/site.css").exists());
        assert!(!summary.outdir.join("notes.txt").exists());
        let icon = dir
            .path()
            .join("logo.png")
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect::<PathBuf>();
        assert!(summary.outdir.join(&icon).exists());

        let home = fs::read_to_string(summary.outdir.join("index.html")).unwrap();
        assert!(home.starts_with("<main>Home|<div class=\"card horizontal\">"));
        assert!(home.contains("<a href=\"index.html\">Kit</a>"));
    }

    #[test]
    fn private_doclets_need_opt_in() {
        let json = r#"[{"longname": "Hidden", "name": "Hidden", "kind": "class", "access": "private"}]"#;

        let dir = TempDir::new().unwrap();
        let summary = publish(parse_doclets(json).unwrap(), &Config::default(), &options(&dir)).unwrap();
        assert!(!summary.outdir.join("Hidden.html").exists());

        let dir = TempDir::new().unwrap();
        let opts = PublishOptions {
            private: true,
            ..options(&dir)
        };
        let summary = publish(parse_doclets(json).unwrap(), &Config::default(), &opts).unwrap();
        assert!(summary.outdir.join("Hidden.html").exists());
    }
}

//! Generator configuration, read from a JSON file in the layout of a
//! `jsdoc` `conf.json`. Every field is optional.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub opts: Opts,
    pub templates: Templates,
    pub template_options: TemplateOptions,
}

/// Run options; command-line flags take precedence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Opts {
    pub destination: Option<PathBuf>,
    pub readme: Option<PathBuf>,
    pub mainpagetitle: Option<String>,
    pub private: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Templates {
    pub default: DefaultTemplate,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DefaultTemplate {
    pub layout_file: Option<PathBuf>,
    pub static_files: Option<StaticFiles>,
    pub output_source_files: Option<bool>,
}

/// Extra files copied verbatim into the output directory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StaticFiles {
    pub include: Option<Vec<PathBuf>>,
    /// Older spelling of `include`.
    pub paths: Option<Vec<PathBuf>>,
    pub include_pattern: Option<String>,
    pub exclude_pattern: Option<String>,
}

/// Branding and feature switches of the generated site.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemplateOptions {
    pub search: Option<bool>,
    pub title: Option<String>,
    pub sub_title: Option<String>,
    pub icon: Option<PathBuf>,
    /// Kept untyped so a malformed value can be reported instead of
    /// failing the whole configuration.
    pub menu: Option<serde_json::Value>,
    pub favicon: Option<PathBuf>,
    pub footer: Option<String>,
}

/// External link shown at the bottom of the nav.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MenuEntry {
    pub label: String,
    pub link: String,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn search_enabled(&self) -> bool {
        self.template_options.search.unwrap_or(true)
    }

    pub fn output_source_files(&self) -> bool {
        self.templates.default.output_source_files.unwrap_or(true)
    }

    /// Static file roots; `include` wins over the legacy `paths`.
    pub fn static_file_paths(&self) -> Vec<PathBuf> {
        let Some(files) = self.templates.default.static_files.as_ref() else {
            return Vec::new();
        };
        files
            .include
            .clone()
            .or_else(|| files.paths.clone())
            .unwrap_or_default()
    }

    /// Menu entries, or `None` when no usable menu is configured. A menu
    /// that is not an array is reported and ignored; so are malformed
    /// entries.
    pub fn menu(&self) -> Option<Vec<MenuEntry>> {
        let menu = self.template_options.menu.as_ref()?;
        let Some(items) = menu.as_array() else {
            tracing::warn!("menu option must be an array");
            return None;
        };
        let entries = items
            .iter()
            .filter_map(|item| match serde_json::from_value::<MenuEntry>(item.clone()) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("skipping menu entry {}: {}", item, e);
                    None
                }
            })
            .collect();
        Some(entries)
    }
}

//! Page rendering: trait-based template dispatch.

pub mod html;
pub mod layout;

use crate::link::LinkRegistry;
use crate::model::Doclet;
use crate::query::DocletStore;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Site-wide values every page sees: the finished nav, branding and the
/// read-only lookup tables.
pub struct View<'a> {
    pub store: &'a DocletStore,
    pub links: &'a LinkRegistry,
    pub nav: String,
    pub nav_title: String,
    pub nav_addons: String,
    pub footer: Option<String>,
    pub favicon: Option<String>,
    /// Serialized search index, `None` when search is disabled.
    pub search: Option<String>,
    pub output_source_files: bool,
}

/// One output page.
pub struct Page<'a> {
    pub title: &'a str,
    pub doclets: &'a [&'a Doclet],
    pub env: &'a View<'a>,
}

/// Turns a page into a complete HTML document.
pub trait Template {
    fn render(&self, name: &str, page: &Page) -> Result<String>;
}

/// The built-in template, wrapped in the user's layout file when one is
/// configured.
pub fn create_template(layout_file: Option<&Path>) -> Result<Box<dyn Template>> {
    let layout = match layout_file {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read layout file {}", path.display()))?;
            tracing::debug!("using layout {}", path.display());
            layout::Layout::from_text(text)
        }
        None => layout::Layout::builtin(),
    };
    Ok(Box::new(html::HtmlTemplate::new(layout)))
}

//! Page layout: the outer HTML document around rendered content.
//!
//! A layout is plain HTML with `${name}` placeholders. Unknown placeholders
//! are left untouched so a layout can carry its own `${...}` text.

use crate::html::htmlsafe;
use crate::render::View;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static RE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z]+)\}").unwrap());

const BUILTIN: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>${title}</title>
${favicon}
</head>
<body>
<nav class="sidenav">
${navTitle}
${search}
${nav}
<ul class="collapsible">${navAddons}</ul>
</nav>
<main>
<h1 class="page-title">${title}</h1>
${content}
</main>
<footer>${footer}</footer>
</body>
</html>
"#;

#[derive(Debug, Clone)]
pub struct Layout {
    text: String,
}

impl Layout {
    pub fn builtin() -> Self {
        Self {
            text: BUILTIN.to_string(),
        }
    }

    pub fn from_text(text: String) -> Self {
        Self { text }
    }

    /// Fill the placeholders for one page.
    pub fn wrap(&self, title: &str, content: &str, view: &View) -> String {
        RE_PLACEHOLDER
            .replace_all(&self.text, |caps: &Captures| match &caps[1] {
                "title" => htmlsafe(title),
                "navTitle" => view.nav_title.clone(),
                "nav" => view.nav.clone(),
                "navAddons" => view.nav_addons.clone(),
                "content" => content.to_string(),
                "footer" => view.footer.clone().unwrap_or_default(),
                "favicon" => view
                    .favicon
                    .as_deref()
                    .map(|href| format!("<link rel=\"icon\" href=\"{}\">", htmlsafe(href)))
                    .unwrap_or_default(),
                "search" => view.search.as_deref().map(search_block).unwrap_or_default(),
                _ => caps[0].to_string(),
            })
            .into_owned()
    }
}

/// Search box plus the index as inline JSON. `</` is escaped so the data
/// cannot close its own script element.
fn search_block(json: &str) -> String {
    format!(
        "<div class=\"search-wrapper\">\
         <input id=\"search\" type=\"search\" placeholder=\"Search\" autocomplete=\"off\">\
         <div id=\"search-results\"></div></div>\n\
         <script type=\"application/json\" id=\"search-data\">{}</script>",
        json.replace("</", "<\\/")
    )
}

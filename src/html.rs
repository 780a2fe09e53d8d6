//! Small HTML builders shared by the navigation, signature and page code.

use regex::Regex;
use std::sync::LazyLock;

// `Name <user@host>` with optional trailing text
static RE_AUTHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s?([\s\S]+)\b\s+<(\S+@\S+)>(\s+[\s\S]*)?$").unwrap());

/// Escape text for embedding in element content or attribute values.
pub fn htmlsafe(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// `<a href="url" class="css">text</a>`; `text` is inserted as-is.
pub fn anchor(url: &str, text: &str, css_class: Option<&str>) -> String {
    match css_class {
        Some(class) => format!(
            "<a href=\"{}\" class=\"{}\">{}</a>",
            htmlsafe(url),
            htmlsafe(class),
            text
        ),
        None => format!("<a href=\"{}\">{}</a>", htmlsafe(url), text),
    }
}

/// An `@author` value. `Name <email>` becomes a mailto link on the name;
/// anything else is escaped text.
pub fn author_link(author: &str) -> String {
    match RE_AUTHOR.captures(author) {
        Some(caps) => {
            let mut out = format!(
                "<a href=\"mailto:{}\">{}</a>",
                htmlsafe(&caps[2]),
                htmlsafe(&caps[1])
            );
            if let Some(rest) = caps.get(3) {
                out.push_str(&htmlsafe(rest.as_str()));
            }
            out
        }
        None => htmlsafe(author),
    }
}

/// Non-expandable sidebar entry.
pub fn nav_leaf(link: &str) -> String {
    format!("<li><div class=\"collapsible-header\">{}</div></li>", link)
}

/// Expandable sidebar entry: a header with an expand icon over a nested list.
/// `list_class` is the class of the inner `<ul>`, if any.
pub fn nav_expandable(header: &str, list_class: Option<&str>, items: &str) -> String {
    let ul = match list_class {
        Some(class) => format!("<ul class=\"{}\">", class),
        None => "<ul>".to_string(),
    };
    format!(
        "<li><div class=\"collapsible-header waves-effect waves-teal\">\
         <i class=\"material-icons\">expand_more</i>{}</div>\
         <div class=\"collapsible-body\"><div class=\"force-indent\">{}{}</ul></div></div></li>",
        header, ul, items
    )
}

/// Section heading that is a plain link rather than an expandable list.
pub fn nav_heading_link(link: &str) -> String {
    format!(
        "<li><div class=\"collapsible-header waves-effect waves-teal\">{}</div></li>",
        link
    )
}

/// Signature attribute tags, e.g. `<span class="signature-attributes">opt</span>`.
pub fn signature_attributes(tags: &[&str]) -> String {
    format!(
        "<span class=\"signature-attributes\">{}</span>",
        tags.join(", ")
    )
}

/// `<span class="type-signature">...</span>`
pub fn type_signature(inner: &str) -> String {
    format!("<span class=\"type-signature\">{}</span>", inner)
}

//! Built-in HTML template: one container page per call, wrapped in the
//! layout.

use crate::html::{author_link, htmlsafe};
use crate::model::{Doclet, Example, Kind, Param};
use crate::query::DocletFilter;
use crate::render::layout::Layout;
use crate::render::{Page, Template, View};
use anyhow::{bail, Result};

pub struct HtmlTemplate {
    layout: Layout,
}

impl HtmlTemplate {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }
}

impl Template for HtmlTemplate {
    fn render(&self, name: &str, page: &Page) -> Result<String> {
        let content = match name {
            "container" => container(page),
            _ => bail!("unknown template: {}", name),
        };
        Ok(self.layout.wrap(page.title, &content, page.env))
    }
}

fn container(page: &Page) -> String {
    let view = page.env;
    let mut out = String::new();
    for doc in page.doclets {
        match doc.kind {
            Kind::Source => source_page(&mut out, doc),
            Kind::Mainpage => main_page(&mut out, doc),
            Kind::Package => package_page(&mut out, doc),
            Kind::File => file_page(&mut out, doc, view),
            Kind::Globalobj => {
                out.push_str("<section>\n<article>\n");
                sections(&mut out, None, view);
                out.push_str("</article>\n</section>\n");
            }
            _ => symbol_page(&mut out, doc, view),
        }
    }
    out
}

fn source_page(out: &mut String, doc: &Doclet) {
    out.push_str("<section>\n<article>\n<pre class=\"prettyprint source linenums\"><code>");
    out.push_str(doc.code.as_deref().unwrap_or_default());
    out.push_str("</code></pre>\n</article>\n</section>\n");
}

fn main_page(out: &mut String, doc: &Doclet) {
    if let Some(readme) = doc.readme.as_deref() {
        out.push_str(&format!("<section class=\"readme\">\n<article>{}</article>\n</section>\n", readme));
    }
}

fn package_page(out: &mut String, doc: &Doclet) {
    if doc.name.is_empty() {
        return;
    }
    out.push_str(&format!(
        "<h3 class=\"package\">{} {}</h3>\n",
        htmlsafe(&doc.name),
        htmlsafe(doc.version.as_deref().unwrap_or_default())
    ));
    if let Some(desc) = doc.description.as_deref() {
        out.push_str(&format!("<div class=\"description\">{}</div>\n", desc));
    }
}

fn file_page(out: &mut String, doc: &Doclet, view: &View) {
    out.push_str("<section>\n<header>\n");
    out.push_str(&format!("<h2>{}</h2>\n", htmlsafe(&doc.name)));
    out.push_str("</header>\n<article>\n");
    if let Some(desc) = doc.description.as_deref() {
        out.push_str(&format!("<div class=\"description\">{}</div>\n", desc));
    }
    details(out, doc, view);
    out.push_str("</article>\n</section>\n");
}

/// Page for a module, class, namespace, mixin, external or interface.
fn symbol_page(out: &mut String, doc: &Doclet, view: &View) {
    out.push_str("<section>\n<header>\n");
    out.push_str(&format!(
        "<h2>{}{}</h2>\n",
        doc.ancestors,
        htmlsafe(&doc.name)
    ));
    if let Some(classdesc) = doc.classdesc.as_deref() {
        out.push_str(&format!("<div class=\"class-description\">{}</div>\n", classdesc));
    }
    out.push_str("</header>\n<article>\n<div class=\"container-overview\">\n");

    if doc.kind == Kind::Class || !doc.signature.is_empty() {
        method(out, doc, view);
    } else {
        if let Some(desc) = doc.description.as_deref() {
            out.push_str(&format!("<div class=\"description\">{}</div>\n", desc));
        }
        details(out, doc, view);
        examples(out, &doc.examples);
    }
    for export in &doc.module_exports {
        if export.kind == Kind::Class || export.kind == Kind::Function {
            method(out, export, view);
        } else {
            member(out, export, view);
        }
    }
    out.push_str("</div>\n");

    if !doc.augments.is_empty() {
        out.push_str("<h3 class=\"subsection-title\">Extends</h3>\n<ul>\n");
        for parent in &doc.augments {
            out.push_str(&format!("<li>{}</li>\n", view.links.linkto(parent, None, None)));
        }
        out.push_str("</ul>\n");
    }

    sections(out, Some(&doc.longname), view);
    out.push_str("</article>\n</section>\n");
}

/// Child listings of a container, or of the global scope when `parent` is
/// `None`.
fn sections(out: &mut String, parent: Option<&str>, view: &View) {
    let children = |kind: Kind| {
        let filter = DocletFilter::new().kind(kind);
        let filter = match parent {
            Some(p) => filter.memberof(p),
            None => filter.no_memberof(),
        };
        view.store.find(&filter)
    };

    for (kind, heading) in [
        (Kind::Class, "Classes"),
        (Kind::Interface, "Interfaces"),
        (Kind::Mixin, "Mixins"),
        (Kind::Namespace, "Namespaces"),
    ] {
        let found = children(kind);
        if found.is_empty() {
            continue;
        }
        out.push_str(&format!("<h3 class=\"subsection-title\">{}</h3>\n<dl>\n", heading));
        for doc in found {
            out.push_str(&format!(
                "<dt>{}</dt>\n<dd>{}</dd>\n",
                view.links.linkto(&doc.longname, Some(&htmlsafe(&doc.name)), None),
                doc.summary.as_deref().or(doc.description.as_deref()).unwrap_or_default()
            ));
        }
        out.push_str("</dl>\n");
    }

    let members = children(Kind::Member);
    if !members.is_empty() {
        out.push_str("<h3 class=\"subsection-title\">Members</h3>\n");
        for doc in members {
            member(out, doc, view);
        }
    }

    let methods = children(Kind::Function);
    if !methods.is_empty() {
        out.push_str("<h3 class=\"subsection-title\">Methods</h3>\n");
        for doc in methods {
            method(out, doc, view);
        }
    }

    let typedefs = children(Kind::Typedef);
    if !typedefs.is_empty() {
        out.push_str("<h3 class=\"subsection-title\">Type Definitions</h3>\n");
        for doc in typedefs {
            if doc.signature.is_empty() {
                member(out, doc, view);
            } else {
                method(out, doc, view);
            }
        }
    }

    let events = children(Kind::Event);
    if !events.is_empty() {
        out.push_str("<h3 class=\"subsection-title\">Events</h3>\n");
        for doc in events {
            method(out, doc, view);
        }
    }
}

fn heading(out: &mut String, doc: &Doclet, prefix: &str) {
    out.push_str(&format!(
        "<h4 class=\"name\" id=\"{}\">{}{}{}{}</h4>\n",
        htmlsafe(&doc.id),
        doc.attribs,
        prefix,
        htmlsafe(&doc.name),
        doc.signature
    ));
}

fn member(out: &mut String, doc: &Doclet, view: &View) {
    heading(out, doc, "");
    if let Some(desc) = doc.description.as_deref() {
        out.push_str(&format!("<div class=\"description\">{}</div>\n", desc));
    }
    if !doc.properties.is_empty() {
        out.push_str("<h5 class=\"subsection-title\">Properties:</h5>\n");
        params_table(out, &doc.properties, view);
    }
    details(out, doc, view);
    examples(out, &doc.examples);
}

fn method(out: &mut String, doc: &Doclet, view: &View) {
    let prefix = if doc.kind == Kind::Class { "new " } else { "" };
    heading(out, doc, prefix);
    if doc.kind != Kind::Class {
        if let Some(desc) = doc.description.as_deref() {
            out.push_str(&format!("<div class=\"description\">{}</div>\n", desc));
        }
    }
    if !doc.params.is_empty() {
        out.push_str("<h5>Parameters:</h5>\n");
        params_table(out, &doc.params, view);
    }
    if !doc.properties.is_empty() {
        out.push_str("<h5 class=\"subsection-title\">Properties:</h5>\n");
        params_table(out, &doc.properties, view);
    }
    details(out, doc, view);

    link_list(out, "Fires:", &doc.fires, view);
    link_list(out, "Listens to Events:", &doc.listens, view);
    link_list(out, "Listeners of This Event:", &doc.listeners, view);

    typed_list(out, "Throws:", &doc.exceptions, view);
    let returns = if doc.yields.is_empty() { &doc.returns } else { &doc.yields };
    let label = if doc.yields.is_empty() { "Returns:" } else { "Yields:" };
    typed_list(out, label, returns, view);

    examples(out, &doc.examples);
}

fn type_union(param: &Param, view: &View) -> String {
    param
        .type_names()
        .iter()
        .map(|t| view.links.link_type(t))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn default_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn params_table(out: &mut String, params: &[Param], view: &View) {
    out.push_str(
        "<table class=\"params\">\n<thead><tr><th>Name</th><th>Type</th>\
         <th>Attributes</th><th>Default</th><th class=\"last\">Description</th></tr></thead>\n<tbody>\n",
    );
    for param in params {
        let mut attributes = Vec::new();
        if param.optional {
            attributes.push("&lt;optional&gt;");
        }
        match param.nullable {
            Some(true) => attributes.push("&lt;nullable&gt;"),
            Some(false) => attributes.push("&lt;non-null&gt;"),
            None => {}
        }
        if param.variadic {
            attributes.push("&lt;repeatable&gt;");
        }
        out.push_str(&format!(
            "<tr><td class=\"name\"><code>{}</code></td><td class=\"type\">{}</td>\
             <td class=\"attributes\">{}</td><td class=\"default\">{}</td>\
             <td class=\"description last\">{}</td></tr>\n",
            htmlsafe(param.name.as_deref().unwrap_or_default()),
            type_union(param, view),
            attributes.join("<br>"),
            param.defaultvalue.as_ref().map(|v| htmlsafe(&default_text(v))).unwrap_or_default(),
            param.description.as_deref().unwrap_or_default()
        ));
    }
    out.push_str("</tbody>\n</table>\n");
}

/// The `<dl class="details">` block; omitted when there is nothing to show.
fn details(out: &mut String, doc: &Doclet, view: &View) {
    let mut dl = String::new();
    let mut entry = |class: &str, label: &str, value: String| {
        dl.push_str(&format!(
            "<dt class=\"tag-{0}\">{1}</dt>\n<dd class=\"tag-{0}\">{2}</dd>\n",
            class, label, value
        ));
    };

    if let Some(version) = doc.version.as_deref() {
        entry("version", "Version:", htmlsafe(version));
    }
    if let Some(since) = doc.since.as_deref() {
        entry("since", "Since:", htmlsafe(since));
    }
    if let Some(notice) = doc.deprecation() {
        let text = if notice.is_empty() { "Yes" } else { notice };
        entry("deprecated", "Deprecated:", text.to_string());
    }
    if !doc.author.is_empty() {
        let authors: String = doc.author.iter().map(|a| format!("<li>{}</li>", author_link(a))).collect();
        entry("author", "Author:", format!("<ul>{}</ul>", authors));
    }
    if let Some(value) = doc.defaultvalue.as_ref() {
        entry("default", "Default Value:", format!("<code>{}</code>", htmlsafe(&default_text(value))));
    }
    if view.output_source_files {
        if let Some(meta) = doc.meta.as_ref() {
            if let Some(url) = meta.shortpath.as_deref().and_then(|p| view.links.source_url(p)) {
                let shortpath = meta.shortpath.as_deref().unwrap_or_default();
                let mut value = format!("<a href=\"{}\">{}</a>", htmlsafe(url), htmlsafe(shortpath));
                if let Some(line) = meta.lineno {
                    value.push_str(&format!(
                        ", <a href=\"{}#line{1}\">line {1}</a>",
                        htmlsafe(url),
                        line
                    ));
                }
                entry("source", "Source:", value);
            }
        }
    }
    if !doc.see.is_empty() {
        let items: String = doc
            .see
            .iter()
            .map(|s| format!("<li>{}</li>", view.links.resolve_links(&see_target(s, view))))
            .collect();
        entry("see", "See:", format!("<ul>{}</ul>", items));
    }

    if !dl.is_empty() {
        out.push_str("<dl class=\"details\">\n");
        out.push_str(&dl);
        out.push_str("</dl>\n");
    }
}

/// Known longnames in `see` become links; anything else is shown as given.
fn see_target(see: &str, view: &View) -> String {
    match view.links.url(see) {
        Some(_) => view.links.linkto(see, None, None),
        None => see.to_string(),
    }
}

fn link_list(out: &mut String, label: &str, longnames: &[String], view: &View) {
    if longnames.is_empty() {
        return;
    }
    out.push_str(&format!("<h5>{}</h5>\n<ul>\n", label));
    for longname in longnames {
        out.push_str(&format!("<li>{}</li>\n", view.links.linkto(longname, None, None)));
    }
    out.push_str("</ul>\n");
}

fn typed_list(out: &mut String, label: &str, entries: &[Param], view: &View) {
    if entries.is_empty() {
        return;
    }
    out.push_str(&format!("<h5>{}</h5>\n", label));
    for entry in entries {
        if let Some(desc) = entry.description.as_deref() {
            out.push_str(&format!("<div class=\"param-desc\">{}</div>\n", desc));
        }
        if !entry.type_names().is_empty() {
            out.push_str(&format!(
                "<dl class=\"param-type\"><dt>Type</dt><dd>{}</dd></dl>\n",
                type_union(entry, view)
            ));
        }
    }
}

fn examples(out: &mut String, examples: &[Example]) {
    if examples.is_empty() {
        return;
    }
    let label = if examples.len() > 1 { "Examples" } else { "Example" };
    out.push_str(&format!("<h5>{}</h5>\n", label));
    for example in examples {
        if !example.caption.is_empty() {
            out.push_str(&format!("<p class=\"code-caption\">{}</p>\n", example.caption));
        }
        out.push_str(&format!(
            "<pre class=\"prettyprint\"><code>{}</code></pre>\n",
            htmlsafe(&example.code)
        ));
    }
}

//! Navigation builder: the collapsible sidebar and, as a side effect, the
//! search index.
//!
//! Each kind bucket is turned into an arena: items are indexed by longname,
//! then wired parent → children through `memberof`. Attachments that would
//! close a cycle are refused, so every bucket is a forest and rendering
//! terminates.

use crate::config::{MenuEntry, TemplateOptions};
use crate::html::{htmlsafe, nav_expandable, nav_heading_link, nav_leaf};
use crate::link::{LinkRegistry, GLOBAL};
use crate::members::Members;
use crate::model::{Doclet, Kind};
use crate::query::{DocletFilter, DocletStore};
use crate::search::SearchIndex;
use std::collections::{HashMap, HashSet};

const SEARCH_ITEM_CLASS: &str = "collection-item";

/// Parent/child structure of one kind bucket.
struct NavTree<'a> {
    items: Vec<&'a Doclet>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl<'a> NavTree<'a> {
    fn build(items: &[&'a Doclet]) -> Self {
        let mut first: HashMap<&str, usize> = HashMap::new();
        for (i, item) in items.iter().enumerate() {
            first.entry(item.longname.as_str()).or_insert(i);
        }

        let mut parent: Vec<Option<usize>> = vec![None; items.len()];
        let mut children = vec![Vec::new(); items.len()];
        let mut roots = Vec::new();
        for (i, item) in items.iter().enumerate() {
            let found = item.memberof.as_deref().and_then(|m| first.get(m).copied());
            match found {
                Some(p) if !is_ancestor_or_self(&parent, p, i) => {
                    parent[i] = Some(p);
                    children[p].push(i);
                }
                Some(_) => {
                    tracing::warn!("{} is part of a memberof cycle, kept at top level", item.longname);
                    roots.push(i);
                }
                None => roots.push(i),
            }
        }

        NavTree {
            items: items.to_vec(),
            children,
            roots,
        }
    }
}

/// Whether `target` is `node` or one of its ancestors.
fn is_ancestor_or_self(parent: &[Option<usize>], node: usize, target: usize) -> bool {
    let mut current = Some(node);
    while let Some(n) = current {
        if n == target {
            return true;
        }
        current = parent[n];
    }
    false
}

fn plain_title(doclet: &Doclet) -> String {
    doclet.name.clone()
}

fn module_title(doclet: &Doclet) -> String {
    doclet
        .name
        .strip_prefix("module:")
        .unwrap_or(&doclet.name)
        .to_string()
}

fn external_title(doclet: &Doclet) -> String {
    let name = doclet.name.strip_prefix('"').unwrap_or(&doclet.name);
    name.strip_suffix('"').unwrap_or(name).to_string()
}

/// Renders the sidebar, recording search entries along the way.
pub struct NavBuilder<'a> {
    store: &'a DocletStore,
    links: &'a LinkRegistry,
    search: &'a mut SearchIndex,
}

impl<'a> NavBuilder<'a> {
    pub fn new(store: &'a DocletStore, links: &'a LinkRegistry, search: &'a mut SearchIndex) -> Self {
        Self {
            store,
            links,
            search,
        }
    }

    /// The full sidebar list. Modules are deduplicated on their own; every
    /// other bucket, and the globals, share one `seen` set.
    pub fn build(&mut self, members: &Members<'a>) -> String {
        let mut nav = String::from("<ul class=\"collapsible\">");

        let mut module_seen = HashSet::new();
        nav.push_str(&self.member_nav(&members.modules, "Modules", &mut module_seen, module_title));

        let mut seen = HashSet::new();
        nav.push_str(&self.member_nav(&members.externals, "Externals", &mut seen, external_title));
        nav.push_str(&self.member_nav(&members.namespaces, "Namespaces", &mut seen, plain_title));
        nav.push_str(&self.member_nav(&members.classes, "Classes", &mut seen, plain_title));
        nav.push_str(&self.member_nav(&members.interfaces, "Interfaces", &mut seen, plain_title));
        nav.push_str(&self.member_nav(&members.events, "Events", &mut seen, plain_title));
        nav.push_str(&self.member_nav(&members.mixins, "Mixins", &mut seen, plain_title));
        nav.push_str(&self.global_nav(&members.globals, &mut seen));

        nav.push_str("</ul>");
        nav
    }

    fn member_nav(
        &mut self,
        items: &[&'a Doclet],
        heading: &str,
        seen: &mut HashSet<String>,
        title: fn(&Doclet) -> String,
    ) -> String {
        if items.is_empty() {
            return String::new();
        }
        let tree = NavTree::build(items);
        let mut visiting = vec![false; tree.items.len()];
        let mut body = String::new();
        for &root in &tree.roots {
            body.push_str(&self.item_nav(&tree, root, seen, &mut visiting, title));
        }
        if body.is_empty() {
            return String::new();
        }
        nav_expandable(heading, Some("collapsible"), &body)
    }

    fn item_nav(
        &mut self,
        tree: &NavTree<'a>,
        idx: usize,
        seen: &mut HashSet<String>,
        visiting: &mut [bool],
        title: fn(&Doclet) -> String,
    ) -> String {
        let item = tree.items[idx];
        if visiting[idx] || seen.contains(&item.longname) {
            return String::new();
        }
        visiting[idx] = true;

        let store = self.store;
        let methods = store.find(
            &DocletFilter::new()
                .kind(Kind::Function)
                .memberof(item.longname.as_str()),
        );

        let display = htmlsafe(&title(item));
        let link = self.links.linkto(&item.longname, Some(&display), None);
        self.search.push(
            &item.longname,
            self.links.linkto(&item.longname, Some(&display), Some(SEARCH_ITEM_CLASS)),
        );

        let out = if methods.is_empty() && tree.children[idx].is_empty() {
            nav_leaf(&link)
        } else {
            let mut body = String::new();
            for method in &methods {
                let name = htmlsafe(&method.name);
                body.push_str(&nav_leaf(&self.links.linkto(&method.longname, Some(&name), None)));
                self.search.push(
                    &method.longname,
                    self.links.linkto(&method.longname, Some(&name), Some(SEARCH_ITEM_CLASS)),
                );
            }
            for &child in &tree.children[idx] {
                body.push_str(&self.item_nav(tree, child, seen, visiting, title));
            }
            nav_expandable(&link, Some("collapsible"), &body)
        };

        visiting[idx] = false;
        seen.insert(item.longname.clone());
        out
    }

    /// Top-level symbols. When nothing but typedefs (or already listed
    /// symbols) remain, the heading itself links to the global page.
    fn global_nav(&mut self, globals: &[&'a Doclet], seen: &mut HashSet<String>) -> String {
        if globals.is_empty() {
            return String::new();
        }

        let mut items = String::new();
        for global in globals {
            if global.kind != Kind::Typedef && !seen.contains(&global.longname) {
                let name = htmlsafe(&global.name);
                items.push_str(&format!(
                    "<li>{}</li>",
                    self.links.linkto(&global.longname, Some(&name), None)
                ));
                self.search.push(
                    &global.longname,
                    self.links.linkto(&global.longname, Some(&name), Some(SEARCH_ITEM_CLASS)),
                );
            }
            seen.insert(global.longname.clone());
        }

        if items.is_empty() {
            nav_heading_link(&self.links.linkto(GLOBAL, Some("Global"), None))
        } else {
            nav_expandable("Global", None, &items)
        }
    }
}

/// Site title card at the top of the sidebar.
pub fn nav_title(options: &TemplateOptions, icon_href: Option<&str>) -> String {
    let title = options.title.as_deref().unwrap_or("Home");
    let mut out = String::from("<div class=\"card horizontal\">");
    if let Some(icon) = icon_href {
        out.push_str(&format!(
            "<div class=\"card-image\"><img alt=\"Home\" src=\"{}\" /></div>",
            htmlsafe(icon)
        ));
    }
    out.push_str("<div class=\"card-stacked\"><div class=\"card-content\">");
    // title and subTitle are markup, like the footer
    out.push_str(&format!("<a href=\"index.html\">{}</a></div>", title));
    if let Some(sub_title) = options.sub_title.as_deref() {
        out.push_str(&format!("<div class=\"card-action\">{}</div>", sub_title));
    }
    out.push_str("</div></div>");
    out
}

/// External links listed under the sidebar.
pub fn nav_addons(menu: &[MenuEntry]) -> String {
    menu.iter()
        .map(|m| {
            nav_leaf(&format!(
                "<a href=\"{}\" target=\"_blank\" style=\"display: flex; align-items: center;\">\
                 <i class=\"small material-icons\">link</i>{}</a>",
                htmlsafe(&m.link),
                htmlsafe(&m.label)
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::register_doclets;
    use crate::members::get_members;
    use crate::model::Scope;
    use crate::normalize::SourceFiles;

    fn doclet(longname: &str, name: &str, kind: Kind, memberof: Option<&str>) -> Doclet {
        Doclet {
            longname: longname.to_string(),
            name: name.to_string(),
            kind,
            memberof: memberof.map(String::from),
            scope: memberof.map(|_| Scope::Static),
            ..Default::default()
        }
    }

    /// Build the nav for `doclets`, returning the HTML and the search index.
    fn build(doclets: Vec<Doclet>, search: bool) -> (String, SearchIndex) {
        let mut store = DocletStore::new(doclets);
        let mut links = LinkRegistry::new();
        register_doclets(&mut links, &mut store, &SourceFiles::default());
        let mut index = SearchIndex::new(search);
        let members = get_members(&store);
        let html = NavBuilder::new(&store, &links, &mut index).build(&members);
        (html, index)
    }

    fn titles(index: &SearchIndex) -> Vec<&str> {
        index.entries().iter().map(|e| e.title.as_str()).collect()
    }

    #[test]
    fn search_entries_in_traversal_order() {
        let (_, index) = build(
            vec![
                doclet("Foo", "Foo", Kind::Class, None),
                Doclet {
                    scope: Some(Scope::Instance),
                    ..doclet("Foo#bar", "bar", Kind::Function, Some("Foo"))
                },
            ],
            true,
        );
        assert_eq!(titles(&index), ["Foo", "Foo#bar"]);
        assert_eq!(
            index.entries()[1].link,
            "<a href=\"Foo.html#bar\" class=\"collection-item\">bar</a>"
        );
    }

    #[test]
    fn search_disabled_collects_nothing() {
        let (html, index) = build(vec![doclet("Foo", "Foo", Kind::Class, None)], false);
        assert!(html.contains("Foo.html"));
        assert!(index.entries().is_empty());
    }

    #[test]
    fn module_with_method_is_expandable() {
        let (html, index) = build(
            vec![
                doclet("module:widget", "widget", Kind::Module, None),
                doclet("module:widget.render", "render", Kind::Function, Some("module:widget")),
            ],
            true,
        );
        assert!(html.contains("expand_more</i>Modules</div>"));
        assert!(html.contains(
            "expand_more</i><a href=\"module-widget.html\">widget</a></div>"
        ));
        assert!(html.contains(
            "<li><div class=\"collapsible-header\"><a href=\"module-widget.html#.render\">render</a></div></li>"
        ));
        assert_eq!(titles(&index), ["module:widget", "module:widget.render"]);
    }

    #[test]
    fn childless_item_is_a_leaf() {
        let (html, _) = build(vec![doclet("Foo", "Foo", Kind::Class, None)], true);
        assert!(html.contains(
            "<li><div class=\"collapsible-header\"><a href=\"Foo.html\">Foo</a></div></li>"
        ));
    }

    #[test]
    fn children_nest_under_parent() {
        let (html, index) = build(
            vec![
                doclet("a", "a", Kind::Namespace, None),
                doclet("a.b", "b", Kind::Namespace, Some("a")),
            ],
            true,
        );
        let outer = html.find("<a href=\"a.html\">a</a>").unwrap();
        let inner = html.find("<a href=\"a.b.html\">b</a>").unwrap();
        assert!(outer < inner);
        assert_eq!(titles(&index), ["a", "a.b"]);
    }

    #[test]
    fn memberof_cycle_terminates() {
        let (html, index) = build(
            vec![
                doclet("A", "A", Kind::Class, Some("B")),
                doclet("B", "B", Kind::Class, Some("A")),
            ],
            true,
        );
        assert!(html.contains("A.html"));
        assert!(html.contains("B.html"));
        assert_eq!(index.entries().len(), 2);
    }

    #[test]
    fn self_membership_terminates() {
        let (html, _) = build(vec![doclet("A", "A", Kind::Class, Some("A"))], true);
        assert!(html.contains("A.html"));
    }

    #[test]
    fn seen_longnames_render_once_outside_modules() {
        let (_, index) = build(
            vec![
                doclet("Foo", "Foo", Kind::Namespace, None),
                doclet("Foo", "Foo", Kind::Class, None),
            ],
            true,
        );
        assert_eq!(titles(&index), ["Foo"]);
    }

    #[test]
    fn modules_do_not_share_seen_set() {
        let (_, index) = build(
            vec![
                doclet("module:a", "a", Kind::Module, None),
                doclet("module:a", "module:a", Kind::Class, None),
            ],
            true,
        );
        assert_eq!(titles(&index), ["module:a", "module:a"]);
    }

    #[test]
    fn external_titles_drop_quotes() {
        let (html, _) = build(vec![doclet("external:\"jQuery\"", "\"jQuery\"", Kind::External, None)], true);
        assert!(html.contains(">jQuery</a>"));
    }

    #[test]
    fn globals_are_listed() {
        let (html, index) = build(vec![doclet("run", "run", Kind::Function, None)], true);
        assert!(html.contains("expand_more</i>Global</div>"));
        assert!(html.contains("<li><a href=\"global.html#run\">run</a></li>"));
        assert_eq!(titles(&index), ["run"]);
    }

    #[test]
    fn typedef_only_globals_link_to_global_page() {
        let (html, index) = build(vec![doclet("Options", "Options", Kind::Typedef, None)], true);
        assert!(html.contains(
            "<li><div class=\"collapsible-header waves-effect waves-teal\"><a href=\"global.html\">Global</a></div></li>"
        ));
        assert!(!html.contains("expand_more</i>Global"));
        assert!(index.entries().is_empty());
    }

    #[test]
    fn title_card_and_menu() {
        let options = TemplateOptions {
            title: Some("My <em>Lib</em>".to_string()),
            sub_title: Some("<small>v2 &amp; up</small>".to_string()),
            ..Default::default()
        };
        let card = nav_title(&options, Some("logo.png"));
        assert!(card.contains("<img alt=\"Home\" src=\"logo.png\" />"));
        assert!(card.contains("<a href=\"index.html\">My <em>Lib</em></a>"));
        assert!(card.contains("<div class=\"card-action\"><small>v2 &amp; up</small></div>"));

        assert!(nav_title(&TemplateOptions::default(), None).contains(">Home</a>"));

        let addons = nav_addons(&[MenuEntry {
            label: "GitHub".to_string(),
            link: "https://github.com".to_string(),
        }]);
        assert!(addons.contains("href=\"https://github.com\" target=\"_blank\""));
        assert!(addons.contains("link</i>GitHub</a>"));
    }
}

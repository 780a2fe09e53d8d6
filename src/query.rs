//! Doclet store and query filters.
//!
//! The store owns every doclet of a run. Stages query it with a
//! [`DocletFilter`], which supports the handful of relations templates need:
//! kind membership, longname equality or prefix, and `memberof` equality or
//! absence.

use crate::model::{Doclet, Kind};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
enum NameMatch {
    Exact(String),
    Prefix(String),
}

#[derive(Debug, Clone)]
enum MemberOf {
    Undefined,
    Is(String),
}

/// Conjunction of field conditions. An empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct DocletFilter {
    kinds: Vec<Kind>,
    longname: Option<NameMatch>,
    memberof: Option<MemberOf>,
}

impl DocletFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: Kind) -> Self {
        self.kinds.push(kind);
        self
    }

    /// Match any of the given kinds.
    pub fn kinds(mut self, kinds: &[Kind]) -> Self {
        self.kinds.extend(kinds.iter().cloned());
        self
    }

    pub fn longname(mut self, longname: impl Into<String>) -> Self {
        self.longname = Some(NameMatch::Exact(longname.into()));
        self
    }

    pub fn longname_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.longname = Some(NameMatch::Prefix(prefix.into()));
        self
    }

    pub fn memberof(mut self, parent: impl Into<String>) -> Self {
        self.memberof = Some(MemberOf::Is(parent.into()));
        self
    }

    /// Only doclets without a `memberof`.
    pub fn no_memberof(mut self) -> Self {
        self.memberof = Some(MemberOf::Undefined);
        self
    }

    pub fn matches(&self, doclet: &Doclet) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&doclet.kind) {
            return false;
        }
        match &self.longname {
            Some(NameMatch::Exact(name)) if doclet.longname != *name => return false,
            Some(NameMatch::Prefix(prefix)) if !doclet.longname.starts_with(prefix.as_str()) => {
                return false
            }
            _ => {}
        }
        match &self.memberof {
            Some(MemberOf::Undefined) => doclet.memberof.is_none(),
            Some(MemberOf::Is(parent)) => doclet.memberof.as_deref() == Some(parent.as_str()),
            None => true,
        }
    }
}

/// All doclets of one generation run.
///
/// Longnames and `memberof` must not be changed through
/// [`DocletStore::iter_mut`]; the lookup indexes are only rebuilt when the
/// store itself reorders or drops doclets.
#[derive(Debug, Default)]
pub struct DocletStore {
    doclets: Vec<Doclet>,
    /// Longname → index of its first doclet.
    by_longname: HashMap<String, usize>,
    /// `memberof` → indices of its members, in store order.
    by_memberof: HashMap<String, Vec<usize>>,
}

impl DocletStore {
    pub fn new(doclets: Vec<Doclet>) -> Self {
        let mut store = Self {
            doclets,
            by_longname: HashMap::new(),
            by_memberof: HashMap::new(),
        };
        store.reindex();
        store
    }

    fn reindex(&mut self) {
        self.by_longname.clear();
        self.by_memberof.clear();
        for (i, doclet) in self.doclets.iter().enumerate() {
            self.by_longname.entry(doclet.longname.clone()).or_insert(i);
            if let Some(parent) = doclet.memberof.as_ref() {
                self.by_memberof.entry(parent.clone()).or_default().push(i);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.doclets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doclets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Doclet> {
        self.doclets.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Doclet> {
        self.doclets.iter_mut()
    }

    /// Doclets matching `filter`, in store order.
    pub fn find(&self, filter: &DocletFilter) -> Vec<&Doclet> {
        match &filter.memberof {
            Some(MemberOf::Is(parent)) => self
                .by_memberof
                .get(parent)
                .into_iter()
                .flatten()
                .map(|&i| &self.doclets[i])
                .filter(|d| filter.matches(d))
                .collect(),
            _ => self.doclets.iter().filter(|d| filter.matches(d)).collect(),
        }
    }

    /// First doclet with the given longname.
    pub fn get(&self, longname: &str) -> Option<&Doclet> {
        self.by_longname.get(longname).map(|&i| &self.doclets[i])
    }

    /// Drop doclets that should never be published: undocumented or ignored
    /// symbols, members of anonymous scopes, and private symbols unless
    /// `include_private` is set.
    pub fn prune(&mut self, include_private: bool) {
        let before = self.doclets.len();
        self.doclets.retain(|d| {
            !d.undocumented
                && !d.ignore
                && d.memberof.as_deref() != Some("<anonymous>")
                && (include_private || d.access.as_deref() != Some("private"))
        });
        self.reindex();
        tracing::debug!("pruned {} doclets", before - self.doclets.len());
    }

    /// Stable sort by longname, then version, then since.
    pub fn sort(&mut self) {
        self.doclets.sort_by(|a, b| {
            a.longname
                .cmp(&b.longname)
                .then_with(|| a.version.cmp(&b.version))
                .then_with(|| a.since.cmp(&b.since))
        });
        self.reindex();
    }

    /// Record on each event the longnames of the doclets that listen to it.
    pub fn add_event_listeners(&mut self) {
        let mut events: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, doclet) in self.doclets.iter().enumerate() {
            if doclet.kind == Kind::Event {
                events.entry(doclet.longname.as_str()).or_default().push(i);
            }
        }
        let mut pairs: Vec<(usize, String)> = Vec::new();
        for doclet in &self.doclets {
            for event in &doclet.listens {
                for &i in events.get(event.as_str()).into_iter().flatten() {
                    pairs.push((i, doclet.longname.clone()));
                }
            }
        }
        for (i, listener) in pairs {
            let listeners = &mut self.doclets[i].listeners;
            if !listeners.contains(&listener) {
                listeners.push(listener);
            }
        }
    }

    /// Ancestors of `doclet` along its `memberof` chain, outermost first.
    /// Stops at the first repeated longname, so cyclic input terminates.
    pub fn ancestors<'a>(&'a self, doclet: &Doclet) -> Vec<&'a Doclet> {
        let mut chain = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(doclet.longname.as_str());
        let mut parent = doclet.memberof.as_deref();
        while let Some(name) = parent {
            if !visited.insert(name) {
                break;
            }
            match self.get(name) {
                Some(found) => {
                    chain.push(found);
                    parent = found.memberof.as_deref();
                }
                None => break,
            }
        }
        chain.reverse();
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doclet(longname: &str, kind: Kind, memberof: Option<&str>) -> Doclet {
        Doclet {
            longname: longname.to_string(),
            name: longname.rsplit(|c: char| c == '.' || c == '#' || c == '~').next().unwrap_or(longname).to_string(),
            kind,
            memberof: memberof.map(String::from),
            ..Default::default()
        }
    }

    fn store() -> DocletStore {
        DocletStore::new(vec![
            doclet("module:widget", Kind::Module, None),
            doclet("module:widget.render", Kind::Function, Some("module:widget")),
            doclet("Foo", Kind::Class, None),
            doclet("Foo#bar", Kind::Function, Some("Foo")),
            doclet("Foo#size", Kind::Member, Some("Foo")),
        ])
    }

    #[test]
    fn find_by_kind_and_memberof() {
        let s = store();
        let found = s.find(&DocletFilter::new().kind(Kind::Function).memberof("Foo"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].longname, "Foo#bar");
    }

    #[test]
    fn find_by_prefix() {
        let s = store();
        let found = s.find(&DocletFilter::new().longname_prefix("module:"));
        let names: Vec<_> = found.iter().map(|d| d.longname.as_str()).collect();
        assert_eq!(names, ["module:widget", "module:widget.render"]);
    }

    #[test]
    fn find_without_memberof() {
        let s = store();
        let found = s.find(&DocletFilter::new().no_memberof());
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn find_any_of_kinds() {
        let s = store();
        let found = s.find(&DocletFilter::new().kinds(&[Kind::Member, Kind::Class]));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn prune_drops_unpublishable() {
        let mut hidden = doclet("Hidden", Kind::Class, None);
        hidden.undocumented = true;
        let mut private = doclet("Secret", Kind::Class, None);
        private.access = Some("private".to_string());
        let anon = doclet("<anonymous>~x", Kind::Member, Some("<anonymous>"));
        let mut s = DocletStore::new(vec![hidden, private.clone(), anon, doclet("Ok", Kind::Class, None)]);
        s.prune(false);
        assert_eq!(s.len(), 1);

        let mut s = DocletStore::new(vec![private]);
        s.prune(true);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn sort_orders_by_longname_then_version() {
        let mut a2 = doclet("A", Kind::Class, None);
        a2.version = Some("2".to_string());
        let mut a1 = doclet("A", Kind::Class, None);
        a1.version = Some("1".to_string());
        let mut s = DocletStore::new(vec![doclet("B", Kind::Class, None), a2, a1]);
        s.sort();
        let order: Vec<_> = s
            .iter()
            .map(|d| (d.longname.as_str(), d.version.as_deref()))
            .collect();
        assert_eq!(order, [("A", Some("1")), ("A", Some("2")), ("B", None)]);
    }

    #[test]
    fn event_listeners_are_recorded() {
        let mut listener = doclet("Foo#onClick", Kind::Function, Some("Foo"));
        listener.listens = vec!["Foo#event:click".to_string()];
        let event = doclet("Foo#event:click", Kind::Event, Some("Foo"));
        let mut s = DocletStore::new(vec![event, listener]);
        s.add_event_listeners();
        assert_eq!(s.get("Foo#event:click").unwrap().listeners, ["Foo#onClick"]);
    }

    #[test]
    fn ancestors_outermost_first() {
        let s = DocletStore::new(vec![
            doclet("a", Kind::Namespace, None),
            doclet("a.b", Kind::Namespace, Some("a")),
            doclet("a.b.c", Kind::Function, Some("a.b")),
        ]);
        let c = s.get("a.b.c").unwrap();
        let names: Vec<_> = s.ancestors(c).iter().map(|d| d.longname.as_str()).collect();
        assert_eq!(names, ["a", "a.b"]);
    }

    #[test]
    fn get_returns_first_match_after_reordering() {
        let mut first = doclet("A", Kind::Class, None);
        first.version = Some("2".to_string());
        let mut second = doclet("A", Kind::Class, None);
        second.version = Some("1".to_string());
        let mut s = DocletStore::new(vec![doclet("Z", Kind::Class, None), first, second]);
        assert_eq!(s.get("A").unwrap().version.as_deref(), Some("2"));

        s.sort();
        assert_eq!(s.get("A").unwrap().version.as_deref(), Some("1"));
        assert!(s.get("Z").is_some());

        s.iter_mut().for_each(|d| d.undocumented = d.longname == "Z");
        s.prune(false);
        assert!(s.get("Z").is_none());
        assert_eq!(s.get("A").unwrap().version.as_deref(), Some("1"));
        assert!(s.get("missing").is_none());
    }

    #[test]
    fn deep_chains_resolve_every_ancestor() {
        let mut doclets = vec![doclet("n0", Kind::Namespace, None)];
        for i in 1..2000 {
            let parent = format!("n{}", i - 1);
            doclets.push(doclet(&format!("n{}", i), Kind::Namespace, Some(&parent)));
        }
        let s = DocletStore::new(doclets);
        let leaf = s.get("n1999").unwrap();
        let chain = s.ancestors(leaf);
        assert_eq!(chain.len(), 1999);
        assert_eq!(chain[0].longname, "n0");
    }

    #[test]
    fn ancestors_terminate_on_cycle() {
        let s = DocletStore::new(vec![
            doclet("x", Kind::Class, Some("y")),
            doclet("y", Kind::Class, Some("x")),
        ]);
        let x = s.get("x").unwrap();
        let names: Vec<_> = s.ancestors(x).iter().map(|d| d.longname.as_str()).collect();
        assert_eq!(names, ["y"]);
    }
}

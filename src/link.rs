//! Link registry: longname to output URL, plus inline link resolution.
//!
//! Every page and anchor in the generated site is addressed through this
//! table. Filenames are claimed case-insensitively so the output is safe on
//! case-folding filesystems; the first claimant of a name keeps it and later
//! ones get a `-N` suffix.

use crate::html::{anchor, htmlsafe};
use crate::model::{Doclet, Kind, Scope};
use crate::normalize::SourceFiles;
use crate::query::DocletStore;
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use thiserror::Error;

/// Filename claimed for the home page. Not registered as a longname.
pub const INDEX: &str = "index";
/// Longname and filename of the page listing global symbols.
pub const GLOBAL: &str = "global";

const EXTENSION: &str = ".html";

static RE_NAMESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(event|module|external|package):").unwrap());

// Identifier-ish runs inside a type expression such as `Array.<module:a~B>`.
static RE_TYPE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\s<>,|(){}\[\]!?=*]+").unwrap());

// `{@link target}`, `{@link target|text}`, `{@link target text}`,
// `[text]{@link target}`, and the linkcode/linkplain variants.
static RE_INLINE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\[([^\]]+)\])?\{@(link|linkcode|linkplain)\s+([^}]*)\}").unwrap()
});

static RE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[a-zA-Z][a-zA-Z0-9+.-]*://|mailto:)").unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("`{longname}` is reserved and cannot be linked to {requested}")]
    Reserved { longname: String, requested: String },
    #[error("`{longname}` is already linked to {existing}, refusing {requested}")]
    Conflict {
        longname: String,
        existing: String,
        requested: String,
    },
}

/// Longname → URL table for one generation run.
#[derive(Debug)]
pub struct LinkRegistry {
    urls: HashMap<String, String>,
    /// Longnames in registration order.
    order: Vec<String>,
    /// Claimed basenames, lowercased.
    files: HashSet<String>,
    /// Shortened source path → listing filename.
    sources: HashMap<String, String>,
    /// Fragments already used within each file.
    fragments: HashMap<String, HashSet<String>>,
    index_url: String,
    global_url: String,
}

impl Default for LinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkRegistry {
    /// Create a registry with `index` and `global` already claimed.
    pub fn new() -> Self {
        let mut registry = LinkRegistry {
            urls: HashMap::new(),
            order: Vec::new(),
            files: HashSet::new(),
            sources: HashMap::new(),
            fragments: HashMap::new(),
            index_url: String::new(),
            global_url: String::new(),
        };
        registry.index_url = registry.unique_filename(INDEX);
        registry.global_url = registry.unique_filename(GLOBAL);
        registry.insert(GLOBAL, registry.global_url.clone());
        registry
    }

    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    pub fn global_url(&self) -> &str {
        &self.global_url
    }

    /// Claim a filesystem-safe filename derived from `s`.
    pub fn unique_filename(&mut self, s: &str) -> String {
        let base = safe_basename(s);
        let mut candidate = base.clone();
        let mut n = 0;
        while self.files.contains(&candidate.to_lowercase()) {
            n += 1;
            candidate = format!("{}-{}", base, n);
        }
        self.files.insert(candidate.to_lowercase());
        format!("{}{}", candidate, EXTENSION)
    }

    /// Store `longname → url`. Registering the same pair twice is a no-op.
    pub fn register_link(&mut self, longname: &str, url: &str) -> Result<(), RegistryError> {
        match self.urls.get(longname) {
            Some(existing) if existing == url => Ok(()),
            Some(_) if longname == GLOBAL => Err(RegistryError::Reserved {
                longname: longname.to_string(),
                requested: url.to_string(),
            }),
            Some(existing) => Err(RegistryError::Conflict {
                longname: longname.to_string(),
                existing: existing.clone(),
                requested: url.to_string(),
            }),
            None => {
                self.insert(longname, url.to_string());
                Ok(())
            }
        }
    }

    fn insert(&mut self, longname: &str, url: String) {
        self.urls.insert(longname.to_string(), url);
        self.order.push(longname.to_string());
    }

    /// URL for `doclet`, assigning and registering one on first use.
    ///
    /// Container kinds get a file of their own. Other doclets live in the
    /// file of their `memberof` (or the global page) under a fragment.
    pub fn create_link(&mut self, doclet: &Doclet) -> String {
        if let Some(url) = self.urls.get(&doclet.longname) {
            return url.clone();
        }

        let url = if doclet.kind.is_container() || is_module_exports(doclet) {
            self.filename_for(&doclet.longname)
        } else {
            let file = match doclet.memberof.as_deref() {
                Some(parent) if doclet.scope != Some(Scope::Global) => self.filename_for(parent),
                _ => self.global_url.clone(),
            };
            let fragment = self.unique_fragment(&file, &fragment_name(doclet));
            format!("{}#{}", file, fragment)
        };

        self.insert(&doclet.longname, url.clone());
        url
    }

    /// File (without fragment) that holds `longname`. An unknown container
    /// is registered on the spot so its own doclet reuses the same file.
    fn filename_for(&mut self, longname: &str) -> String {
        if let Some(url) = self.urls.get(longname) {
            return strip_fragment(url).to_string();
        }
        let file = self.unique_filename(longname);
        self.insert(longname, file.clone());
        file
    }

    fn unique_fragment(&mut self, file: &str, fragment: &str) -> String {
        let used = self.fragments.entry(file.to_string()).or_default();
        let mut candidate = fragment.to_string();
        let mut n = 0;
        while used.contains(&candidate) {
            n += 1;
            candidate = format!("{}-{}", fragment, n);
        }
        used.insert(candidate.clone());
        candidate
    }

    /// Claim the listing page for a source file.
    ///
    /// The listing always gets a file of its own. The shortened path is also
    /// registered as a longname unless a doclet already owns it (jsdoc names
    /// `@file` doclets after their path), in which case the doclet keeps it.
    pub fn register_source(&mut self, shortened: &str) -> String {
        if let Some(url) = self.sources.get(shortened) {
            return url.clone();
        }
        let file = self.unique_filename(shortened);
        if let Err(e) = self.register_link(shortened, &file) {
            tracing::debug!("source {} keeps its own page: {}", shortened, e);
        }
        self.sources.insert(shortened.to_string(), file.clone());
        file
    }

    /// Listing page of a source file, by shortened path.
    pub fn source_url(&self, shortened: &str) -> Option<&str> {
        self.sources.get(shortened).map(String::as_str)
    }

    pub fn url(&self, longname: &str) -> Option<&str> {
        self.urls.get(longname).map(String::as_str)
    }

    /// Registered longnames in registration order.
    pub fn longnames(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Anchor to `longname` with `text` (HTML) as its body, or the bare text
    /// when the longname is unknown. Without `text` the escaped longname is
    /// used.
    pub fn linkto(&self, longname: &str, text: Option<&str>, css_class: Option<&str>) -> String {
        let text = text.map_or_else(|| htmlsafe(longname), str::to_string);
        match self.urls.get(longname) {
            Some(url) => anchor(url, &text, css_class),
            None => text,
        }
    }

    /// Escaped type expression with every known name hyperlinked.
    pub fn link_type(&self, expr: &str) -> String {
        if let Some(url) = self.urls.get(expr) {
            return anchor(url, &htmlsafe(expr), None);
        }
        let mut out = String::new();
        let mut last = 0;
        for m in RE_TYPE_NAME.find_iter(expr) {
            out.push_str(&htmlsafe(&expr[last..m.start()]));
            let token = m.as_str();
            // `Array.<T>` keeps its dot outside the link
            let (name, trailing) = match token.strip_suffix('.') {
                Some(name) if !name.is_empty() => (name, "."),
                _ => (token, ""),
            };
            match self.urls.get(name) {
                Some(url) => out.push_str(&anchor(url, &htmlsafe(name), None)),
                None => out.push_str(&htmlsafe(name)),
            }
            out.push_str(trailing);
            last = m.end();
        }
        out.push_str(&htmlsafe(&expr[last..]));
        out
    }

    /// Replace inline `{@link ...}` markers with anchors. Unknown targets
    /// are left as their label text.
    pub fn resolve_links(&self, html: &str) -> String {
        RE_INLINE_LINK
            .replace_all(html, |caps: &Captures| {
                let (target, split_text) = split_link_text(caps[3].trim());
                let mut text = caps
                    .get(1)
                    .map(|m| m.as_str().to_string())
                    .or(split_text)
                    .unwrap_or_else(|| target.to_string());
                if &caps[2] == "linkcode" {
                    text = format!("<code>{}</code>", text);
                }
                if RE_URL.is_match(target) {
                    return anchor(target, &text, None);
                }
                match self.urls.get(target) {
                    Some(url) => anchor(url, &text, None),
                    None => text,
                }
            })
            .into_owned()
    }
}

/// Turn a `#fragment` see-reference into an anchor on the doclet's own page.
/// Anything else is returned unchanged.
pub fn hash_to_link(doclet_url: &str, see: &str) -> String {
    if see.len() < 2 || !see.starts_with('#') {
        return see.to_string();
    }
    let url = format!("{}{}", strip_fragment(doclet_url), see);
    anchor(&url, &htmlsafe(see), None)
}

/// Register every doclet and source file, then fill in the fields that need
/// URLs: `meta.shortpath` and hash-style `see` entries.
///
/// Doclets are linked in order of `memberof` depth so a container always
/// claims its file before its members look it up.
pub fn register_doclets(registry: &mut LinkRegistry, store: &mut DocletStore, sources: &SourceFiles) {
    let mut order: Vec<(usize, usize)> = store
        .iter()
        .enumerate()
        .map(|(i, d)| (store.ancestors(d).len(), i))
        .collect();
    order.sort();

    let mut urls = vec![String::new(); store.len()];
    {
        let doclets: Vec<&Doclet> = store.iter().collect();
        for (_, i) in order {
            urls[i] = registry.create_link(doclets[i]);
        }
    }

    for source in sources.iter() {
        registry.register_source(&source.shortened);
    }

    for (doclet, url) in store.iter_mut().zip(urls) {
        if let Some(meta) = doclet.meta.as_mut() {
            meta.shortpath = sources.shortened(&meta.source_path()).map(str::to_string);
        }
        for see in doclet.see.iter_mut() {
            *see = hash_to_link(&url, see);
        }
    }

    tracing::debug!("registered {} links", registry.order.len());
}

fn strip_fragment(url: &str) -> &str {
    url.split('#').next().unwrap_or(url)
}

/// A doclet documenting a module's sole export (`module:foo` as a class or
/// function rather than as the module itself).
fn is_module_exports(doclet: &Doclet) -> bool {
    doclet.longname == doclet.name
        && doclet.longname.starts_with("module:")
        && doclet.kind != Kind::Module
}

fn fragment_name(doclet: &Doclet) -> String {
    let punc = match doclet.scope {
        Some(Scope::Static) => ".",
        Some(Scope::Inner) => "~",
        _ => "",
    };
    let namespace = if doclet.kind == Kind::Event { "event:" } else { "" };
    let name = if doclet.name.is_empty() {
        doclet.longname.as_str()
    } else {
        doclet.name.as_str()
    };
    format!("{}{}{}", punc, namespace, name)
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Basename made only of `[A-Za-z0-9._-]`.
fn safe_basename(s: &str) -> String {
    let s = RE_NAMESPACE.replace(s, "${1}-");
    let s = s.replace("()", "");
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.chars().enumerate() {
        out.push(match c {
            '~' => '-',
            '.' if i == 0 => '_',
            c if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') => c,
            _ => '_',
        });
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}

fn split_link_text(s: &str) -> (&str, Option<String>) {
    if let Some((target, text)) = s.split_once('|') {
        return (target.trim(), Some(text.trim().to_string()));
    }
    match s.split_once(char::is_whitespace) {
        Some((target, text)) => (target, Some(text.trim().to_string())),
        None => (s, None),
    }
}

//! Doclet normalizer: the first pipeline stage.
//!
//! Prunes and sorts the raw doclets, splits example captions, records event
//! listeners and collects the set of source files with their shortened
//! paths.

use crate::model::Example;
use crate::query::DocletStore;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static RE_CAPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*<caption>(.+?)</caption>\s*[\n\r](.+)$").unwrap()
});

/// One source file referenced by doclet metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub resolved: String,
    pub shortened: String,
}

/// Source files in first-seen order, keyed by resolved path.
#[derive(Debug, Default)]
pub struct SourceFiles {
    files: Vec<SourceFile>,
    by_resolved: HashMap<String, usize>,
}

impl SourceFiles {
    /// Build the set from resolved paths, stripping their common prefix.
    pub fn from_paths(paths: Vec<String>) -> Self {
        let mut seen = HashSet::new();
        let unique: Vec<String> = paths.into_iter().filter(|p| seen.insert(p.clone())).collect();
        let prefix = common_path_prefix(&unique);
        let mut files = SourceFiles::default();
        for resolved in unique {
            let shortened = resolved
                .strip_prefix(prefix.as_str())
                .unwrap_or(&resolved)
                .replace('\\', "/");
            files.by_resolved.insert(resolved.clone(), files.files.len());
            files.files.push(SourceFile { resolved, shortened });
        }
        files
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Shortened path for a resolved source path.
    pub fn shortened(&self, resolved: &str) -> Option<&str> {
        self.by_resolved
            .get(resolved)
            .map(|&i| self.files[i].shortened.as_str())
    }
}

/// Normalize `store` in place and return the source files it references.
pub fn normalize(store: &mut DocletStore, include_private: bool) -> SourceFiles {
    store.prune(include_private);
    store.sort();
    store.add_event_listeners();

    let mut paths = Vec::new();
    for doclet in store.iter_mut() {
        doclet.attribs.clear();
        for example in doclet.examples.iter_mut() {
            *example = split_caption(&example.code);
        }
        doclet.see.retain(|s| !s.trim().is_empty());
        if let Some(meta) = doclet.meta.as_ref() {
            paths.push(meta.source_path());
        }
    }

    let sources = SourceFiles::from_paths(paths);
    tracing::debug!("{} doclets reference {} source files", store.len(), sources.len());
    sources
}

/// Split a leading `<caption>...</caption>` off an example.
pub fn split_caption(example: &str) -> Example {
    match RE_CAPTION.captures(example) {
        Some(caps) => Example {
            caption: caps[1].to_string(),
            code: caps[2].to_string(),
        },
        None => Example {
            caption: String::new(),
            code: example.to_string(),
        },
    }
}

/// Longest common directory prefix of `paths`, ending in a separator.
///
/// A lone path yields its parent directory; paths with nothing in common
/// yield the empty string.
pub fn common_path_prefix(paths: &[String]) -> String {
    let Some(first) = paths.first() else {
        return String::new();
    };
    let sep = if first.contains('/') || !first.contains('\\') {
        '/'
    } else {
        '\\'
    };

    let first_parts: Vec<&str> = first.split(sep).collect();
    // never swallow the file name itself
    let mut end = first_parts.len().saturating_sub(1);
    for path in &paths[1..] {
        let parts: Vec<&str> = path.split(sep).collect();
        let limit = end.min(parts.len().saturating_sub(1));
        end = (0..limit)
            .find(|&i| parts[i] != first_parts[i])
            .unwrap_or(limit);
        if end == 0 {
            return String::new();
        }
    }
    if end == 0 {
        return String::new();
    }

    let mut prefix = first_parts[..end].join(&sep.to_string());
    prefix.push(sep);
    prefix
}

//! Search index: flat `{title, link}` records collected while the nav is
//! built, embedded in every page for the client-side fuzzy finder.

use anyhow::Result;
use serde::Serialize;

/// One searchable symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchEntry {
    /// The symbol's longname.
    pub title: String,
    /// Pre-rendered anchor HTML shown in the result list.
    pub link: String,
}

/// Options handed to the client-side fuzzy matcher.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    pub should_sort: bool,
    pub threshold: f64,
    pub location: u32,
    pub distance: u32,
    pub max_pattern_length: u32,
    pub min_pattern_length: u32,
    pub keys: Vec<&'static str>,
    /// Results shown per query.
    pub max_results: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            should_sort: true,
            threshold: 0.4,
            location: 0,
            distance: 100,
            max_pattern_length: 32,
            min_pattern_length: 3,
            keys: vec!["title"],
            max_results: 20,
        }
    }
}

/// Append-only index. A disabled index ignores pushes.
#[derive(Debug)]
pub struct SearchIndex {
    enabled: bool,
    entries: Vec<SearchEntry>,
}

impl SearchIndex {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn push(&mut self, title: &str, link: String) {
        if self.enabled {
            self.entries.push(SearchEntry {
                title: title.to_string(),
                link,
            });
        }
    }

    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    /// `{"enabled": .., "options": .., "list": [..]}` for embedding in a page.
    pub fn to_json(&self) -> Result<String> {
        #[derive(Serialize)]
        struct Payload<'a> {
            enabled: bool,
            options: SearchOptions,
            list: &'a [SearchEntry],
        }
        let payload = Payload {
            enabled: self.enabled,
            options: SearchOptions::default(),
            list: &self.entries,
        };
        Ok(serde_json::to_string(&payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_index_stays_empty() {
        let mut index = SearchIndex::new(false);
        index.push("Foo", "<a>Foo</a>".to_string());
        assert!(index.entries().is_empty());
    }

    #[test]
    fn serializes_options_and_entries() {
        let mut index = SearchIndex::new(true);
        index.push("Foo", "<a href=\"Foo.html\">Foo</a>".to_string());
        let json: serde_json::Value = serde_json::from_str(&index.to_json().unwrap()).unwrap();
        assert_eq!(json["enabled"], true);
        assert_eq!(json["options"]["minPatternLength"], 3);
        assert_eq!(json["options"]["maxPatternLength"], 32);
        assert_eq!(json["options"]["keys"][0], "title");
        assert_eq!(json["list"][0]["title"], "Foo");
    }
}

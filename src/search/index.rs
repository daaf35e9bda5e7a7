//! The inverted term index written to `search.json`.
//!
//! ## Format
//!
//! ```json
//! {
//!   "c": 1234,
//!   "b": [{ "title": "Hello", "url": "/2024-01-01-hello.html", "date": "2024-01-01", "subtitle": "Jan 1st" }],
//!   "p": [{ "titles": ["Guides", "Install"], "url": "/guides-install.html" }],
//!   "t": { "hello": { "c": 3, "b": { "0": 2 }, "p": { "0": 1 } } }
//! }
//! ```
//!
//! - `c`: grand total of recorded term occurrences
//! - `b` / `p`: reference tables of blog entries and pages; term entries point
//!   into them by position so identifiers are stored once
//! - `t`: term → total count plus per-document counts for each content class
//!
//! The keys are single letters because the file is fetched by every visitor
//! who searches.
//!
//! ## Building
//!
//! An [`IndexBuilder`] is folded over the content items of one build, in
//! traversal order, and then frozen into an [`Index`]. Maps are ordered, so
//! identical content in identical order serializes to identical bytes.

use crate::types::{BlogReference, ContentClass, PageReference};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Occurrences of a single term.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermEntry {
    /// Total occurrences across all documents.
    #[serde(rename = "c")]
    pub count: u64,
    /// Blog reference index → occurrences in that entry.
    #[serde(rename = "b", default)]
    pub blog: BTreeMap<usize, u64>,
    /// Page reference index → occurrences in that page.
    #[serde(rename = "p", default)]
    pub page: BTreeMap<usize, u64>,
}

impl TermEntry {
    /// Per-document counts for one content class.
    pub fn occurrences(&self, class: ContentClass) -> &BTreeMap<usize, u64> {
        match class {
            ContentClass::Blog => &self.blog,
            ContentClass::Page => &self.page,
        }
    }
}

/// Immutable inverted index produced by one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    #[serde(rename = "c")]
    pub total: u64,
    #[serde(rename = "b")]
    pub blog_entries: Vec<BlogReference>,
    #[serde(rename = "p")]
    pub pages: Vec<PageReference>,
    #[serde(rename = "t")]
    pub terms: BTreeMap<String, TermEntry>,
}

#[derive(Error, Debug)]
pub enum IndexLoadError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("term {term:?} points at {class} reference {reference}, which does not exist")]
    DanglingReference {
        term: String,
        class: ContentClass,
        reference: usize,
    },
}

impl Index {
    /// Parse a serialized index and check that every reference resolves.
    pub fn from_json(json: &str) -> Result<Self, IndexLoadError> {
        let index: Index = serde_json::from_str(json)?;
        index.validate()?;
        Ok(index)
    }

    fn validate(&self) -> Result<(), IndexLoadError> {
        for (term, entry) in &self.terms {
            for class in ContentClass::ALL {
                let table_len = self.reference_count(class);
                if let Some(&reference) = entry
                    .occurrences(class)
                    .keys()
                    .find(|&&r| r >= table_len)
                {
                    return Err(IndexLoadError::DanglingReference {
                        term: term.clone(),
                        class,
                        reference,
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of entries in the reference table of `class`.
    pub fn reference_count(&self, class: ContentClass) -> usize {
        match class {
            ContentClass::Blog => self.blog_entries.len(),
            ContentClass::Page => self.pages.len(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A content item as seen by the index: its class, a key that identifies it
/// within the build (its source path) and the metadata stored in the
/// reference table.
#[derive(Debug, Clone)]
pub enum IndexedItem {
    Blog { key: String, reference: BlogReference },
    Page { key: String, reference: PageReference },
}

impl IndexedItem {
    fn class(&self) -> ContentClass {
        match self {
            IndexedItem::Blog { .. } => ContentClass::Blog,
            IndexedItem::Page { .. } => ContentClass::Page,
        }
    }

    fn key(&self) -> &str {
        match self {
            IndexedItem::Blog { key, .. } | IndexedItem::Page { key, .. } => key,
        }
    }
}

/// Accumulates term occurrences item by item.
///
/// Items get a reference slot the first time one of their terms is
/// recorded; items without any term never enter the reference tables.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    index: Index,
    slots: HashMap<(ContentClass, String), usize>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the terms of one content item and return the builder.
    pub fn add<I, S>(mut self, item: &IndexedItem, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let class = item.class();
        let mut slot = None;
        for term in terms {
            let slot = *slot.get_or_insert_with(|| self.slot(item));
            let entry = self.index.terms.entry(term.into()).or_default();
            entry.count += 1;
            let per_doc = match class {
                ContentClass::Blog => &mut entry.blog,
                ContentClass::Page => &mut entry.page,
            };
            *per_doc.entry(slot).or_default() += 1;
            self.index.total += 1;
        }
        self
    }

    fn slot(&mut self, item: &IndexedItem) -> usize {
        let class = item.class();
        if let Some(&slot) = self.slots.get(&(class, item.key().to_string())) {
            return slot;
        }
        let slot = match item {
            IndexedItem::Blog { reference, .. } => {
                self.index.blog_entries.push(reference.clone());
                self.index.blog_entries.len() - 1
            }
            IndexedItem::Page { reference, .. } => {
                self.index.pages.push(reference.clone());
                self.index.pages.len() - 1
            }
        };
        self.slots.insert((class, item.key().to_string()), slot);
        slot
    }

    pub fn finish(self) -> Index {
        self.index
    }
}

/// Fold content items and their terms into a fresh index.
pub fn build_index<'a, I>(items: I) -> Index
where
    I: IntoIterator<Item = (&'a IndexedItem, Vec<String>)>,
{
    items
        .into_iter()
        .fold(IndexBuilder::new(), |builder, (item, terms)| {
            builder.add(item, terms)
        })
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::tokenize::tokenize;
    use proptest::prelude::*;

    fn blog(key: &str) -> IndexedItem {
        IndexedItem::Blog {
            key: key.to_string(),
            reference: BlogReference {
                title: key.to_string(),
                url: format!("/{key}.html"),
                date: "2024-01-01".to_string(),
                subtitle: "January 1st".to_string(),
            },
        }
    }

    fn page(key: &str) -> IndexedItem {
        IndexedItem::Page {
            key: key.to_string(),
            reference: PageReference {
                titles: vec![key.to_string()],
                url: format!("/{key}.html"),
            },
        }
    }

    fn sample() -> Index {
        let b = blog("first");
        let p = page("about");
        build_index([
            (&p, tokenize("about the bass and the bash")),
            (&b, tokenize("bass bass fishing")),
        ])
    }

    #[test]
    fn counts_per_term_and_document() {
        let index = sample();
        let bass = &index.terms["bass"];
        assert_eq!(bass.count, 3);
        assert_eq!(bass.page.get(&0), Some(&1));
        assert_eq!(bass.blog.get(&0), Some(&2));
        assert_eq!(index.terms["the"].count, 2);
        assert_eq!(index.total, 9);
    }

    #[test]
    fn references_are_added_once() {
        let p = page("about");
        let index = IndexBuilder::new()
            .add(&p, ["alpha"])
            .add(&p, ["beta", "alpha"])
            .finish();
        assert_eq!(index.pages.len(), 1);
        assert_eq!(index.terms["alpha"].page.get(&0), Some(&2));
    }

    #[test]
    fn slots_follow_first_use_across_items() {
        let (a, b, c) = (page("a"), page("b"), page("c"));
        let index = IndexBuilder::new()
            .add(&a, ["one", "two", "two"])
            .add(&b, Vec::<String>::new())
            .add(&c, ["two"])
            .add(&b, ["one"])
            .finish();
        let urls: Vec<&str> = index.pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["/a.html", "/c.html", "/b.html"]);
        assert_eq!(index.terms["two"].page.get(&0), Some(&2));
        assert_eq!(index.terms["two"].page.get(&1), Some(&1));
        assert_eq!(index.terms["one"].page.get(&2), Some(&1));
    }

    #[test]
    fn items_without_terms_get_no_reference() {
        let empty = page("empty");
        let full = page("full");
        let index = build_index([(&empty, vec![]), (&full, vec!["word".to_string()])]);
        assert_eq!(index.pages.len(), 1);
        assert_eq!(index.pages[0].url, "/full.html");
        assert_eq!(index.terms["word"].page.get(&0), Some(&1));
    }

    #[test]
    fn serialized_keys_are_compact() {
        let json = sample().to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let top: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(top.len(), 4);
        assert!(value["t"]["bass"]["b"]["0"].is_u64());
        assert_eq!(value["p"][0]["titles"][0], "about");
    }

    #[test]
    fn json_round_trip_preserves_index() {
        let index = sample();
        let loaded = Index::from_json(&index.to_json_pretty().unwrap()).unwrap();
        assert_eq!(loaded, index);
    }

    #[test]
    fn building_twice_is_byte_identical() {
        assert_eq!(
            sample().to_json_pretty().unwrap(),
            sample().to_json_pretty().unwrap()
        );
    }

    #[test]
    fn dangling_reference_is_rejected() {
        let json = r#"{"c":1,"b":[],"p":[],"t":{"word":{"c":1,"b":{"3":1},"p":{}}}}"#;
        let err = Index::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            IndexLoadError::DanglingReference { reference: 3, .. }
        ));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            Index::from_json("{not json"),
            Err(IndexLoadError::Json(_))
        ));
    }

    proptest! {
        #[test]
        fn totals_are_consistent(texts in proptest::collection::vec("[a-z ]{0,60}", 1..8)) {
            let items: Vec<IndexedItem> = texts
                .iter()
                .enumerate()
                .map(|(i, _)| {
                    if i % 2 == 0 {
                        page(&format!("p{i}"))
                    } else {
                        blog(&format!("b{i}"))
                    }
                })
                .collect();
            let index = build_index(items.iter().zip(texts.iter().map(|t| tokenize(t))));

            let mut grand_total = 0;
            for entry in index.terms.values() {
                let per_doc: u64 = entry.blog.values().chain(entry.page.values()).sum();
                prop_assert_eq!(per_doc, entry.count);
                grand_total += entry.count;
            }
            prop_assert_eq!(grand_total, index.total);
            prop_assert!(Index::from_json(&index.to_json_pretty().unwrap()).is_ok());
        }
    }
}

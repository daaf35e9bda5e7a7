//! Full-text search over the generated site.
//!
//! The build folds every page and blog entry into an inverted [`Index`]
//! (written as `search.json`); visitors' queries are parsed and evaluated
//! against it and the opened result page highlights what matched.
//!
//! ```text
//! build:   rendered HTML ─tokenize─▶ IndexBuilder ─finish─▶ Index ─▶ search.json
//! query:   "rust +async"  ─parse_query─▶ ParsedQuery ─evaluate─▶ Vec<SearchResult>
//! open:    ?m=["async","rust"] ─▶ Highlighter::mark_document
//! ```
//!
//! Evaluation never fails: a malformed index or an unusable query yields an
//! empty result list.

pub mod evaluate;
pub mod highlight;
pub mod index;
pub mod query;
pub mod tokenize;

pub use evaluate::{SearchOptions, SearchResult, TermSource, evaluate, highlight_query_string};
pub use highlight::Highlighter;
pub use index::{Index, IndexBuilder, IndexLoadError, IndexedItem, TermEntry};
pub use query::{ParsedQuery, QueryTerm, parse_query};
pub use tokenize::{html_terms, tokenize};

use crate::types::ContentClass;
use serde::Serialize;

/// A search result with what is needed to display it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    #[serde(flatten)]
    pub result: SearchResult,
    pub title: String,
    pub url: String,
    /// Date of a blog entry, ancestor titles of a page.
    pub subtitle: String,
}

impl ResultView {
    /// Link to the result that opens it with its matches highlighted.
    pub fn href(&self) -> String {
        format!("{}{}", self.url, self.result.highlight_query_string)
    }
}

impl Index {
    /// Attach reference metadata to a result.
    pub fn view(&self, result: SearchResult) -> Option<ResultView> {
        let (title, url, subtitle) = match result.content_class {
            ContentClass::Blog => {
                let entry = self.blog_entries.get(result.reference_id)?;
                (
                    entry.title.clone(),
                    entry.url.clone(),
                    entry.subtitle.clone(),
                )
            }
            ContentClass::Page => {
                let page = self.pages.get(result.reference_id)?;
                let (own, ancestors) = page.titles.split_last()?;
                (own.clone(), page.url.clone(), ancestors.join(" › "))
            }
        };
        Some(ResultView {
            result,
            title,
            url,
            subtitle,
        })
    }

    /// Parse and evaluate `query`, returning displayable results.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<ResultView> {
        evaluate(&parse_query(query), self, options)
            .into_iter()
            .filter_map(|result| self.view(result))
            .collect()
    }
}

/// Evaluate `query` against a serialized index.
///
/// A malformed index is logged and treated as empty.
pub fn search_json(index_json: &str, query: &str, options: &SearchOptions) -> Vec<ResultView> {
    match Index::from_json(index_json) {
        Ok(index) => index.search(query, options),
        Err(e) => {
            tracing::warn!("unusable search index: {e}");
            Vec::new()
        }
    }
}

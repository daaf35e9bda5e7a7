//! Marking matched terms in rendered pages.
//!
//! A result link carries the matched index terms in its `m` parameter (see
//! [`highlight_query_string`](super::evaluate::highlight_query_string)); the
//! page being opened wraps every occurrence in
//! `<span class="search-mark">…</span>`.

use crate::markup;
use regex::Regex;
use std::collections::BTreeSet;

pub const MARK_CLASS: &str = "search-mark";

/// Case-insensitive matcher for a set of terms.
#[derive(Debug, Clone)]
pub struct Highlighter {
    pattern: Regex,
}

impl Highlighter {
    /// Build a highlighter for `terms`.
    ///
    /// Terms are lowercased and anything that is not purely alphabetic is
    /// discarded. Returns `None` when no term is left.
    pub fn new<I, S>(terms: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms: BTreeSet<String> = terms
            .into_iter()
            .map(|t| t.as_ref().to_lowercase())
            .filter(|t| !t.is_empty() && t.bytes().all(|b| b.is_ascii_lowercase()))
            .collect();
        if terms.is_empty() {
            return None;
        }
        // Longest first so "bass" wins over "bas" at the same position.
        let mut alternatives: Vec<&str> = terms.iter().map(String::as_str).collect();
        alternatives.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        let pattern = Regex::new(&format!("(?i)({})", alternatives.join("|"))).ok()?;
        Some(Self { pattern })
    }

    /// Wrap matches in one text run. `None` when nothing matched.
    pub fn mark_text(&self, text: &str) -> Option<String> {
        if !self.pattern.is_match(text) {
            return None;
        }
        Some(
            self.pattern
                .replace_all(text, format!(r#"<span class="{MARK_CLASS}">$1</span>"#))
                .into_owned(),
        )
    }

    /// Mark every visible text run of an HTML fragment.
    pub fn mark_html(&self, html: &str) -> String {
        markup::rewrite_text(html, &[], |text| self.mark_text(text))
    }

    /// Mark a whole document, touching only the contents of its `<main>`
    /// element. Documents without one are returned unchanged.
    pub fn mark_document(&self, document: &str) -> String {
        let Some((start, end)) = main_content_range(document) else {
            return document.to_string();
        };
        let mut out = String::with_capacity(document.len() + 64);
        out.push_str(&document[..start]);
        out.push_str(&self.mark_html(&document[start..end]));
        out.push_str(&document[end..]);
        out
    }
}

/// Byte range of the inner HTML of the first `<main>` element.
fn main_content_range(document: &str) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut offset = 0usize;
    let mut start = None;
    for token in markup::tokens(document) {
        let len = token.as_str().len();
        match &token {
            markup::Token::Open(_, name) if name == "main" => {
                if start.is_none() {
                    start = Some(offset + len);
                }
                depth += 1;
            }
            markup::Token::Close(_, name) if name == "main" && start.is_some() => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| (s, offset));
                }
            }
            _ => {}
        }
        offset += len;
    }
    // Unclosed main: everything after the opening tag.
    start.map(|s| (s, document.len()))
}

/// Decode the `m` parameter value, a JSON array of terms.
///
/// Malformed values yield no terms.
pub fn parse_mark_param(m: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(m).unwrap_or_default()
}

/// Extract the terms from a query string such as `?m=%5B%22bass%22%5D`.
pub fn terms_from_query_string(query: &str) -> Vec<String> {
    let query = query.trim_start_matches('?');
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .unwrap_or_default()
        .into_iter()
        .find(|(key, _)| key == "m")
        .map(|(_, value)| parse_mark_param(&value))
        .unwrap_or_default()
}

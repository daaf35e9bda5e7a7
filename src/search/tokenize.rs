//! Term extraction for the search index.
//!
//! A term is a lowercase, purely alphabetic ASCII word of at least three
//! letters. There is no stemming and no stop-word list: what the reader sees
//! is what gets indexed.

use scraper::Html;

/// Shortest word that is worth indexing.
pub const MIN_TERM_LEN: usize = 3;

fn is_term(token: &str) -> bool {
    token.len() >= MIN_TERM_LEN && token.bytes().all(|b| b.is_ascii_lowercase())
}

/// Split a run of plain text into terms.
///
/// Trims, lowercases, splits on every character that is not an ASCII word
/// character and keeps only tokens that are [terms](MIN_TERM_LEN). Numbers,
/// underscores and accented letters break or disqualify a token.
pub fn tokenize(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed
        .to_lowercase()
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|token| is_term(token))
        .map(str::to_string)
        .collect()
}

/// Extract the terms of every visible text node of a rendered HTML fragment.
///
/// Text nodes are tokenized one at a time, so words never join across tag
/// boundaries. Script and style contents are not visible and are skipped.
pub fn html_terms(html: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .descendants()
        .filter(|node| {
            node.parent()
                .and_then(|p| p.value().as_element().map(|e| e.name()))
                .is_none_or(|name| name != "script" && name != "style")
        })
        .filter_map(|node| node.value().as_text().map(|text| tokenize(text)))
        .flatten()
        .collect()
}

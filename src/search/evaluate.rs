//! Query evaluation against a term source.
//!
//! Evaluation happens in four steps:
//!
//! 1. **Resolve** every query term to the index terms it stands for. Fuzzy
//!    terms take the closest vocabulary terms by edit distance plus every term
//!    containing them; literal terms only the containing ones. A term that
//!    resolves to nothing becomes a zero-count placeholder.
//! 2. **Short-circuit** when an AND term is a placeholder: nothing can match.
//! 3. **Aggregate** each group per content class into [`MatchRecord`]s keyed
//!    by reference index.
//! 4. **Combine and rank**. Without AND terms the OR records are the
//!    candidates; with AND terms only items matching every AND term are kept,
//!    enriched with their OR record when there is one. Anything touched by a
//!    NOT term is dropped. Results are ordered by count, blog entries before
//!    pages on ties, then by reference index.

use super::index::{Index, TermEntry};
use super::query::{ParsedQuery, QueryTerm};
use crate::types::ContentClass;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Read access to an inverted index.
pub trait TermSource {
    /// Every indexed term.
    fn vocabulary(&self) -> impl Iterator<Item = &str>;
    /// Occurrences of one indexed term.
    fn entry(&self, term: &str) -> Option<&TermEntry>;
}

impl TermSource for Index {
    fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    fn entry(&self, term: &str) -> Option<&TermEntry> {
        self.terms.get(term)
    }
}

/// Tuning knobs for evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Largest accepted edit distance for fuzzy terms, as a fraction of the
    /// query term's length.
    pub fuzzy_threshold: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.4,
        }
    }
}

/// Aggregated match of one content item within one term group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchRecord {
    pub count: u64,
    /// Query terms that led to this item.
    pub original_terms: BTreeSet<String>,
    /// Index terms found in this item and their occurrences in it.
    pub terms: BTreeMap<String, u64>,
}

impl MatchRecord {
    fn absorb(&mut self, original: &str, term: &str, count: u64) {
        self.count += count;
        self.original_terms.insert(original.to_string());
        self.terms.insert(term.to_string(), count);
    }

    /// Sum the counts and union the term sets of two records.
    pub fn merge(mut self, other: MatchRecord) -> MatchRecord {
        self.count += other.count;
        self.original_terms.extend(other.original_terms);
        self.terms.extend(other.terms);
        self
    }
}

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Position in the reference table of `content_class`.
    pub reference_id: usize,
    pub content_class: ContentClass,
    pub count: u64,
    pub matched_original_terms: Vec<String>,
    pub matched_index_terms: BTreeMap<String, u64>,
    /// `?m=…` suffix for the result link, see [`highlight_query_string`].
    pub highlight_query_string: String,
}

/// Encode matched index terms as the `m` query parameter read by the
/// highlighter: `?m=` followed by the form-encoded JSON array of terms.
pub fn highlight_query_string<'a, I>(terms: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let terms: Vec<&str> = terms.into_iter().collect();
    let json = serde_json::to_string(&terms).unwrap_or_default();
    serde_urlencoded::to_string(&[("m", json.as_str())])
        .map(|encoded| format!("?{encoded}"))
        .unwrap_or_default()
}

/// A query term resolved to one index term.
struct Hit<'a> {
    original: &'a str,
    term: &'a str,
    entry: Option<&'a TermEntry>,
}

/// Vocabulary terms at the smallest edit distance from `term`, provided that
/// distance is within `threshold * term.len()`.
fn closest_matches<'a>(term: &str, vocabulary: &[&'a str], threshold: f64) -> Vec<&'a str> {
    let max_distance = (term.len() as f64 * threshold).floor() as usize;
    let mut best = usize::MAX;
    let mut matches = Vec::new();
    for &candidate in vocabulary {
        let distance = strsim::levenshtein(term, candidate);
        if distance > max_distance || distance > best {
            continue;
        }
        if distance < best {
            best = distance;
            matches.clear();
        }
        matches.push(candidate);
    }
    matches
}

fn resolve<'a, S: TermSource>(
    query_term: &'a QueryTerm,
    vocabulary: &[&'a str],
    source: &'a S,
    options: &SearchOptions,
) -> Vec<Hit<'a>> {
    let needle = query_term.term.as_str();
    let mut matched = if query_term.fuzzy {
        closest_matches(needle, vocabulary, options.fuzzy_threshold)
    } else {
        Vec::new()
    };
    for &candidate in vocabulary {
        if candidate.contains(needle) && !matched.contains(&candidate) {
            matched.push(candidate);
        }
    }

    let hits: Vec<Hit<'a>> = matched
        .into_iter()
        .filter_map(|term| {
            source.entry(term).map(|entry| Hit {
                original: needle,
                term,
                entry: Some(entry),
            })
        })
        .collect();

    if hits.is_empty() {
        vec![Hit {
            original: needle,
            term: needle,
            entry: None,
        }]
    } else {
        hits
    }
}

fn resolve_group<'a, S: TermSource>(
    terms: &'a [QueryTerm],
    vocabulary: &[&'a str],
    source: &'a S,
    options: &SearchOptions,
) -> Vec<Hit<'a>> {
    terms
        .iter()
        .flat_map(|term| resolve(term, vocabulary, source, options))
        .collect()
}

fn aggregate(hits: &[Hit<'_>], class: ContentClass) -> BTreeMap<usize, MatchRecord> {
    let mut records: BTreeMap<usize, MatchRecord> = BTreeMap::new();
    for hit in hits {
        let Some(entry) = hit.entry else { continue };
        for (&reference, &count) in entry.occurrences(class) {
            records
                .entry(reference)
                .or_default()
                .absorb(hit.original, hit.term, count);
        }
    }
    records
}

fn combine(
    and: BTreeMap<usize, MatchRecord>,
    mut or: BTreeMap<usize, MatchRecord>,
    not: &BTreeMap<usize, MatchRecord>,
    and_terms: usize,
) -> Vec<(usize, MatchRecord)> {
    let candidates: Vec<(usize, MatchRecord)> = if and_terms == 0 {
        or.into_iter().collect()
    } else {
        and.into_iter()
            .filter(|(_, record)| record.original_terms.len() == and_terms)
            .map(|(reference, record)| match or.remove(&reference) {
                Some(or_record) => (reference, or_record.merge(record)),
                None => (reference, record),
            })
            .collect()
    };
    candidates
        .into_iter()
        .filter(|(reference, _)| !not.contains_key(reference))
        .collect()
}

/// Evaluate a parsed query and return ranked results.
///
/// An empty query returns no results without reading `source`.
pub fn evaluate<S: TermSource>(
    query: &ParsedQuery,
    source: &S,
    options: &SearchOptions,
) -> Vec<SearchResult> {
    if query.is_empty() {
        return Vec::new();
    }

    let vocabulary: Vec<&str> = source.vocabulary().collect();
    let and_hits = resolve_group(&query.and, &vocabulary, source, options);
    if and_hits.iter().any(|hit| hit.entry.is_none()) {
        return Vec::new();
    }
    let not_hits = resolve_group(&query.not, &vocabulary, source, options);
    let or_hits = resolve_group(&query.or, &vocabulary, source, options);

    let mut results = Vec::new();
    for class in ContentClass::ALL {
        let not = aggregate(&not_hits, class);
        let kept = combine(
            aggregate(&and_hits, class),
            aggregate(&or_hits, class),
            &not,
            query.and.len(),
        );
        results.extend(kept.into_iter().map(|(reference_id, record)| SearchResult {
            reference_id,
            content_class: class,
            count: record.count,
            highlight_query_string: highlight_query_string(
                record.terms.keys().map(String::as_str),
            ),
            matched_original_terms: record.original_terms.into_iter().collect(),
            matched_index_terms: record.terms,
        }));
    }

    // Stable: equal count and class keep reference order.
    results.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then(a.content_class.cmp(&b.content_class))
    });
    results
}

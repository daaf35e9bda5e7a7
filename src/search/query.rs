//! Query string parsing.
//!
//! ```text
//! rust +async -tokio "pin"
//!  │     │      │      └─ OR, literal (substring match only)
//!  │     │      └─ NOT, fuzzy
//!  │     └─ AND, fuzzy
//!  └─ OR, fuzzy
//! ```
//!
//! Tokens that are not purely alphabetic after stripping markers and quotes
//! are dropped, as are repeats of a term already seen anywhere in the query.

use serde::Serialize;
use std::collections::HashSet;

/// A single query term and how it is resolved against the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryTerm {
    pub term: String,
    /// Fuzzy terms also match vocabulary terms at a small edit distance.
    pub fuzzy: bool,
}

impl QueryTerm {
    pub fn fuzzy(term: &str) -> Self {
        Self {
            term: term.to_string(),
            fuzzy: true,
        }
    }

    pub fn literal(term: &str) -> Self {
        Self {
            term: term.to_string(),
            fuzzy: false,
        }
    }
}

/// The three term groups of a query, each in query order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedQuery {
    pub and: Vec<QueryTerm>,
    pub or: Vec<QueryTerm>,
    pub not: Vec<QueryTerm>,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        self.and.is_empty() && self.or.is_empty() && self.not.is_empty()
    }

    /// Every term of the query, AND first, then NOT, then OR.
    pub fn terms(&self) -> impl Iterator<Item = &QueryTerm> {
        self.and.iter().chain(&self.not).chain(&self.or)
    }
}

#[derive(Clone, Copy)]
enum Group {
    And,
    Or,
    Not,
}

fn is_query_term(term: &str) -> bool {
    !term.is_empty() && term.bytes().all(|b| b.is_ascii_lowercase())
}

/// Parse a raw query string.
///
/// The query is trimmed and lowercased first, so `Rust` and `rust` are the
/// same term. A token wrapped in double quotes is literal.
pub fn parse_query(raw: &str) -> ParsedQuery {
    let query = raw.trim().to_lowercase();
    let mut parsed = ParsedQuery::default();
    let mut seen = HashSet::new();

    for token in query.split_whitespace() {
        let (group, rest) = if let Some(rest) = token.strip_prefix('+') {
            (Group::And, rest)
        } else if let Some(rest) = token.strip_prefix('-') {
            (Group::Not, rest)
        } else {
            (Group::Or, token)
        };

        let (term, fuzzy) = match rest
            .strip_prefix('"')
            .and_then(|inner| inner.strip_suffix('"'))
        {
            Some(inner) => (inner, false),
            None => (rest, true),
        };

        if !is_query_term(term) || !seen.insert(term.to_string()) {
            continue;
        }

        let term = QueryTerm {
            term: term.to_string(),
            fuzzy,
        };
        match group {
            Group::And => parsed.and.push(term),
            Group::Or => parsed.or.push(term),
            Group::Not => parsed.not.push(term),
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn markers_select_groups() {
        let q = parse_query("rust +async -tokio");
        assert_eq!(q.or, vec![QueryTerm::fuzzy("rust")]);
        assert_eq!(q.and, vec![QueryTerm::fuzzy("async")]);
        assert_eq!(q.not, vec![QueryTerm::fuzzy("tokio")]);
    }

    #[test]
    fn quotes_make_terms_literal() {
        let q = parse_query(r#""pin" +"box" -"arc""#);
        assert_eq!(q.or, vec![QueryTerm::literal("pin")]);
        assert_eq!(q.and, vec![QueryTerm::literal("box")]);
        assert_eq!(q.not, vec![QueryTerm::literal("arc")]);
    }

    #[test]
    fn non_alphabetic_tokens_are_dropped() {
        let q = parse_query(r#"foo + corge" - +"grault -"xyzzy +1234 -1234 x1"#);
        assert_eq!(q.or, vec![QueryTerm::fuzzy("foo")]);
        assert!(q.and.is_empty());
        assert!(q.not.is_empty());
    }

    #[test]
    fn first_occurrence_wins_across_groups() {
        let q = parse_query("bass +Bass -\"bass\" fish");
        assert_eq!(
            q.or,
            vec![QueryTerm::fuzzy("bass"), QueryTerm::fuzzy("fish")]
        );
        assert!(q.and.is_empty());
        assert!(q.not.is_empty());
    }

    #[test]
    fn query_is_lowercased_and_trimmed() {
        let q = parse_query("   +Rust\t\n");
        assert_eq!(q.and, vec![QueryTerm::fuzzy("rust")]);
    }

    #[test]
    fn empty_query_is_empty() {
        assert!(parse_query("").is_empty());
        assert!(parse_query("  12 ! +").is_empty());
    }

    #[test]
    fn lone_quote_is_not_a_term() {
        assert!(parse_query("\" \"\"").is_empty());
    }

    proptest! {
        #[test]
        fn no_term_appears_twice(raw in "([+-]?\"?[a-zA-Z]{1,4}\"? ?){0,12}") {
            let q = parse_query(&raw);
            let mut seen = HashSet::new();
            for t in q.terms() {
                prop_assert!(seen.insert(t.term.to_lowercase()));
                prop_assert!(t.term.bytes().all(|b| b.is_ascii_lowercase()));
            }
        }
    }
}

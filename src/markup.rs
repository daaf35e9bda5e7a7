//! Minimal HTML text-run scanner.
//!
//! Rendered content is rewritten in two places: hashtags are turned into
//! links at build time and search terms are wrapped in marker spans when a
//! page is opened from a search result. Both must only ever touch visible
//! text, never tag names, attributes, comments or character references.
//!
//! [`tokens`] splits an HTML string into [`Token`]s and [`rewrite_text`]
//! hands each text run to a callback, skipping runs nested inside a
//! configurable set of elements. [`rewrite_tags`] does the same for opening
//! tags, which [`with_classes`] and [`with_attribute`] decorate.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Elements whose text content is never visible prose.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "template", "textarea"];

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?s)<!--.*?-->|<![^>]*>",
        // A quoted attribute value may contain `>`.
        r#"|</?[A-Za-z](?:[^>"']|"[^"]*"|'[^']*')*>"#,
        r"|&(?:#[0-9]+|#[xX][0-9A-Fa-f]+|[A-Za-z][A-Za-z0-9]*);",
    ))
    .expect("token pattern must compile")
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("attribute pattern must compile")
});

/// A lexical piece of an HTML string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Opening tag, e.g. `<a href="/">`. Carries the lowercase tag name.
    Open(&'a str, String),
    /// Closing tag, e.g. `</a>`.
    Close(&'a str, String),
    /// Self-closing tags, comments, doctypes and character references.
    Other(&'a str),
    /// Plain text between any of the above.
    Text(&'a str),
}

impl Token<'_> {
    pub fn as_str(&self) -> &str {
        match self {
            Token::Open(raw, _) | Token::Close(raw, _) | Token::Other(raw) | Token::Text(raw) => {
                *raw
            }
        }
    }
}

fn tag_name(raw: &str) -> String {
    raw.trim_start_matches('<')
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase()
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Split `html` into tokens. Concatenating every token yields the input.
pub fn tokens(html: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    let mut last = 0;
    for m in TOKEN_RE.find_iter(html) {
        if m.start() > last {
            out.push(Token::Text(&html[last..m.start()]));
        }
        let raw = m.as_str();
        let token = if raw.starts_with("</") {
            Token::Close(raw, tag_name(raw))
        } else if raw.starts_with("<!") || raw.starts_with('&') {
            Token::Other(raw)
        } else {
            let name = tag_name(raw);
            if raw.ends_with("/>") || VOID_ELEMENTS.contains(&name.as_str()) {
                Token::Other(raw)
            } else {
                Token::Open(raw, name)
            }
        };
        out.push(token);
        last = m.end();
    }
    if last < html.len() {
        out.push(Token::Text(&html[last..]));
    }
    out
}

/// Rewrite the visible text runs of `html`.
///
/// `rewrite` is called for every text run that is not nested inside one of
/// `skip` (or [`RAW_TEXT_ELEMENTS`]). Returning `None` keeps the run as is.
pub fn rewrite_text<F>(html: &str, skip: &[&str], mut rewrite: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(html.len());
    let mut skipped_depth = 0usize;
    let is_skipped = |name: &str| skip.contains(&name) || RAW_TEXT_ELEMENTS.contains(&name);

    for token in tokens(html) {
        match &token {
            Token::Open(raw, name) => {
                if is_skipped(name.as_str()) {
                    skipped_depth += 1;
                }
                out.push_str(raw);
            }
            Token::Close(raw, name) => {
                if is_skipped(name.as_str()) {
                    skipped_depth = skipped_depth.saturating_sub(1);
                }
                out.push_str(raw);
            }
            Token::Other(raw) => out.push_str(raw),
            Token::Text(text) => {
                let replaced = if skipped_depth == 0 {
                    rewrite(*text)
                } else {
                    None
                };
                out.push_str(replaced.as_deref().unwrap_or(*text));
            }
        }
    }
    out
}

/// Rewrite the opening and void tags of `html`.
///
/// `rewrite` receives the raw tag and its lowercase name. Returning `None`
/// keeps the tag as is.
pub fn rewrite_tags<F>(html: &str, mut rewrite: F) -> String
where
    F: FnMut(&str, &str) -> Option<String>,
{
    let mut out = String::with_capacity(html.len());
    for token in tokens(html) {
        let replaced = match &token {
            Token::Open(raw, name) => rewrite(*raw, name.as_str()),
            Token::Other(raw) if raw.starts_with('<') && !raw.starts_with("<!") => {
                rewrite(*raw, &tag_name(raw))
            }
            _ => None,
        };
        out.push_str(replaced.as_deref().unwrap_or(token.as_str()));
    }
    out
}

/// Byte range and value of attribute `name` in a raw tag.
fn find_attribute<'a>(tag: &'a str, name: &str) -> Option<(Range<usize>, &'a str)> {
    ATTR_RE.captures_iter(tag).find_map(|caps| {
        let whole = caps.get(0)?;
        if !caps[1].eq_ignore_ascii_case(name) {
            return None;
        }
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map_or("", |m| m.as_str());
        Some((whole.range(), value))
    })
}

/// Value of attribute `name` in a raw tag. Bare attributes have an empty value.
pub fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    find_attribute(tag, name).map(|(_, value)| value)
}

fn insert_attribute(tag: &str, attribute: &str) -> String {
    let body = tag.strip_suffix('>').unwrap_or(tag);
    match body.strip_suffix('/') {
        Some(body) => format!("{}{attribute} />", body.trim_end()),
        None => format!("{body}{attribute}>"),
    }
}

/// Set `name="value"` on a raw tag unless the attribute is already there.
pub fn with_attribute(tag: &str, name: &str, value: &str) -> String {
    if attribute(tag, name).is_some() {
        return tag.to_string();
    }
    insert_attribute(tag, &format!(r#" {name}="{value}""#))
}

/// Add `classes` to a raw tag, merging with an existing `class` attribute.
pub fn with_classes(tag: &str, classes: &[&str]) -> String {
    if classes.is_empty() {
        return tag.to_string();
    }
    match find_attribute(tag, "class") {
        Some((range, current)) => {
            let mut merged: Vec<&str> = current.split_whitespace().collect();
            for class in classes {
                if !merged.contains(class) {
                    merged.push(class);
                }
            }
            format!(
                r#"{} class="{}"{}"#,
                &tag[..range.start],
                merged.join(" "),
                &tag[range.end..]
            )
        }
        None => insert_attribute(tag, &format!(r#" class="{}""#, classes.join(" "))),
    }
}

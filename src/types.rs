//! Shared types used across the build pipeline and the search core.
//!
//! The reference types are serialized into `search.json` and must stay
//! readable by every previously generated site's search page.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two kinds of searchable content.
///
/// Ordering matters: results with equal counts list blog entries before pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentClass {
    Blog,
    Page,
}

impl ContentClass {
    pub const ALL: [ContentClass; 2] = [ContentClass::Blog, ContentClass::Page];
}

impl fmt::Display for ContentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentClass::Blog => write!(f, "blog"),
            ContentClass::Page => write!(f, "page"),
        }
    }
}

/// What a search result needs to render a blog entry hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogReference {
    pub title: String,
    pub url: String,
    /// Machine-readable datetime as written in the entry's `<time>` tag.
    pub date: String,
    /// Human-readable date text of the same tag.
    pub subtitle: String,
}

/// What a search result needs to render a page hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageReference {
    /// Ancestor index titles followed by the page's own title.
    pub titles: Vec<String>,
    pub url: String,
}

/// A content page, rendered and placed in the page tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub title: String,
    /// Ancestor titles plus `title`.
    pub titles: Vec<String>,
    /// Absolute URL, e.g. `/guides-install.html`.
    pub url: String,
    /// Source path relative to the content root, e.g. `pages/guides/install.md`.
    pub source: String,
    /// Rendered HTML body with hashtags linked and internal links rewritten.
    pub html: String,
    /// Hashtags in encounter order, duplicates included.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hashtags: Vec<String>,
    /// Stand-in for a folder without an index source.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub placeholder: bool,
}

impl Page {
    pub fn reference(&self) -> PageReference {
        PageReference {
            titles: self.titles.clone(),
            url: self.url.clone(),
        }
    }
}

/// A blog entry, rendered and dated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogEntry {
    pub title: String,
    /// Value of the `datetime` attribute, kept verbatim.
    pub datetime: String,
    /// Text content of the `<time>` element.
    pub date_text: String,
    /// `slugify("{datetime}-{title}")`, also used as list-page anchor.
    pub anchor: String,
    pub url: String,
    pub source: String,
    /// Shown on the entry page: from the second `h1` on, or the whole body.
    pub html: String,
    /// Shown on list pages: everything before the second `h1`, or the whole
    /// body.
    pub short_html: String,
    /// Whether the body was split, i.e. the list page links to more.
    pub has_more: bool,
    /// Hashtags in encounter order, duplicates included.
    pub hashtags: Vec<String>,
}

impl BlogEntry {
    pub fn reference(&self) -> BlogReference {
        BlogReference {
            title: self.title.clone(),
            url: self.url.clone(),
            date: self.datetime.clone(),
            subtitle: self.date_text.clone(),
        }
    }
}

/// Navigation tree item mirroring the `pages/` directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavItem {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavItem>,
}

/// A hashtag and the content it appears in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hashtag {
    pub name: String,
    /// Total occurrences across the site.
    pub count: u64,
    pub occurrences: Vec<HashtagOccurrence>,
}

/// One content item tagged with a hashtag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashtagOccurrence {
    pub title: String,
    pub url: String,
    pub count: u64,
}

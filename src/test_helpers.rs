//! Shared test utilities for the leafpress test suite.
//!
//! Provides lookup helpers, bulk extractors, and navigation tree assertions
//! that work with scan-phase data structures (`Site`, `Page`, `BlogEntry`).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let site = scan(tmp.path()).unwrap();
//!
//! let entry = find_entry(&site, "Hello World");
//! assert_eq!(entry.anchor, "2024-01-15-hello-world");
//!
//! assert_nav_shape(&site, &[
//!     ("Welcome", &[]),
//!     ("Guides", &["Install"]),
//! ]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::scan::Site;
use crate::types::{BlogEntry, Hashtag, Page};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Site lookups (panic with a clear message on miss)
// =========================================================================

/// Find a page by title. Panics if not found.
pub fn find_page<'a>(site: &'a Site, title: &str) -> &'a Page {
    site.pages
        .iter()
        .find(|p| p.title == title)
        .unwrap_or_else(|| panic!("page '{title}' not found. Available: {:?}", page_titles(site)))
}

/// Find a blog entry by title. Panics if not found.
pub fn find_entry<'a>(site: &'a Site, title: &str) -> &'a BlogEntry {
    site.blog_entries
        .iter()
        .find(|e| e.title == title)
        .unwrap_or_else(|| {
            panic!(
                "blog entry '{title}' not found. Available: {:?}",
                entry_titles(site)
            )
        })
}

/// Find a hashtag by name. Panics if not found.
pub fn find_hashtag<'a>(site: &'a Site, name: &str) -> &'a Hashtag {
    site.hashtags
        .iter()
        .find(|h| h.name == name)
        .unwrap_or_else(|| {
            let names: Vec<&str> = site.hashtags.iter().map(|h| h.name.as_str()).collect();
            panic!("hashtag '{name}' not found. Available: {names:?}")
        })
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// All page titles in navigation order.
pub fn page_titles(site: &Site) -> Vec<&str> {
    site.pages.iter().map(|p| p.title.as_str()).collect()
}

/// All blog entry titles, newest first.
pub fn entry_titles(site: &Site) -> Vec<&str> {
    site.blog_entries.iter().map(|e| e.title.as_str()).collect()
}

// =========================================================================
// Navigation helpers
// =========================================================================

/// Top-level navigation titles in order.
pub fn nav_titles(site: &Site) -> Vec<&str> {
    site.navigation.iter().map(|n| n.title.as_str()).collect()
}

/// Child titles under a given nav parent. Panics if parent not found.
pub fn nav_children_titles<'a>(site: &'a Site, parent_title: &str) -> Vec<&'a str> {
    site.navigation
        .iter()
        .find(|n| n.title == parent_title)
        .map(|n| n.children.iter().map(|c| c.title.as_str()).collect())
        .unwrap_or_else(|| {
            let titles = nav_titles(site);
            panic!("nav item '{parent_title}' not found. Available: {titles:?}")
        })
}

/// Assert that the full navigation tree matches an expected shape.
///
/// Each entry is `(title, children)`. Use `&[]` for leaf nodes.
pub fn assert_nav_shape(site: &Site, expected: &[(&str, &[&str])]) {
    let actual: Vec<&str> = nav_titles(site);
    let expected_titles: Vec<&str> = expected.iter().map(|(t, _)| *t).collect();
    assert_eq!(actual, expected_titles, "nav top-level titles mismatch");

    for (title, children) in expected {
        let actual_children = nav_children_titles(site, title);
        assert_eq!(
            actual_children,
            children.to_vec(),
            "nav children of '{title}' mismatch"
        );
    }
}

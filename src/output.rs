//! CLI output formatting for the build, check and search commands.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every entity (page, blog entry, search result) is its semantic
//! identity: positional index and title. Source files and URLs are shown as
//! secondary context via indented lines. This makes the output readable as a
//! content inventory while still letting users trace data back to specific
//! files.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Pages
//! 001 Welcome
//!     Source: pages/index.md
//! 002 Guides
//!     Source: pages/guides/index.md
//!     001 Install
//!         Source: pages/guides/install.md
//!
//! Blog
//! 001 Hello World
//!     Date: January 15th, 2024
//!     Source: blog/hello.md
//!
//! Hashtags
//!     #rust (3)
//!
//! Skipped
//!     pages/untitled.md: no h1 title
//!
//! Search index
//!     57 terms, 112 occurrences
//!     5 pages, 3 blog entries
//!
//! Config
//!     config.toml
//!     assets/
//! ```
//!
//! ## Build
//!
//! ```text
//! Blog
//! 001 Hello World → 2024-01-15-hello-world.html
//!     2 list pages → index.html, blog-2.html
//!
//! Pages
//! 001 Welcome → welcome.html
//! 002 Guides → guides.html
//!     001 Install → guides-install.html
//!
//! Hashtags
//!     #rust → hashtag-rust.html (1 page)
//!
//! Search
//!     search.html, search.json (57 terms)
//!
//! Generated 3 blog entries, 2 blog list pages, 6 pages, 2 hashtag pages, 2 assets
//! ```
//!
//! ## Search
//!
//! ```text
//! 001 Install (page, 1 match)
//!     Guides
//!     /guides-install.html?m=%5B%22ownership%22%5D
//!     Matched: ownership
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure, apart from checking which optional files exist.

use crate::generate::{GenerateReport, SEARCH_RUNTIME_PATH};
use crate::naming::{blog_index_path, hashtag_index_path};
use crate::pagination;
use crate::scan::Site;
use crate::search::ResultView;
use crate::types::{ContentClass, NavItem, Page};
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

/// Strip the leading slash of a site URL to show it as an output file.
fn file_of(url: &str) -> &str {
    url.trim_start_matches('/')
}

// ============================================================================
// Tree walker
// ============================================================================

/// A flattened node from walking the NavItem tree.
struct TreeNode<'a> {
    depth: usize,
    position: usize,
    title: &'a str,
    url: &'a str,
}

/// Walk the navigation tree, assigning positional indices per sibling level.
fn walk_nav_tree(nav: &[NavItem]) -> Vec<TreeNode<'_>> {
    let mut nodes = Vec::new();
    walk_nav_tree_recursive(nav, 0, &mut nodes);
    nodes
}

fn walk_nav_tree_recursive<'a>(items: &'a [NavItem], depth: usize, nodes: &mut Vec<TreeNode<'a>>) {
    for (i, item) in items.iter().enumerate() {
        nodes.push(TreeNode {
            depth,
            position: i + 1,
            title: &item.title,
            url: &item.url,
        });
        walk_nav_tree_recursive(&item.children, depth + 1, nodes);
    }
}

fn page_at<'a>(site: &'a Site, url: &str) -> Option<&'a Page> {
    site.pages.iter().find(|p| p.url == url)
}

// ============================================================================
// Check
// ============================================================================

/// Format the content inventory found by a scan.
pub fn format_check_output(site: &Site, source_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    if !site.navigation.is_empty() {
        lines.push("Pages".to_string());
        for node in walk_nav_tree(&site.navigation) {
            let base = indent(node.depth);
            let page = page_at(site, node.url);
            let marker = if page.is_some_and(|p| p.placeholder) {
                " (placeholder)"
            } else {
                ""
            };
            lines.push(format!(
                "{base}{} {}{marker}",
                format_index(node.position),
                node.title
            ));
            if let Some(page) = page.filter(|p| !p.placeholder) {
                lines.push(format!("{base}    Source: {}", page.source));
            }
        }
    }

    if !site.blog_entries.is_empty() {
        push_section(&mut lines, "Blog");
        for (i, entry) in site.blog_entries.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), entry.title));
            lines.push(format!("    Date: {}", entry.date_text));
            lines.push(format!("    Source: {}", entry.source));
        }
    }

    if !site.hashtags.is_empty() {
        push_section(&mut lines, "Hashtags");
        for hashtag in &site.hashtags {
            lines.push(format!("    #{} ({})", hashtag.name, hashtag.count));
        }
    }

    if !site.skipped.is_empty() {
        push_section(&mut lines, "Skipped");
        for skipped in &site.skipped {
            lines.push(format!("    {}: {}", skipped.source, skipped.reason));
        }
    }

    let index = &site.search_index;
    push_section(&mut lines, "Search index");
    lines.push(format!(
        "    {}, {}",
        plural(index.terms.len(), "term", "terms"),
        plural(index.total as usize, "occurrence", "occurrences")
    ));
    lines.push(format!(
        "    {}, {}",
        plural(index.reference_count(ContentClass::Page), "page", "pages"),
        plural(
            index.reference_count(ContentClass::Blog),
            "blog entry",
            "blog entries"
        )
    ));

    push_section(&mut lines, "Config");
    if source_root.join("config.toml").exists() {
        lines.push("    config.toml".to_string());
    }
    if source_root.join("assets").is_dir() {
        lines.push("    assets/".to_string());
    }
    for (source, target) in &site.config.assets.copy {
        lines.push(format!("    {source} \u{2192} assets/{target}"));
    }

    lines
}

fn push_section(lines: &mut Vec<String>, title: &str) {
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(title.to_string());
}

/// Print check output to stdout.
pub fn print_check_output(site: &Site, source_root: &Path) {
    for line in format_check_output(site, source_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

/// Format what a build wrote.
pub fn format_build_output(site: &Site, report: &GenerateReport) -> Vec<String> {
    let mut lines = Vec::new();

    push_section(&mut lines, "Blog");
    for (i, entry) in site.blog_entries.iter().enumerate() {
        lines.push(format!(
            "{} {} \u{2192} {}",
            format_index(i + 1),
            entry.title,
            file_of(&entry.url)
        ));
    }
    let list_files: Vec<String> = (0..report.blog_list_pages)
        .map(|page| blog_index_path("", page, None))
        .collect();
    lines.push(format!(
        "    {} \u{2192} {}",
        plural(report.blog_list_pages, "list page", "list pages"),
        list_files.join(", ")
    ));

    if !site.navigation.is_empty() {
        push_section(&mut lines, "Pages");
        for node in walk_nav_tree(&site.navigation) {
            lines.push(format!(
                "{}{} {} \u{2192} {}",
                indent(node.depth),
                format_index(node.position),
                node.title,
                file_of(node.url)
            ));
        }
    }

    if !site.hashtags.is_empty() {
        push_section(&mut lines, "Hashtags");
        let per_page = site.config.hashtags.occurrences_per_page;
        for hashtag in &site.hashtags {
            let pages = pagination::total_pages(hashtag.occurrences.len(), per_page).max(1);
            lines.push(format!(
                "    #{} \u{2192} {} ({})",
                hashtag.name,
                hashtag_index_path("", &hashtag.name, 0),
                plural(pages, "page", "pages")
            ));
        }
    }

    push_section(&mut lines, "Search");
    lines.push(format!(
        "    search.html, search.json ({})",
        plural(report.search_terms, "term", "terms")
    ));
    if !report.search_runtime {
        lines.push(format!(
            "    Inactive: {SEARCH_RUNTIME_PATH} missing (see [assets.copy])"
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated {}, {}, {}, {}, {}",
        plural(report.blog_entries, "blog entry", "blog entries"),
        plural(report.blog_list_pages, "blog list page", "blog list pages"),
        plural(report.pages, "page", "pages"),
        plural(report.hashtag_pages, "hashtag page", "hashtag pages"),
        plural(report.assets, "asset", "assets"),
    ));

    lines
}

/// Print build output to stdout.
pub fn print_build_output(site: &Site, report: &GenerateReport) {
    for line in format_build_output(site, report) {
        println!("{}", line);
    }
}

// ============================================================================
// Search
// ============================================================================

/// Format ranked search results.
pub fn format_search_results(results: &[ResultView]) -> Vec<String> {
    if results.is_empty() {
        return vec!["No results".to_string()];
    }
    let mut lines = Vec::new();
    for (i, view) in results.iter().enumerate() {
        lines.push(format!(
            "{} {} ({}, {})",
            format_index(i + 1),
            view.title,
            view.result.content_class,
            plural(view.result.count as usize, "match", "matches")
        ));
        if !view.subtitle.is_empty() {
            lines.push(format!("    {}", view.subtitle));
        }
        lines.push(format!("    {}", view.href()));
        lines.push(format!(
            "    Matched: {}",
            view.result.matched_original_terms.join(", ")
        ));
    }
    lines
}

/// Print search results to stdout.
pub fn print_search_results(results: &[ResultView]) {
    for line in format_search_results(results) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

//! HTML site generation.
//!
//! Final stage of the build. Takes a scanned [`Site`] and writes the static
//! site, every file flat in the output root.
//!
//! ## Generated Files
//!
//! ```text
//! docs/
//! ├── index.html                       # Blog list, first page
//! ├── blog-2.html                      # Further blog list pages
//! ├── blog-lazy-loading-1.json         # Same entries as JSON, one per list page
//! ├── 2024-01-15-hello-world.html      # One page per blog entry
//! ├── welcome.html                     # One page per content page
//! ├── guides-install.html
//! ├── hashtag-rust.html                # Paginated hashtag pages
//! ├── search.html                      # Search form and results
//! ├── search.json                      # Serialized search index
//! └── assets/
//!     ├── js/leafpress-search.js       # Search and highlight glue
//!     └── ...                          # Copied from <root>/assets and [assets.copy]
//! ```
//!
//! ## CSS and JavaScript
//!
//! Static assets are embedded at compile time:
//! - `static/style.css`: Base styles (colors injected from config)
//! - `static/leafpress-search.js`: Runs queries on `search.html` and marks
//!   terms on pages opened with `?m=`. It loads the WebAssembly build of the
//!   search core from `/assets/wasm/leafpress.js`, which is copied in with
//!   `[assets.copy]`.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping. Rendered
//! content bodies are inserted pre-escaped.

use crate::config;
use crate::naming::{blog_index_path, hashtag_index_path};
use crate::pagination;
use crate::scan::Site;
use crate::types::{BlogEntry, Hashtag, NavItem, Page};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("refusing to empty {output}: it contains the sources at {source_root}")]
    SourceInsideOutput {
        output: PathBuf,
        source_root: PathBuf,
    },
    #[error("asset {0} does not exist")]
    MissingAsset(PathBuf),
}

/// What was written, for the build summary.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    pub blog_entries: usize,
    pub blog_list_pages: usize,
    pub pages: usize,
    pub hashtag_pages: usize,
    pub assets: usize,
    pub search_terms: usize,
    /// Whether the WebAssembly search core is present in the output.
    pub search_runtime: bool,
}

const CSS_STATIC: &str = include_str!("../static/style.css");
const SEARCH_JS: &str = include_str!("../static/leafpress-search.js");
const SEARCH_JS_PATH: &str = "/assets/js/leafpress-search.js";
/// Where the search script imports the WebAssembly core from.
pub const SEARCH_RUNTIME_PATH: &str = "assets/wasm/leafpress.js";
const GENERATOR: &str = concat!("leafpress ", env!("LEAFPRESS_VERSION"));

pub fn generate(
    site: &Site,
    source_root: &Path,
    output_dir: &Path,
) -> Result<GenerateReport, GenerateError> {
    prepare_output(source_root, output_dir)?;

    let color_css = config::generate_color_css(&site.config.colors);
    let css = format!("{}\n\n{}", color_css, CSS_STATIC);
    let shell = Shell { site, css: &css };

    let mut report = GenerateReport {
        assets: copy_assets(site, source_root, output_dir)?,
        ..Default::default()
    };
    report.search_runtime = output_dir.join(SEARCH_RUNTIME_PATH).is_file();
    if !report.search_runtime {
        tracing::warn!(
            "{SEARCH_RUNTIME_PATH} is missing, search and term marking will not work; \
             build the core with `wasm-pack build --target web --features wasm` \
             and copy pkg/ with [assets.copy]"
        );
    }

    let js_dir = output_dir.join("assets/js");
    fs::create_dir_all(&js_dir)?;
    fs::write(js_dir.join("leafpress-search.js"), SEARCH_JS)?;

    report.blog_entries = write_blog_entries(&shell, output_dir)?;
    report.blog_list_pages = write_blog_lists(&shell, output_dir)?;
    report.pages = write_pages(&shell, output_dir)?;
    report.hashtag_pages = write_hashtag_pages(&shell, output_dir)?;

    fs::write(
        output_dir.join("search.html"),
        render_search_page(&shell).into_string(),
    )?;
    fs::write(
        output_dir.join("search.json"),
        site.search_index.to_json_pretty()?,
    )?;
    report.search_terms = site.search_index.terms.len();

    tracing::info!("site generated at {}", output_dir.display());
    Ok(report)
}

/// Empty `output_dir`, creating it when missing.
fn prepare_output(source_root: &Path, output_dir: &Path) -> Result<(), GenerateError> {
    if output_dir.exists() {
        let output = output_dir.canonicalize()?;
        let source = source_root.canonicalize()?;
        if source.starts_with(&output) {
            return Err(GenerateError::SourceInsideOutput {
                output,
                source_root: source,
            });
        }
        for entry in fs::read_dir(output_dir)? {
            let path = entry?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
    }
    fs::create_dir_all(output_dir)?;
    Ok(())
}

/// Copy `<root>/assets` and the `[assets.copy]` entries. Returns the number
/// of files copied.
fn copy_assets(site: &Site, source_root: &Path, output_dir: &Path) -> Result<usize, GenerateError> {
    let assets_out = output_dir.join("assets");
    let mut copied = 0;
    let assets_in = source_root.join("assets");
    if assets_in.is_dir() {
        copied += copy_tree(&assets_in, &assets_out)?;
    }
    for (source, target) in &site.config.assets.copy {
        let from = source_root.join(source);
        if !from.exists() {
            return Err(GenerateError::MissingAsset(from));
        }
        copied += copy_tree(&from, &assets_out.join(target))?;
    }
    Ok(copied)
}

/// Copy a file or a directory tree to `dst`.
fn copy_tree(src: &Path, dst: &Path) -> Result<usize, GenerateError> {
    if src.is_file() {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dst)?;
        return Ok(1);
    }
    let mut copied = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

fn write_blog_entries(shell: &Shell<'_>, output_dir: &Path) -> Result<usize, GenerateError> {
    let entries = &shell.site.blog_entries;
    let per_page = shell.site.config.blog.entries_per_page;
    entries
        .par_iter()
        .enumerate()
        .try_for_each(|(idx, entry)| {
            let newer = idx.checked_sub(1).and_then(|i| entries.get(i));
            let older = entries.get(idx + 1);
            let list = blog_index_path("/", idx / per_page, Some(&entry.anchor));
            let markup = render_blog_entry(shell, entry, newer, older, &list);
            fs::write(
                output_dir.join(format!("{}.html", entry.anchor)),
                markup.into_string(),
            )
        })?;
    Ok(entries.len())
}

fn write_blog_lists(shell: &Shell<'_>, output_dir: &Path) -> Result<usize, GenerateError> {
    let entries = &shell.site.blog_entries;
    let per_page = shell.site.config.blog.entries_per_page;
    let total_pages = pagination::total_pages(entries.len(), per_page);

    if total_pages == 0 {
        fs::write(
            output_dir.join(blog_index_path("", 0, None)),
            render_blog_list(shell, &[], 0, 0).into_string(),
        )?;
        return Ok(1);
    }

    for page in 0..total_pages {
        let Some((first, last)) = pagination::page_bounds(page, per_page, entries.len()) else {
            continue;
        };
        let slice = &entries[first..=last];
        fs::write(
            output_dir.join(blog_index_path("", page, None)),
            render_blog_list(shell, slice, page, total_pages).into_string(),
        )?;

        let chunk = LazyChunk {
            current_page: page + 1,
            entries_per_page: per_page,
            total_entries: entries.len(),
            total_pages,
            entries: slice.iter().map(LazyEntry::from).collect(),
        };
        fs::write(
            output_dir.join(format!("blog-lazy-loading-{}.json", page + 1)),
            serde_json::to_string(&chunk)?,
        )?;
    }
    Ok(total_pages)
}

fn write_pages(shell: &Shell<'_>, output_dir: &Path) -> Result<usize, GenerateError> {
    let pages = &shell.site.pages;
    pages.par_iter().enumerate().try_for_each(|(idx, page)| {
        let prev = idx.checked_sub(1).and_then(|i| pages.get(i));
        let next = pages.get(idx + 1);
        let markup = render_page(shell, page, prev, next);
        fs::write(
            output_dir.join(page.url.trim_start_matches('/')),
            markup.into_string(),
        )
    })?;
    Ok(pages.len())
}

fn write_hashtag_pages(shell: &Shell<'_>, output_dir: &Path) -> Result<usize, GenerateError> {
    let per_page = shell.site.config.hashtags.occurrences_per_page;
    let mut written = 0;
    for hashtag in &shell.site.hashtags {
        let total_pages = pagination::total_pages(hashtag.occurrences.len(), per_page).max(1);
        for page in 0..total_pages {
            let markup = render_hashtag_page(shell, hashtag, page, total_pages);
            fs::write(
                output_dir.join(hashtag_index_path("", &hashtag.name, page)),
                markup.into_string(),
            )?;
            written += 1;
        }
    }
    Ok(written)
}

/// One blog list page as JSON, for clients that load entries on scroll.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LazyChunk<'a> {
    current_page: usize,
    entries_per_page: usize,
    total_entries: usize,
    total_pages: usize,
    entries: Vec<LazyEntry<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LazyEntry<'a> {
    title: &'a str,
    url: &'a str,
    anchor: &'a str,
    datetime: &'a str,
    date_text: &'a str,
    html: &'a str,
    has_more: bool,
}

impl<'a> From<&'a BlogEntry> for LazyEntry<'a> {
    fn from(entry: &'a BlogEntry) -> Self {
        Self {
            title: &entry.title,
            url: &entry.url,
            anchor: &entry.anchor,
            datetime: &entry.datetime,
            date_text: &entry.date_text,
            html: &entry.short_html,
            has_more: entry.has_more,
        }
    }
}

// ============================================================================
// HTML Components
// ============================================================================

/// Everything every page shares.
struct Shell<'a> {
    site: &'a Site,
    css: &'a str,
}

impl Shell<'_> {
    /// Renders the full document around `content`.
    fn document(&self, title: &str, current_url: &str, content: Markup) -> Markup {
        let site = &self.site.config.site;
        let full_title = if title == site.title {
            title.to_string()
        } else {
            format!("{title} | {}", site.title)
        };
        html! {
            (DOCTYPE)
            html lang=(site.language) {
                head {
                    meta charset="UTF-8";
                    meta name="viewport" content="width=device-width, initial-scale=1.0";
                    meta name="generator" content=(GENERATOR);
                    title { (full_title) }
                    style { (PreEscaped(self.css)) }
                }
                body {
                    (self.header(current_url))
                    main.main {
                        (content)
                    }
                    (self.footer())
                    script type="module" src=(SEARCH_JS_PATH) {}
                }
            }
        }
    }

    fn header(&self, current_url: &str) -> Markup {
        html! {
            header.site-header {
                a.site-title href="/" { (self.site.config.site.title) }
                form.search-form action="/search.html" method="get" role="search" {
                    input type="search" name="q" placeholder="Search" aria-label="Search";
                }
                nav.site-nav {
                    (render_nav(&self.site.navigation, current_url))
                }
            }
        }
    }

    fn footer(&self) -> Markup {
        html! {
            @if !self.site.hashtags.is_empty() {
                footer.site-footer {
                    (render_hashtag_cloud(&self.site.hashtags))
                }
            }
        }
    }
}

/// Renders the navigation: the blog, then the page tree.
pub fn render_nav(items: &[NavItem], current_url: &str) -> Markup {
    let on_blog = current_url == "/index.html" || current_url.starts_with("/blog-");
    html! {
        ul {
            li class=[on_blog.then_some("current")] {
                a href="/index.html" { "Blog" }
            }
            @for item in items {
                (render_nav_item(item, current_url))
            }
        }
    }
}

fn nav_contains(item: &NavItem, url: &str) -> bool {
    item.url == url || item.children.iter().any(|child| nav_contains(child, url))
}

/// Renders a single navigation item (may have children)
fn render_nav_item(item: &NavItem, current_url: &str) -> Markup {
    let is_current = nav_contains(item, current_url);
    html! {
        li class=[is_current.then_some("current")] {
            a href=(item.url) { (item.title) }
            @if !item.children.is_empty() {
                ul {
                    @for child in &item.children {
                        (render_nav_item(child, current_url))
                    }
                }
            }
        }
    }
}

fn render_hashtag_cloud(hashtags: &[Hashtag]) -> Markup {
    html! {
        ul.hashtag-cloud {
            @for hashtag in hashtags {
                li {
                    a.hashtag href=(hashtag_index_path("/", &hashtag.name, 0)) {
                        "#" (hashtag.name)
                    }
                    " "
                    span.count { (hashtag.count) }
                }
            }
        }
    }
}

/// Page links around `current`; `href` maps a zero-based page to its URL.
fn render_pagination<F>(current: usize, total_pages: usize, size: usize, href: F) -> Markup
where
    F: Fn(usize) -> String,
{
    html! {
        @if total_pages > 1 {
            nav.pagination {
                @if current > 0 {
                    a.prev href=(href(current - 1)) rel="prev" { "‹" }
                }
                @for page in pagination::window(current, total_pages, size) {
                    @if page == current {
                        span.current aria-current="page" { (page + 1) }
                    } @else {
                        a href=(href(page)) { (page + 1) }
                    }
                }
                @if current + 1 < total_pages {
                    a.next href=(href(current + 1)) rel="next" { "›" }
                }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

fn render_blog_entry(
    shell: &Shell<'_>,
    entry: &BlogEntry,
    newer: Option<&BlogEntry>,
    older: Option<&BlogEntry>,
    list_url: &str,
) -> Markup {
    let content = html! {
        article.blog-entry {
            (PreEscaped(&entry.html))
        }
        nav.entry-nav {
            @if let Some(newer) = newer {
                a.prev href=(newer.url) rel="prev" { "‹ " (newer.title) }
            }
            a.up href=(list_url) { "All entries" }
            @if let Some(older) = older {
                a.next href=(older.url) rel="next" { (older.title) " ›" }
            }
        }
    };
    shell.document(&entry.title, &entry.url, content)
}

fn render_blog_list(
    shell: &Shell<'_>,
    entries: &[BlogEntry],
    page: usize,
    total_pages: usize,
) -> Markup {
    let window = shell.site.config.blog.pagination_window;
    let url = blog_index_path("/", page, None);
    let content = html! {
        @if entries.is_empty() {
            p.empty { "No entries yet." }
        }
        @for entry in entries {
            article.blog-entry id=(entry.anchor) {
                (PreEscaped(&entry.short_html))
                @if entry.has_more {
                    a.read-more href=(entry.url) { "Read more" }
                }
            }
        }
        (render_pagination(page, total_pages, window, |p| blog_index_path("/", p, None)))
    };
    shell.document(&shell.site.config.site.title, &url, content)
}

fn render_page(shell: &Shell<'_>, page: &Page, prev: Option<&Page>, next: Option<&Page>) -> Markup {
    let ancestors = &page.titles[..page.titles.len().saturating_sub(1)];
    let content = html! {
        @if !ancestors.is_empty() {
            p.breadcrumb { (ancestors.join(" › ")) }
        }
        article.page {
            (PreEscaped(&page.html))
        }
        nav.page-nav {
            @if let Some(prev) = prev {
                a.prev href=(prev.url) rel="prev" { "‹ " (prev.title) }
            }
            @if let Some(next) = next {
                a.next href=(next.url) rel="next" { (next.title) " ›" }
            }
        }
    };
    shell.document(&page.title, &page.url, content)
}

fn render_hashtag_page(
    shell: &Shell<'_>,
    hashtag: &Hashtag,
    page: usize,
    total_pages: usize,
) -> Markup {
    let config = &shell.site.config.hashtags;
    let url = hashtag_index_path("/", &hashtag.name, page);
    let occurrences =
        pagination::page_bounds(page, config.occurrences_per_page, hashtag.occurrences.len())
            .map_or(&[][..], |(first, last)| &hashtag.occurrences[first..=last]);
    let title = format!("#{}", hashtag.name);
    let content = html! {
        h1 { (title) }
        ul.occurrences {
            @for occurrence in occurrences {
                li {
                    a href=(occurrence.url) { (occurrence.title) }
                    " "
                    span.count { (occurrence.count) "×" }
                }
            }
        }
        (render_pagination(page, total_pages, config.pagination_window, |p| {
            hashtag_index_path("/", &hashtag.name, p)
        }))
    };
    shell.document(&title, &url, content)
}

fn render_search_page(shell: &Shell<'_>) -> Markup {
    let content = html! {
        h1 { "Search" }
        form.search-form action="/search.html" method="get" role="search" {
            input #search-input type="search" name="q" placeholder="Search" aria-label="Search";
            button type="submit" { "Search" }
        }
        p.search-help {
            "Prefix a word with " code { "+" } " to require it or with "
            code { "-" } " to exclude it. Quote a word to turn off fuzzy matching."
        }
        div #search-results {}
        noscript { p { "Search needs JavaScript." } }
    };
    shell.document("Search", "/search.html", content)
}

// ============================================================================
// Tests
// ============================================================================

//! Source scanning: content directory → [`Site`].
//!
//! Reads every page and blog entry, renders it, places it and folds the
//! result into the search index and the hashtag tally.
//!
//! ## Directory Structure
//!
//! ```text
//! src/                             # Content root
//! ├── config.toml                  # Site configuration (optional)
//! ├── assets/                      # Copied verbatim to <output>/assets
//! ├── pages/                       # Page tree, see crate::pages
//! │   ├── index.md
//! │   ├── about.md
//! │   └── guides/
//! │       ├── index.md
//! │       └── install.html
//! └── blog/                        # Blog entries, any layout
//!     ├── hello.md
//!     └── 2024/
//!         └── release.md
//! ```
//!
//! ## Requirements
//!
//! - Every source needs an `h1`; the first one is its title.
//! - Blog entries also need a `<time datetime="…">`. Accepted values are
//!   RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` and `YYYY-MM-DD`.
//!
//! Sources that miss either are skipped with a warning and reported in
//! [`Site::skipped`]; they never fail the build.
//!
//! ## Order
//!
//! Sources are read in file name order. Blog entries are listed newest
//! first; entries with equal dates keep file name order. The search index
//! receives pages (in navigation order) and then blog entries (in file name
//! order), so an unchanged source tree always produces the same index.

use crate::config::{self, SiteConfig};
use crate::naming::slugify;
use crate::pages::{self, PageSource, PageTreeError};
use crate::render::{self, Rendered, SourceFormat};
use crate::search::{Index, IndexBuilder, IndexedItem, html_terms};
use crate::types::{BlogEntry, Hashtag, HashtagOccurrence, NavItem, Page};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Page tree error: {0}")]
    PageTree(#[from] PageTreeError),
    #[error("{first} and {second} would both be written to {url}")]
    DuplicateUrl {
        url: String,
        first: String,
        second: String,
    },
}

/// Everything the generator needs, in display order.
#[derive(Debug)]
pub struct Site {
    pub config: SiteConfig,
    /// Pages in navigation order.
    pub pages: Vec<Page>,
    pub navigation: Vec<NavItem>,
    /// Newest first.
    pub blog_entries: Vec<BlogEntry>,
    /// Most used first, ties by name.
    pub hashtags: Vec<Hashtag>,
    pub search_index: Index,
    pub skipped: Vec<Skipped>,
}

/// A source that was left out of the site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub source: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingTitle,
    MissingDatetime,
    InvalidDatetime(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingTitle => write!(f, "no h1 title"),
            SkipReason::MissingDatetime => write!(f, "no <time datetime> element"),
            SkipReason::InvalidDatetime(value) => write!(f, "unreadable datetime {value:?}"),
        }
    }
}

/// A rendered source file.
struct Document {
    /// Path relative to the content root, `/`-separated.
    source: String,
    path: PathBuf,
    rendered: Rendered,
}

/// Load `<root>/config.toml` and scan the sources below `root`.
pub fn scan(root: &Path) -> Result<Site, ScanError> {
    let config = config::load_config(root)?;
    scan_with_config(root, config)
}

/// Scan the sources below `root` with an already loaded config.
pub fn scan_with_config(root: &Path, config: SiteConfig) -> Result<Site, ScanError> {
    let page_files = collect_sources(&root.join("pages"))?;
    let blog_files = collect_sources(&root.join("blog"))?;
    tracing::debug!(
        pages = page_files.len(),
        blog = blog_files.len(),
        "found sources"
    );

    let page_docs = render_all(root, page_files)?;
    let blog_docs = render_all(root, blog_files)?;

    let mut skipped = Vec::new();
    let page_sources = page_docs
        .into_iter()
        .filter_map(|doc| to_page_source(root, doc, &mut skipped))
        .collect::<Vec<_>>();
    let tree = pages::build_page_tree(page_sources)?;
    let mut pages = tree.pages;

    // Source order; sorted by date after indexing.
    let mut blog_entries: Vec<(NaiveDateTime, BlogEntry)> = blog_docs
        .into_iter()
        .filter_map(|doc| to_blog_entry(doc, &mut skipped))
        .collect();

    check_unique_urls(&pages, blog_entries.iter().map(|(_, entry)| entry))?;

    let links = link_targets(&pages, blog_entries.iter().map(|(_, entry)| entry));
    let resolve = |source: &str| links.get(source).cloned();
    for page in &mut pages {
        page.html = render::rewrite_links(&page.html, resolve);
    }
    for (_, entry) in &mut blog_entries {
        entry.html = render::rewrite_links(&entry.html, resolve);
        entry.short_html = render::rewrite_links(&entry.short_html, resolve);
    }

    let items = indexed_items(&pages, blog_entries.iter().map(|(_, entry)| entry));
    let search_index = build_search_index(&items);
    let hashtags = tally_hashtags(&items);

    blog_entries.sort_by(|(a, _), (b, _)| b.cmp(a));
    let blog_entries = blog_entries.into_iter().map(|(_, entry)| entry).collect();

    Ok(Site {
        config,
        pages,
        navigation: tree.navigation,
        blog_entries,
        hashtags,
        search_index,
        skipped,
    })
}

/// Renderable files below `dir`, sorted by name. Hidden entries are ignored.
fn collect_sources(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && SourceFormat::from_path(entry.path()).is_some() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn relative_source(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Read and render files in parallel, keeping their order.
fn render_all(root: &Path, files: Vec<PathBuf>) -> Result<Vec<Document>, ScanError> {
    files
        .into_par_iter()
        .map(|path| {
            let content = fs::read_to_string(&path)?;
            let format = SourceFormat::from_path(&path).unwrap_or(SourceFormat::Html);
            Ok(Document {
                source: relative_source(root, &path),
                rendered: render::render_source(&content, format),
                path,
            })
        })
        .collect()
}

fn to_page_source(root: &Path, doc: Document, skipped: &mut Vec<Skipped>) -> Option<PageSource> {
    let Some(title) = doc.rendered.title else {
        tracing::warn!("{}: skipped, {}", doc.source, SkipReason::MissingTitle);
        skipped.push(Skipped {
            source: doc.source,
            reason: SkipReason::MissingTitle,
        });
        return None;
    };
    let pages_root = root.join("pages");
    let relative = doc.path.strip_prefix(&pages_root).unwrap_or(&doc.path);
    let dirs = relative
        .parent()
        .map(|parent| {
            parent
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    let stem = relative
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    Some(PageSource {
        dirs,
        stem,
        source: doc.source,
        title,
        html: doc.rendered.html,
        hashtags: doc.rendered.hashtags,
    })
}

/// Parse the datetime formats accepted in `<time datetime>`.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn to_blog_entry(doc: Document, skipped: &mut Vec<Skipped>) -> Option<(NaiveDateTime, BlogEntry)> {
    let mut skip = |source: String, reason: SkipReason| {
        tracing::warn!("{source}: skipped, {reason}");
        skipped.push(Skipped { source, reason });
        None
    };
    let Some(title) = doc.rendered.title else {
        return skip(doc.source, SkipReason::MissingTitle);
    };
    let Some(time) = doc.rendered.time else {
        return skip(doc.source, SkipReason::MissingDatetime);
    };
    let Some(date) = parse_datetime(&time.machine) else {
        return skip(doc.source, SkipReason::InvalidDatetime(time.machine));
    };

    let anchor = slugify(&format!("{}-{}", time.machine, title));
    let body = doc.rendered.html;
    let (short_html, html, has_more) = match render::split_at_second_h1(&body) {
        Some((short, full)) => (short.to_string(), full.to_string(), true),
        None => (body.clone(), body.clone(), false),
    };
    Some((
        date,
        BlogEntry {
            url: format!("/{anchor}.html"),
            anchor,
            title,
            datetime: time.machine,
            date_text: time.human,
            source: doc.source,
            html,
            short_html,
            has_more,
            hashtags: doc.rendered.hashtags,
        },
    ))
}

fn check_unique_urls<'a>(
    pages: &[Page],
    entries: impl Iterator<Item = &'a BlogEntry>,
) -> Result<(), ScanError> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    let targets = pages
        .iter()
        .map(|p| (p.url.as_str(), p.source.as_str()))
        .chain(entries.map(|e| (e.url.as_str(), e.source.as_str())));
    for (url, source) in targets {
        if let Some(first) = seen.insert(url, source) {
            return Err(ScanError::DuplicateUrl {
                url: url.to_string(),
                first: first.to_string(),
                second: source.to_string(),
            });
        }
    }
    Ok(())
}

/// Source path → generated URL, for link rewriting.
///
/// Folder indexes are also reachable by the folder path, with or without a
/// trailing slash.
fn link_targets<'a>(
    pages: &[Page],
    entries: impl Iterator<Item = &'a BlogEntry>,
) -> HashMap<String, String> {
    let mut links = HashMap::new();
    for page in pages {
        links.insert(page.source.clone(), page.url.clone());
        let folder = page
            .source
            .strip_suffix('/')
            .or_else(|| {
                let (dir, file) = page.source.rsplit_once('/')?;
                file.starts_with("index.").then_some(dir)
            })
            .filter(|dir| *dir != "pages");
        if let Some(folder) = folder {
            links.insert(folder.to_string(), page.url.clone());
            links.insert(format!("{folder}/"), page.url.clone());
        }
    }
    for entry in entries {
        links.insert(entry.source.clone(), entry.url.clone());
    }
    links
}

/// Indexable items with their visible HTML: real pages, then blog entries.
fn indexed_items<'a>(
    pages: &[Page],
    entries: impl Iterator<Item = &'a BlogEntry>,
) -> Vec<(IndexedItem, Vec<String>, Vec<String>)> {
    let page_items = pages.iter().filter(|p| !p.placeholder).map(|page| {
        (
            IndexedItem::Page {
                key: page.source.clone(),
                reference: page.reference(),
            },
            page.html.clone(),
            page.hashtags.clone(),
        )
    });
    let blog_items = entries.map(|entry| {
        (
            IndexedItem::Blog {
                key: entry.source.clone(),
                reference: entry.reference(),
            },
            entry_body(entry),
            entry.hashtags.clone(),
        )
    });
    let items: Vec<(IndexedItem, String, Vec<String>)> = page_items.chain(blog_items).collect();
    items
        .into_par_iter()
        .map(|(item, html, hashtags)| (item, html_terms(&html), hashtags))
        .collect()
}

/// The whole entry, both halves of a split body.
fn entry_body(entry: &BlogEntry) -> String {
    if entry.has_more {
        format!("{}{}", entry.short_html, entry.html)
    } else {
        entry.html.clone()
    }
}

fn build_search_index(items: &[(IndexedItem, Vec<String>, Vec<String>)]) -> Index {
    items
        .iter()
        .fold(IndexBuilder::new(), |builder, (item, terms, _)| {
            builder.add(item, terms.iter().map(String::as_str))
        })
        .finish()
}

/// Count hashtags the way terms are counted and sort the result for display.
fn tally_hashtags(items: &[(IndexedItem, Vec<String>, Vec<String>)]) -> Vec<Hashtag> {
    let tally = items
        .iter()
        .fold(IndexBuilder::new(), |builder, (item, _, hashtags)| {
            builder.add(item, hashtags.iter().map(String::as_str))
        })
        .finish();

    let mut hashtags: Vec<Hashtag> = tally
        .terms
        .iter()
        .map(|(name, entry)| {
            let blog = entry.blog.iter().filter_map(|(&r, &count)| {
                let reference = tally.blog_entries.get(r)?;
                Some(HashtagOccurrence {
                    title: reference.title.clone(),
                    url: reference.url.clone(),
                    count,
                })
            });
            let page = entry.page.iter().filter_map(|(&r, &count)| {
                let reference = tally.pages.get(r)?;
                Some(HashtagOccurrence {
                    title: reference.titles.last()?.clone(),
                    url: reference.url.clone(),
                    count,
                })
            });
            let mut occurrences: Vec<HashtagOccurrence> = blog.chain(page).collect();
            occurrences.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.title.cmp(&b.title)));
            Hashtag {
                name: name.clone(),
                count: entry.count,
                occurrences,
            }
        })
        .collect();
    hashtags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    hashtags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use crate::types::ContentClass;
    use tempfile::TempDir;

    #[test]
    fn scan_reads_pages_and_blog() {
        let tmp = setup_fixtures();
        let site = scan(tmp.path()).unwrap();
        assert_eq!(
            page_titles(&site),
            vec!["Welcome", "About", "Guides", "Install", "Index missing in /notes", "Scratch"]
        );
        assert_eq!(
            entry_titles(&site),
            vec!["Second Post", "Hello World", "Old News"]
        );
    }

    #[test]
    fn navigation_mirrors_page_folders() {
        let tmp = setup_fixtures();
        let site = scan(tmp.path()).unwrap();
        assert_nav_shape(
            &site,
            &[
                ("Welcome", &[]),
                ("About", &[]),
                ("Guides", &["Install"]),
                ("Index missing in /notes", &["Scratch"]),
            ],
        );
        assert_eq!(find_page(&site, "Install").url, "/guides-install.html");
    }

    #[test]
    fn untitled_and_undated_sources_are_skipped() {
        let tmp = setup_fixtures();
        let site = scan(tmp.path()).unwrap();
        assert_eq!(
            site.skipped,
            vec![
                Skipped {
                    source: "pages/untitled.md".to_string(),
                    reason: SkipReason::MissingTitle,
                },
                Skipped {
                    source: "blog/draft.md".to_string(),
                    reason: SkipReason::MissingDatetime,
                },
            ]
        );
    }

    #[test]
    fn blog_entry_urls_come_from_datetime_and_title() {
        let tmp = setup_fixtures();
        let site = scan(tmp.path()).unwrap();
        let entry = find_entry(&site, "Hello World");
        assert_eq!(entry.anchor, "2024-01-15-hello-world");
        assert_eq!(entry.url, "/2024-01-15-hello-world.html");
        assert_eq!(entry.date_text, "January 15th, 2024");
    }

    #[test]
    fn blog_entry_is_split_at_second_h1() {
        let tmp = setup_fixtures();
        let site = scan(tmp.path()).unwrap();
        let entry = find_entry(&site, "Hello World");
        assert!(entry.has_more);
        assert!(entry
            .short_html
            .contains(r#"<h1 class="headline headline--level1">Hello World</h1>"#));
        assert!(!entry.short_html.contains("Details"));
        assert!(entry
            .html
            .starts_with(r#"<h1 class="headline headline--level1">Details</h1>"#));

        let short = find_entry(&site, "Old News");
        assert!(!short.has_more);
        assert_eq!(short.html, short.short_html);
    }

    #[test]
    fn internal_links_point_at_generated_urls() {
        let tmp = setup_fixtures();
        let site = scan(tmp.path()).unwrap();
        let about = find_page(&site, "About");
        assert!(about.html.contains(r#"href="/guides-install.html""#));
        assert!(about.html.contains(r#"href="/2024-01-15-hello-world.html""#));
        assert!(about.html.contains(r#"href="/guides.html""#));
    }

    #[test]
    fn hashtags_are_tallied_and_sorted() {
        let tmp = setup_fixtures();
        let site = scan(tmp.path()).unwrap();
        let names: Vec<&str> = site.hashtags.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["rust", "news"]);
        let rust = find_hashtag(&site, "rust");
        assert_eq!(rust.count, 3);
        assert_eq!(rust.occurrences[0].title, "Hello World");
        assert_eq!(rust.occurrences[0].count, 2);
        assert_eq!(rust.occurrences[1].title, "About");
    }

    #[test]
    fn search_index_lists_pages_then_entries() {
        let tmp = setup_fixtures();
        let site = scan(tmp.path()).unwrap();
        let index = &site.search_index;
        assert_eq!(index.pages[0].titles, vec!["Welcome"]);
        // The placeholder is not indexed, the pages below it are.
        assert!(
            index
                .pages
                .iter()
                .all(|p| p.titles != vec!["Index missing in /notes".to_string()])
        );
        assert!(index.pages.iter().any(|p| {
            p.titles == vec!["Index missing in /notes".to_string(), "Scratch".to_string()]
        }));
        // File name order: blog/2023/old.md sorts before blog/hello.md.
        assert_eq!(index.blog_entries[0].title, "Old News");

        let results = index.search("ownership", &Default::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].result.content_class, ContentClass::Page);
        assert_eq!(results[0].title, "Install");
    }

    #[test]
    fn scanning_twice_gives_identical_index() {
        let tmp = setup_fixtures();
        let a = scan(tmp.path()).unwrap().search_index.to_json_pretty().unwrap();
        let b = scan(tmp.path()).unwrap().search_index.to_json_pretty().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_root_is_an_empty_site() {
        let tmp = TempDir::new().unwrap();
        let site = scan(tmp.path()).unwrap();
        assert!(site.pages.is_empty());
        assert!(site.blog_entries.is_empty());
        assert_eq!(site.search_index.total, 0);
    }

    #[test]
    fn duplicate_entry_urls_are_an_error() {
        let tmp = TempDir::new().unwrap();
        let blog = tmp.path().join("blog");
        fs::create_dir_all(&blog).unwrap();
        let body = "# Same\n\n<time datetime=\"2024-01-01\">x</time>\n";
        fs::write(blog.join("a.md"), body).unwrap();
        fs::write(blog.join("b.md"), body).unwrap();
        assert!(matches!(
            scan(tmp.path()),
            Err(ScanError::DuplicateUrl { .. })
        ));
    }

    #[test]
    fn parse_datetime_formats() {
        assert!(parse_datetime("2024-01-15").is_some());
        assert!(parse_datetime("2024-01-15T10:30").is_some());
        assert!(parse_datetime("2024-01-15T10:30:05").is_some());
        assert!(parse_datetime("2024-01-15T10:30:05+02:00").is_some());
        assert!(parse_datetime("yesterday").is_none());
        assert!(
            parse_datetime("2024-01-15T10:30").unwrap() > parse_datetime("2024-01-15").unwrap()
        );
    }
}

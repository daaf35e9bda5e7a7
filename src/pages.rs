//! Page tree: `pages/` directory → navigation and flat page list.
//!
//! ```text
//! pages/
//! ├── index.md          # "Home"        → /home.html
//! ├── about.md          # "About"       → /about.html
//! └── guides/
//!     ├── index.md      # "Guides"      → /guides.html
//!     └── install.md    # "Install"     → /guides-install.html
//! ```
//!
//! URLs are built from title slugs, not file names: a folder contributes the
//! slug of its index page's title, so renaming a folder's index title moves
//! every page below it. A folder without index gets a placeholder page that
//! tells the author to add one.
//!
//! Within a folder the index comes first, then files and folders by name.
//! That order is both the navigation order and the previous/next order.

use crate::naming::{page_join, slugify};
use crate::types::{NavItem, Page};
use maud::html;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageTreeError {
    #[error("pages/{path}: a page and a folder share this name")]
    NameClash { path: String },
    #[error("{source_path}: another source already defines this page")]
    DuplicateSource { source_path: String },
}

/// A titled, rendered page source.
#[derive(Debug, Clone)]
pub struct PageSource {
    /// Directories between `pages/` and the file.
    pub dirs: Vec<String>,
    /// File name without extension.
    pub stem: String,
    /// Path relative to the content root, e.g. `pages/guides/install.md`.
    pub source: String,
    pub title: String,
    pub html: String,
    pub hashtags: Vec<String>,
}

/// Pages in navigation order plus the nested navigation.
#[derive(Debug, Default)]
pub struct PageTree {
    pub pages: Vec<Page>,
    pub navigation: Vec<NavItem>,
}

#[derive(Default)]
struct Folder {
    index: Option<PageSource>,
    children: BTreeMap<String, Node>,
}

enum Node {
    File(PageSource),
    Folder(Folder),
}

impl Folder {
    fn insert(&mut self, source: PageSource) -> Result<(), PageTreeError> {
        let dirs = source.dirs.clone();
        let mut folder = self;
        for (depth, dir) in dirs.iter().enumerate() {
            let node = folder
                .children
                .entry(dir.clone())
                .or_insert_with(|| Node::Folder(Folder::default()));
            folder = match node {
                Node::Folder(inner) => inner,
                Node::File(_) => {
                    return Err(PageTreeError::NameClash {
                        path: dirs[..=depth].join("/"),
                    });
                }
            };
        }

        if source.stem == "index" {
            if folder.index.is_some() {
                return Err(PageTreeError::DuplicateSource {
                    source_path: source.source,
                });
            }
            folder.index = Some(source);
            return Ok(());
        }

        match folder.children.entry(source.stem.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(Node::File(source));
                Ok(())
            }
            Entry::Occupied(existing) => match existing.get() {
                Node::Folder(_) => Err(PageTreeError::NameClash {
                    path: dirs
                        .iter()
                        .chain(std::iter::once(&source.stem))
                        .cloned()
                        .collect::<Vec<_>>()
                        .join("/"),
                }),
                Node::File(_) => Err(PageTreeError::DuplicateSource {
                    source_path: source.source,
                }),
            },
        }
    }
}

/// Build the page tree from titled sources.
pub fn build_page_tree<I>(sources: I) -> Result<PageTree, PageTreeError>
where
    I: IntoIterator<Item = PageSource>,
{
    let mut root = Folder::default();
    for source in sources {
        root.insert(source)?;
    }

    let mut tree = PageTree::default();
    if let Some(index) = root.index {
        let page = to_page(index, &[], &[]);
        tree.navigation.push(NavItem {
            title: page.title.clone(),
            url: page.url.clone(),
            children: Vec::new(),
        });
        tree.pages.push(page);
    }
    let children = walk(root.children, &[], &[], &[], &mut tree.pages);
    tree.navigation.extend(children);
    Ok(tree)
}

fn extend(list: &[String], item: String) -> Vec<String> {
    let mut out = list.to_vec();
    out.push(item);
    out
}

/// Place a file below `prefixes`.
fn to_page(source: PageSource, prefixes: &[String], titles: &[String]) -> Page {
    let segments = extend(prefixes, slugify(&source.title));
    Page {
        titles: extend(titles, source.title.clone()),
        url: format!("/{}.html", page_join(&segments)),
        title: source.title,
        source: source.source,
        html: source.html,
        hashtags: source.hashtags,
        placeholder: false,
    }
}

fn placeholder(dirs: &[String]) -> PageSource {
    let path = dirs.join("/");
    let title = format!("Index missing in /{path}");
    let html = html! {
        h1 { (title) }
        p { "Please add an index.md or index.html file with at least one h1 headline." }
    }
    .into_string();
    PageSource {
        dirs: dirs.to_vec(),
        stem: "index".to_string(),
        source: format!("pages/{path}/"),
        title,
        html,
        hashtags: Vec::new(),
    }
}

fn walk(
    children: BTreeMap<String, Node>,
    prefixes: &[String],
    titles: &[String],
    dirs: &[String],
    pages: &mut Vec<Page>,
) -> Vec<NavItem> {
    let mut navigation = Vec::new();
    for (name, node) in children {
        match node {
            Node::File(source) => {
                let page = to_page(source, prefixes, titles);
                navigation.push(NavItem {
                    title: page.title.clone(),
                    url: page.url.clone(),
                    children: Vec::new(),
                });
                pages.push(page);
            }
            Node::Folder(folder) => {
                let dirs = extend(dirs, name);
                let (index, is_placeholder) = match folder.index {
                    Some(index) => (index, false),
                    None => (placeholder(&dirs), true),
                };
                let slug = if is_placeholder {
                    slugify(&format!("index-missing-{}", dirs.join("-")))
                } else {
                    slugify(&index.title)
                };
                let prefixes = extend(prefixes, slug);
                let titles = extend(titles, index.title.clone());

                // The index sits at the folder's own URL.
                let page = Page {
                    title: index.title,
                    titles: titles.clone(),
                    url: format!("/{}.html", page_join(&prefixes)),
                    source: index.source,
                    html: index.html,
                    hashtags: index.hashtags,
                    placeholder: is_placeholder,
                };
                let title = page.title.clone();
                let url = page.url.clone();
                pages.push(page);

                let children = walk(folder.children, &prefixes, &titles, &dirs, pages);
                navigation.push(NavItem {
                    title,
                    url,
                    children,
                });
            }
        }
    }
    navigation
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(path: &str, title: &str) -> PageSource {
        let mut parts: Vec<String> = path.split('/').map(str::to_string).collect();
        let file = parts.pop().unwrap();
        let stem = file.rsplit_once('.').map_or(file.as_str(), |(s, _)| s).to_string();
        PageSource {
            dirs: parts,
            stem,
            source: format!("pages/{path}"),
            title: title.to_string(),
            html: format!("<h1>{title}</h1>"),
            hashtags: Vec::new(),
        }
    }

    fn urls(tree: &PageTree) -> Vec<&str> {
        tree.pages.iter().map(|p| p.url.as_str()).collect()
    }

    #[test]
    fn index_first_then_by_name() {
        let tree = build_page_tree([
            source("about.md", "About"),
            source("guides/index.md", "Guides"),
            source("guides/install.md", "Install"),
            source("index.md", "Home"),
        ])
        .unwrap();
        assert_eq!(
            urls(&tree),
            vec![
                "/home.html",
                "/about.html",
                "/guides.html",
                "/guides-install.html"
            ]
        );
    }

    #[test]
    fn titles_chain_through_folder_indexes() {
        let tree = build_page_tree([
            source("guides/index.md", "Guides"),
            source("guides/rust/index.md", "Rust Things"),
            source("guides/rust/ownership.md", "Ownership"),
        ])
        .unwrap();
        let last = tree.pages.last().unwrap();
        assert_eq!(last.titles, vec!["Guides", "Rust Things", "Ownership"]);
        assert_eq!(last.url, "/guides-rust-things-ownership.html");
        assert_eq!(tree.pages[1].titles, vec!["Guides", "Rust Things"]);
        assert_eq!(tree.pages[1].url, "/guides-rust-things.html");
    }

    #[test]
    fn missing_folder_index_gets_placeholder() {
        let tree = build_page_tree([source("guides/install.md", "Install")]).unwrap();
        let index = &tree.pages[0];
        assert!(index.placeholder);
        assert_eq!(index.title, "Index missing in /guides");
        assert_eq!(index.url, "/index-missing-guides.html");
        assert!(index.html.contains("<h1>Index missing in /guides</h1>"));
        assert_eq!(
            tree.pages[1].url,
            "/index-missing-guides-install.html"
        );
    }

    #[test]
    fn navigation_nests_folders() {
        let tree = build_page_tree([
            source("index.md", "Home"),
            source("guides/index.md", "Guides"),
            source("guides/install.md", "Install"),
        ])
        .unwrap();
        assert_eq!(tree.navigation.len(), 2);
        assert_eq!(tree.navigation[0].title, "Home");
        assert!(tree.navigation[0].children.is_empty());
        assert_eq!(tree.navigation[1].url, "/guides.html");
        assert_eq!(tree.navigation[1].children[0].title, "Install");
    }

    #[test]
    fn file_and_folder_with_same_name_clash() {
        let err = build_page_tree([
            source("guides.md", "Guides"),
            source("guides/install.md", "Install"),
        ])
        .unwrap_err();
        assert!(matches!(err, PageTreeError::NameClash { ref path } if path == "guides"));

        let err = build_page_tree([
            source("guides/install.md", "Install"),
            source("guides.md", "Guides"),
        ])
        .unwrap_err();
        assert!(matches!(err, PageTreeError::NameClash { .. }));
    }

    #[test]
    fn two_sources_for_one_page_clash() {
        let err = build_page_tree([source("about.md", "About"), source("about.html", "About")])
            .unwrap_err();
        assert!(matches!(err, PageTreeError::DuplicateSource { .. }));
    }

    #[test]
    fn empty_tree_is_empty() {
        let tree = build_page_tree(Vec::new()).unwrap();
        assert!(tree.pages.is_empty());
        assert!(tree.navigation.is_empty());
    }
}

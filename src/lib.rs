//! # Leafpress
//!
//! A small static site generator for a blog, a tree of pages and a search
//! that runs entirely in the visitor's browser. Your filesystem is the data
//! source: `pages/` becomes the navigation, `blog/` becomes the blog, and
//! every `#hashtag` in the text gets its own page.
//!
//! # Architecture: Scan, Then Generate
//!
//! ```text
//! 1. Scan      src/   →  Site          (render, place, index)
//! 2. Generate  Site   →  docs/         (HTML, JSON, assets)
//! ```
//!
//! Scanning renders every source, works out its URL from its title, rewrites
//! internal links and folds the visible text into the search index. Generating
//! only lays out what the scan produced, so the scan is where all content
//! rules live and where most tests run.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks the sources, renders and places them, builds the search index and hashtag tally |
//! | [`generate`] | Renders the final HTML site from a [`scan::Site`] using Maud |
//! | [`search`] | Tokenizer, index builder, query parser and evaluator, highlighter |
//! | [`render`] | Markdown/HTML rendering, hashtag linking, title and date extraction |
//! | [`pages`] | Page tree: URLs, title chains, navigation |
//! | [`config`] | `config.toml` loading, validation, merging, and CSS generation |
//! | [`types`] | Shared types (`Page`, `BlogEntry`, `Hashtag`, search references) |
//! | [`naming`] | Slugs and output file names |
//! | [`pagination`] | Page counts and pagination windows |
//! | [`markup`] | Tag-aware text rewriting shared by hashtags and highlighting |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Flat Output, Title URLs
//!
//! Every generated file sits in the output root and is named after its title
//! (`guides-install.html`), not its source path. Moving a source file between
//! folders of the same name changes nothing for readers; renaming a title
//! does, and that is visible in the source.
//!
//! ## Search Without a Server
//!
//! The index is a plain JSON file. The search core compiles to WebAssembly
//! (feature `wasm`) and runs next to it in the browser, so the site stays a
//! directory of static files. The same code answers `leafpress search` on the
//! command line, which keeps ranking testable without a browser.
//!
//! ## Maud Templates
//!
//! Pages are built with [Maud](https://maud.lambda.xyz/) macros. Titles,
//! hashtags and navigation labels are escaped on interpolation; rendered
//! content bodies are the only pre-escaped input.

pub mod config;
pub mod generate;
pub mod markup;
pub mod naming;
pub mod output;
pub mod pages;
pub mod pagination;
pub mod render;
pub mod scan;
pub mod search;
pub mod types;
#[cfg(feature = "wasm")]
pub mod wasm;

#[cfg(test)]
pub(crate) mod test_helpers;

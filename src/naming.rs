//! URL naming shared by every generated file.
//!
//! All output files live flat in the output root. Their names are derived from
//! titles, so the same title always produces the same URL:
//!
//! - Pages: `welcome.html`, nested pages join their ancestors with `-`
//!   (`guides-install.html`)
//! - Blog entries: `{datetime}-{title}` slug (`2024-03-01-hello-world.html`)
//! - Blog list: `index.html`, `blog-2.html`, `blog-3.html`, …
//! - Hashtags: `hashtag-rust.html`, `hashtag-rust-2.html`, …

/// Turn a title into a URL slug.
///
/// Lowercases, replaces every run of characters outside `[a-z0-9-]` with a
/// single dash, then collapses runs of dashes. Leading and trailing dashes are
/// kept so distinct titles stay distinct.
///
/// - `"Hello World"` → `"hello-world"`
/// - `"2024-03-01-What's new?"` → `"2024-03-01-what-s-new-"`
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            c
        } else {
            '-'
        };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug
}

/// Join page URL segments into a single flat file stem.
pub fn page_join<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("-")
}

/// Path of the blog list page with the given zero-based index.
///
/// `prefix` is `"/"` for links and a directory prefix for files on disk.
pub fn blog_index_path(prefix: &str, page: usize, anchor: Option<&str>) -> String {
    let name = if page > 0 {
        format!("blog-{}", page + 1)
    } else {
        "index".to_string()
    };
    match anchor {
        Some(anchor) => format!("{prefix}{name}.html#{anchor}"),
        None => format!("{prefix}{name}.html"),
    }
}

/// Path of the hashtag list page with the given zero-based index.
pub fn hashtag_index_path(prefix: &str, hashtag: &str, page: usize) -> String {
    let suffix = if page > 0 {
        format!("-{}", page + 1)
    } else {
        String::new()
    };
    format!("{prefix}hashtag-{}{suffix}.html", slugify(hashtag))
}

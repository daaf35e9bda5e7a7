//! Source rendering: Markdown or HTML in, linked HTML and metadata out.
//!
//! ```text
//! source ──markdown_to_html──▶ html ──link_hashtags──▶ html + hashtags
//!                                           │
//!                               extract_title / extract_time
//!                                           │
//!               highlight_code ─▶ replace_emojis ─▶ add_content_classes
//! ```
//!
//! Markdown sources may not embed raw HTML: it is escaped and shows up as
//! text, except for `<time datetime="…">` which dates blog entries. Markdown
//! links open in a new tab. HTML sources are trusted and used verbatim up to
//! the decoration passes, which apply to both formats:
//!
//! - `<code class="language-…">` blocks are highlighted with `hljs-` scope
//!   classes.
//! - `:shortcode:` emojis become GitHub emoji images.
//! - Content elements get block classes (`paragraph`, `headline
//!   headline--level2`, `list list--ordered`, `link link--hashtag`, …) that
//!   the stylesheet targets.

use crate::markup::{self, Token};
use crate::naming;
use maud::html;
use pulldown_cmark::{CowStr, Event, Options, Parser, html as md_html};
use regex::{Captures, Regex};
use scraper::{Html, Selector};
use std::path::Path;
use std::sync::LazyLock;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

/// Elements whose text never turns into hashtag links.
const NO_LINK_ELEMENTS: &[&str] = &["a", "code", "pre"];

static HASHTAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^\w#&/])#([A-Za-z][A-Za-z0-9_-]*)").expect("hashtag pattern must compile")
});

static DATETIME_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bdatetime\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("datetime attribute pattern must compile")
});

static INTERNAL_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"href="(/(?:pages|blog)/[^"#?]*)([^"]*)""##).expect("href pattern must compile")
});

static CODE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(<code\b[^>]*?\bclass="[^"]*?\blanguage-([A-Za-z0-9_+#-]+)[^"]*"[^>]*>)"#,
        r"([^<]*)</code>",
    ))
    .expect("code block pattern must compile")
});

static EMOJI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([a-z0-9_+-]+):").expect("emoji pattern must compile"));

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

const EMOJI_IMAGE_URL: &str = "https://github.githubassets.com/images/icons/emoji/";

/// Prefix of the scope classes on highlighted code.
pub const HIGHLIGHT_CLASS_PREFIX: &str = "hljs-";

/// Source file format, from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Markdown,
    Html,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(SourceFormat::Markdown),
            "html" | "htm" => Some(SourceFormat::Html),
            _ => None,
        }
    }
}

/// Machine and human readable value of a `<time datetime>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeTag {
    pub machine: String,
    pub human: String,
}

/// A rendered source with the metadata pulled out of it.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub html: String,
    /// Text of the first `h1`.
    pub title: Option<String>,
    /// First `<time datetime>`.
    pub time: Option<TimeTag>,
    /// Lowercased hashtags in encounter order, duplicates included.
    pub hashtags: Vec<String>,
}

/// Render a source file's contents.
pub fn render_source(content: &str, format: SourceFormat) -> Rendered {
    let content = content.replace("\r\n", "\n");
    let html = match format {
        SourceFormat::Markdown => markdown_to_html(&content),
        SourceFormat::Html => content,
    };
    let (html, hashtags) = link_hashtags(&html);
    let fragment = Html::parse_fragment(&html);
    let title = extract_title(&fragment);
    let time = extract_time(&fragment);
    Rendered {
        html: add_content_classes(&replace_emojis(&highlight_code(&html))),
        title,
        time,
        hashtags,
    }
}

fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}

/// Convert Markdown to HTML, escaping embedded raw HTML other than `<time>`.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) => Event::Html(CowStr::from(sanitize_raw_html(&raw))),
        Event::InlineHtml(raw) => Event::InlineHtml(CowStr::from(sanitize_raw_html(&raw))),
        other => other,
    });
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    // Raw HTML is escaped above, so every anchor here is a Markdown link.
    markup::rewrite_tags(&out, |tag, name| {
        (name == "a").then(|| {
            let tag = markup::with_attribute(tag, "target", "_blank");
            markup::with_attribute(&tag, "rel", "noopener")
        })
    })
}

/// Escape raw HTML so it reads as text, keeping only `<time datetime>` tags.
fn sanitize_raw_html(raw: &str) -> String {
    markup::tokens(raw)
        .into_iter()
        .map(|token| match token {
            Token::Open(tag, name) if name == "time" => {
                match DATETIME_ATTR_RE.captures(tag) {
                    Some(caps) => {
                        let value = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
                        format!(r#"<time datetime="{}">"#, escape(value))
                    }
                    None => "<time>".to_string(),
                }
            }
            Token::Close(_, name) if name == "time" => "</time>".to_string(),
            Token::Other(entity) if entity.starts_with('&') => entity.to_string(),
            other => escape(other.as_str()),
        })
        .collect()
}

/// Turn `#word` in visible text into a link to the word's hashtag page.
///
/// Text inside links and code is left alone. Returns the new HTML and every
/// hashtag found, lowercased, in encounter order.
pub fn link_hashtags(html: &str) -> (String, Vec<String>) {
    let mut found = Vec::new();
    let linked = markup::rewrite_text(html, NO_LINK_ELEMENTS, |text| {
        if !HASHTAG_RE.is_match(text) {
            return None;
        }
        let replaced = HASHTAG_RE.replace_all(text, |caps: &Captures| {
            let tag = &caps[2];
            found.push(tag.to_lowercase());
            format!(
                r#"{}<a class="hashtag" href="{}">#{}</a>"#,
                &caps[1],
                naming::hashtag_index_path("/", tag, 0),
                tag
            )
        });
        Some(replaced.into_owned())
    });
    (linked, found)
}

/// Highlight `<code class="language-…">` blocks of a known language.
///
/// Blocks that already contain markup or name an unknown language are kept.
pub fn highlight_code(html: &str) -> String {
    CODE_BLOCK_RE
        .replace_all(html, |caps: &Captures| match highlight_snippet(&caps[2], &caps[3]) {
            Some(highlighted) => format!("{}{}</code>", &caps[1], highlighted),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn highlight_snippet(language: &str, escaped: &str) -> Option<String> {
    let syntax = SYNTAXES.find_syntax_by_token(language)?;
    let code: String = Html::parse_fragment(escaped).root_element().text().collect();
    let mut generator = ClassedHTMLGenerator::new_with_class_style(
        syntax,
        &SYNTAXES,
        ClassStyle::SpacedPrefixed {
            prefix: HIGHLIGHT_CLASS_PREFIX,
        },
    );
    for line in LinesWithEndings::from(&code) {
        if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
            tracing::debug!("leaving {language} block unhighlighted: {e}");
            return None;
        }
    }
    Some(generator.finalize())
}

/// Replace `:shortcode:` emojis in visible text with GitHub emoji images.
///
/// Unknown shortcodes and text inside code are left alone.
pub fn replace_emojis(html: &str) -> String {
    markup::rewrite_text(html, &["code", "pre"], |text| {
        if !EMOJI_RE.is_match(text) {
            return None;
        }
        let replaced = EMOJI_RE.replace_all(text, |caps: &Captures| {
            match emojis::get_by_shortcode(&caps[1]) {
                Some(emoji) => format!(
                    r#"<img class="image--emoji" src="{EMOJI_IMAGE_URL}{}.png" alt="{}">"#,
                    &caps[1],
                    emoji.as_str()
                ),
                None => caps[0].to_string(),
            }
        });
        Some(replaced.into_owned())
    })
}

/// Block classes for a content element, by tag name.
fn content_classes(name: &str) -> &'static [&'static str] {
    match name {
        "a" => &["link"],
        "b" | "strong" => &["bold"],
        "blockquote" => &["blockquote"],
        "code" => &["code"],
        "h1" => &["headline", "headline--level1"],
        "h2" => &["headline", "headline--level2"],
        "h3" => &["headline", "headline--level3"],
        "h4" => &["headline", "headline--level4"],
        "h5" => &["headline", "headline--level5"],
        "h6" => &["headline", "headline--level6"],
        "hr" => &["line"],
        "i" | "em" => &["italic"],
        "img" => &["image"],
        "li" => &["list__item"],
        "ol" => &["list", "list--ordered"],
        "p" => &["paragraph"],
        "pre" => &["preformatted"],
        "ul" => &["list", "list--unordered"],
        _ => &[],
    }
}

/// Add block classes to the content elements of `html`.
pub fn add_content_classes(html: &str) -> String {
    markup::rewrite_tags(html, |tag, name| {
        let classes = content_classes(name);
        if classes.is_empty() {
            return None;
        }
        let tagged = markup::with_classes(tag, classes);
        let is_hashtag = name == "a"
            && markup::attribute(tag, "href").is_some_and(|href| href.starts_with("/hashtag-"));
        Some(if is_hashtag {
            markup::with_classes(&tagged, &["link--hashtag"])
        } else {
            tagged
        })
    })
}

fn text_of(element: scraper::ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first `h1`, whitespace collapsed. `None` when missing or blank.
pub fn extract_title(fragment: &Html) -> Option<String> {
    let selector = Selector::parse("h1").expect("h1 selector must parse");
    let title = text_of(fragment.select(&selector).next()?);
    (!title.is_empty()).then_some(title)
}

/// The first `<time datetime>` element.
pub fn extract_time(fragment: &Html) -> Option<TimeTag> {
    let selector = Selector::parse("time[datetime]").expect("time selector must parse");
    let element = fragment.select(&selector).next()?;
    let machine = element.value().attr("datetime")?.trim().to_string();
    if machine.is_empty() {
        return None;
    }
    Some(TimeTag {
        machine,
        human: text_of(element),
    })
}

/// Split a body at its second `h1` into `(short, full)`.
///
/// Returns `None` when there are fewer than two `h1` elements.
pub fn split_at_second_h1(html: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    let mut seen = 0;
    for token in markup::tokens(html) {
        if matches!(&token, Token::Open(_, name) if name == "h1") {
            seen += 1;
            if seen == 2 {
                return Some(html.split_at(offset));
            }
        }
        offset += token.as_str().len();
    }
    None
}

/// Rewrite `href="/pages/…"` and `href="/blog/…"` source links.
///
/// `resolve` receives the source path without the leading slash
/// (`pages/guides/install.md`) and returns the generated URL. Unresolved
/// links are kept.
pub fn rewrite_links<F>(html: &str, resolve: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    INTERNAL_HREF_RE
        .replace_all(html, |caps: &Captures| {
            let source = caps[1].trim_start_matches('/');
            match resolve(source) {
                Some(url) => format!(r#"href="{url}{}""#, &caps[2]),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

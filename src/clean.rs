//! Text normalization applied to prose before segmentation.
//!
//! Extracted text is noisy in predictable ways: HTML entities survive tag
//! stripping, PDF extractors leave soft hyphens and non-breaking spaces, and
//! hard-wrapped lines put newlines in the middle of sentences. [`clean_text`]
//! fixes all of them and collapses whitespace to single spaces.
//!
//! Markdown is never cleaned this way: its line structure is its segmentation.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;
use scraper::Html;

static RE_TAG: OnceLock<Regex> = OnceLock::new();
static RE_MD_IMAGE: OnceLock<Regex> = OnceLock::new();

/// Elements whose text is never content.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that start a new run of text.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "li", "tr", "td", "th", "h1", "h2", "h3", "h4", "h5", "h6", "section",
    "article", "header", "footer", "aside", "blockquote", "pre", "title", "dt", "dd",
];

fn tag_re() -> &'static Regex {
    RE_TAG.get_or_init(|| Regex::new(r"<[^>]+>").expect("static pattern"))
}

fn md_image_re() -> &'static Regex {
    RE_MD_IMAGE.get_or_init(|| Regex::new(r"!\[[^\]]*\]\([^)]+\)").expect("static pattern"))
}

/// Normalize extracted prose.
///
/// Decodes HTML entities, drops soft hyphens, turns non-breaking spaces and
/// line breaks into spaces, and collapses whitespace runs.
///
/// ```rust
/// use ragprep::clean_text;
///
/// assert_eq!(clean_text("Fish &amp; chips,\nhy\u{ad}phen\u{a0}here  "), "Fish & chips, hyphen here");
/// ```
#[must_use]
pub fn clean_text(text: &str) -> String {
    let unescaped = unescape_entities(text);
    let without_soft_hyphens = unescaped.replace('\u{ad}', "");
    collapse_whitespace(&without_soft_hyphens.replace('\u{a0}', " "))
}

/// Collapse every whitespace run to one space and trim.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove anything that looks like an HTML tag.
///
/// Tags are removed without a replacement, so `a<br>b` becomes `ab`; run
/// [`clean_text`] afterwards to tidy the whitespace that remains.
#[must_use]
pub fn strip_html_tags(text: &str) -> Cow<'_, str> {
    tag_re().replace_all(text, "")
}

/// Reduce an HTML page to its text.
///
/// The page is parsed as HTML, so entities are decoded and `script`,
/// `style`, `noscript` and `template` bodies are dropped. Block elements
/// separate words; inline elements do not.
///
/// ```rust
/// use ragprep::html_to_text;
///
/// let html = "<style>p { color: red }</style><h1>Caf&eacute;</h1><p>Open <b>daily</b> &times; 2</p>";
/// assert_eq!(html_to_text(html), "Caf\u{e9} Open daily \u{d7} 2");
/// ```
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::new();

    for node in document.root_element().descendants() {
        if let Some(element) = node.value().as_element() {
            if BLOCK_ELEMENTS.contains(&element.name()) {
                text.push(' ');
            }
        } else if let Some(run) = node.value().as_text() {
            let skipped = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| SKIPPED_ELEMENTS.contains(&e.name()))
            });
            if !skipped {
                text.push_str(run);
            }
        }
    }

    collapse_whitespace(&text)
}

/// Remove markdown image embeds (`![alt](url)`).
#[must_use]
pub fn strip_markdown_images(text: &str) -> Cow<'_, str> {
    md_image_re().replace_all(text, "")
}

/// Re-clean stored chunk content: drop images and tags, collapse whitespace.
#[must_use]
pub fn clean_chunk_content(content: &str) -> String {
    let without_images = strip_markdown_images(content);
    collapse_whitespace(&strip_html_tags(&without_images))
}

/// Decode HTML character references: every HTML5 named entity, plus
/// decimal and hex numeric references.
///
/// Unknown names are left as written.
#[must_use]
pub fn unescape_entities(text: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(text)
}

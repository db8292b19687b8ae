//! HTML sanitization for job descriptions
//!
//! Descriptions arrive as arbitrary markup, often pasted from word processors.
//! [`sanitize_html`] rebuilds them from an allow-list of tags so downstream
//! consumers only ever see simple structural markup.

use crate::extract::normalize::collapse_whitespace;
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;

/// Elements removed together with everything inside them
const DROPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "iframe"];

/// Elements kept in sanitized output
pub const ALLOWED_ELEMENTS: &[&str] = &[
    "p", "br", "ul", "ol", "li", "b", "strong", "i", "em", "u", "a",
];

/// Elements removed when nothing but whitespace remains inside them
const PRUNED_WHEN_EMPTY: &[&str] = &["p", "li"];

/// Unwrapped elements whose content must not run into its neighbours
const BLOCK_ELEMENTS: &[&str] = &[
    "div", "section", "article", "header", "footer", "blockquote", "table", "tr", "td", "th",
    "h1", "h2", "h3", "h4", "h5", "h6", "dl", "dt", "dd", "pre", "address",
];

/// Elements that end a run of text in the plain rendition
const TEXT_BREAK_ELEMENTS: &[&str] = &["p", "br", "ul", "ol", "li"];

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Whitespace around paragraph, list and break tags carries no meaning
static STRUCTURAL_TAG_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(</?(?:p|ul|ol|li)>|<br>)\s*").unwrap());

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Sanitizes an HTML fragment
///
/// - `script`, `style`, `noscript` and `iframe` subtrees and comments are dropped
/// - only [`ALLOWED_ELEMENTS`] survive; anything else is unwrapped, keeping its children
/// - `href` on anchors is the only attribute kept
/// - `p`/`li` elements left empty are removed
/// - whitespace runs collapse to one space; whitespace next to `p`, `ul`, `ol`,
///   `li` and `br` tags disappears, while inline tags keep one separating space
///
/// # Examples
///
/// ```
/// use practicelink_scraper::extract::sanitize_html;
///
/// let html = r#"<div class="x"><p style="color:red">Hello <span>world</span></p><script>x()</script></div>"#;
/// assert_eq!(sanitize_html(html), "<p>Hello world</p>");
/// ```
pub fn sanitize_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    render_children(fragment.root_element(), &mut out);

    let collapsed = WHITESPACE_RUN.replace_all(&out, " ");
    STRUCTURAL_TAG_WHITESPACE
        .replace_all(&collapsed, "${1}")
        .trim()
        .to_string()
}

/// Derives the plain-text rendition of (sanitized) HTML
///
/// Text nodes are concatenated, with paragraph, list and line breaks
/// separating their neighbours, and all whitespace is collapsed.
///
/// # Examples
///
/// ```
/// use practicelink_scraper::extract::html_to_text;
///
/// let text = html_to_text("<p>Board   certified</p><ul><li>Call 1:4</li></ul>");
/// assert_eq!(text, "Board certified Call 1:4");
/// ```
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    collect_text(fragment.root_element(), &mut out);
    collapse_whitespace(&out)
}

fn render_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_escaped_text(out, text),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    render_element(child_element, out);
                }
            }
            _ => {}
        }
    }
}

fn render_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name().to_ascii_lowercase();
    let name = name.as_str();

    if DROPPED_ELEMENTS.contains(&name) {
        return;
    }

    if !ALLOWED_ELEMENTS.contains(&name) {
        let block = BLOCK_ELEMENTS.contains(&name);
        if block {
            out.push(' ');
        }
        render_children(element, out);
        if block {
            out.push(' ');
        }
        return;
    }

    if name == "br" {
        out.push_str("<br>");
        return;
    }

    let mut inner = String::new();
    render_children(element, &mut inner);

    if PRUNED_WHEN_EMPTY.contains(&name) && is_blank(&inner) {
        return;
    }

    out.push('<');
    out.push_str(name);
    if name == "a" {
        if let Some(href) = element.value().attr("href") {
            out.push_str(" href=\"");
            push_escaped_attr(out, href.trim());
            out.push('"');
        }
    }
    out.push('>');
    out.push_str(&inner);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// True when rendered markup has no text content
fn is_blank(markup: &str) -> bool {
    TAG.replace_all(markup, "").trim().is_empty()
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    let name = child_element.value().name();
                    if DROPPED_ELEMENTS.contains(&name) {
                        continue;
                    }
                    let breaks = TEXT_BREAK_ELEMENTS.contains(&name);
                    if breaks {
                        out.push(' ');
                    }
                    collect_text(child_element, out);
                    if breaks {
                        out.push(' ');
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_escaped_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn push_escaped_attr(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

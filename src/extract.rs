/// Readable text extraction from captured page HTML
///
/// Works on the serialized document sent back by the content script:
/// boilerplate subtrees are dropped, a semantic main container is preferred
/// over the whole body, and the result is flattened and whitespace-normalized.
use std::sync::LazyLock;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;

use crate::error::{Error, Result};

/// Subtrees that never contribute readable text
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "nav", "header", "footer", "aside", "iframe",
    "svg", "canvas", "form", "button", "select", "textarea", "head",
];

/// Elements rendered as paragraphs (blank line around them)
const PARAGRAPH_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "ul", "ol", "table", "figure",
];

/// Elements rendered on their own line
const LINE_TAGS: &[&str] = &[
    "div", "section", "article", "main", "li", "tr", "dd", "dt", "dl", "figcaption", "address",
    "details", "summary", "body", "hr",
];

static EXTRA_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
static EXTRA_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("valid regex"));
static INLINE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    /// Contents of `<title>`, if any
    pub title: Option<String>,
    pub text: String,
}

pub fn extract_page(html: &str) -> Result<ExtractedPage> {
    let dom = parse_document(RcDom::default(), Default::default()).one(html);

    let title = find_element(&dom.document, &|node: &Handle| tag_name(node) == Some("title"))
        .map(|node| {
            let mut raw = String::new();
            collect_raw_text(&node, &mut raw);
            INLINE_WHITESPACE.replace_all(raw.trim(), " ").into_owned()
        })
        .filter(|t| !t.is_empty());

    let container = content_root(&dom.document);
    let mut text = String::new();
    flatten(&container, &mut text, false);
    let text = normalize_text(&text);

    if text.is_empty() {
        return Err(Error::extraction("page has no readable text"));
    }

    log::debug!("Extracted {} chars of page text", text.len());
    Ok(ExtractedPage { title, text })
}

/// Collapse 3+ newlines to 2, runs of spaces to 1, and trim
pub fn normalize_text(text: &str) -> String {
    let text = EXTRA_NEWLINES.replace_all(text, "\n\n");
    let text = EXTRA_SPACES.replace_all(&text, " ");
    text.trim().to_string()
}

/// `main`, then `article`, then `[role=main]`, then `body`, then the document
fn content_root(document: &Handle) -> Handle {
    let candidates: [&dyn Fn(&Handle) -> bool; 4] = [
        &|n: &Handle| tag_name(n) == Some("main"),
        &|n: &Handle| tag_name(n) == Some("article"),
        &|n: &Handle| attribute(n, "role").as_deref() == Some("main"),
        &|n: &Handle| tag_name(n) == Some("body"),
    ];
    candidates
        .iter()
        .find_map(|matches| find_element(document, *matches))
        .unwrap_or_else(|| document.clone())
}

fn tag_name(node: &Handle) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(&*name.local),
        _ => None,
    }
}

fn attribute(node: &Handle, key: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == key)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

/// Depth-first search that does not descend into skipped subtrees
fn find_element(node: &Handle, matches: &dyn Fn(&Handle) -> bool) -> Option<Handle> {
    for child in node.children.borrow().iter() {
        let Some(tag) = tag_name(child) else {
            continue;
        };
        if matches(child) {
            return Some(child.clone());
        }
        if tag != "head" && SKIPPED_TAGS.contains(&tag) {
            continue;
        }
        if let Some(found) = find_element(child, matches) {
            return Some(found);
        }
    }
    None
}

fn collect_raw_text(node: &Handle, out: &mut String) {
    for child in node.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            NodeData::Element { .. } => collect_raw_text(child, out),
            _ => {}
        }
    }
}

/// Pad `out` so it ends with at least `count` newlines
fn ensure_breaks(out: &mut String, count: usize) {
    if out.is_empty() || count == 0 {
        return;
    }
    trim_line_end(out);
    let trailing = out.chars().rev().take_while(|c| *c == '\n').count();
    for _ in trailing..count {
        out.push('\n');
    }
}

fn trim_line_end(out: &mut String) {
    let len = out.trim_end_matches([' ', '\t']).len();
    out.truncate(len);
}

fn flatten(node: &Handle, out: &mut String, preformatted: bool) {
    for child in node.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => {
                let contents = contents.borrow();
                if preformatted {
                    out.push_str(&contents);
                } else {
                    let collapsed = INLINE_WHITESPACE.replace_all(&contents, " ");
                    if out.is_empty() || out.ends_with('\n') {
                        out.push_str(collapsed.trim_start());
                    } else {
                        out.push_str(&collapsed);
                    }
                }
            }
            NodeData::Element { .. } => {
                let tag = tag_name(child).unwrap_or_default();
                if SKIPPED_TAGS.contains(&tag) {
                    continue;
                }
                if tag == "br" {
                    trim_line_end(out);
                    out.push('\n');
                    continue;
                }
                let breaks = if PARAGRAPH_TAGS.contains(&tag) {
                    2
                } else if LINE_TAGS.contains(&tag) {
                    1
                } else {
                    0
                };
                ensure_breaks(out, breaks);
                match tag {
                    "td" | "th" => {
                        flatten(child, out, preformatted);
                        out.push('\t');
                    }
                    _ => flatten(child, out, preformatted || tag == "pre"),
                }
                ensure_breaks(out, breaks);
            }
            _ => {}
        }
    }
}

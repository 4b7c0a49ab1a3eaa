//! Markdown loading
//!
//! Builds a [`Document`] from Markdown with `pulldown-cmark` and estimates a
//! vertical layout so that scroll tracking has offsets to work with.

use crate::document::{Document, NodeId, HEADING_TAGS};
use pulldown_cmark::{Event, Options, Parser, Tag};

/// Text metrics used to estimate block heights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    /// Height of one line of body text
    pub line_height: f64,
    /// Characters that fit on one line
    pub chars_per_line: usize,
    /// Vertical gap after each block
    pub block_margin: f64,
    /// Heading lines are this much taller than body lines
    pub heading_scale: f64,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            line_height: 24.0,
            chars_per_line: 80,
            block_margin: 16.0,
            heading_scale: 1.5,
        }
    }
}

/// Parse Markdown into a document laid out with default metrics
pub fn parse(markdown: &str) -> Document {
    parse_with_layout(markdown, &LayoutMetrics::default())
}

/// Parse Markdown into a document laid out with `metrics`
pub fn parse_with_layout(markdown: &str, metrics: &LayoutMetrics) -> Document {
    let mut doc = Document::new();
    let mut stack: Vec<NodeId> = vec![doc.root()];

    let options = Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH;

    for event in Parser::new_ext(markdown, options) {
        let top = *stack.last().unwrap_or(&doc.root());
        match event {
            Event::Start(tag) => {
                let el = open_element(&mut doc, &tag);
                doc.append_child(top, el);
                stack.push(el);
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            Event::Text(text) | Event::InlineMath(text) | Event::DisplayMath(text) => {
                let node = doc.create_text(&text);
                doc.append_child(top, node);
            }
            Event::Code(code) => {
                let el = doc.create_element("code");
                let node = doc.create_text(&code);
                doc.append_child(el, node);
                doc.append_child(top, el);
            }
            Event::SoftBreak => {
                let node = doc.create_text(" ");
                doc.append_child(top, node);
            }
            Event::HardBreak => {
                let el = doc.create_element("br");
                doc.append_child(top, el);
            }
            Event::Rule => {
                let el = doc.create_element("hr");
                doc.append_child(top, el);
            }
            Event::FootnoteReference(label) => {
                let node = doc.create_text(&format!("[{}]", label));
                doc.append_child(top, node);
            }
            Event::Html(_) | Event::InlineHtml(_) | Event::TaskListMarker(_) => {}
        }
    }

    let root = doc.root();
    let height = measure(&mut doc, root, metrics);
    log::debug!(
        "Parsed markdown into {} nodes, estimated height {}px",
        doc.len(),
        height
    );
    doc
}

fn open_element(doc: &mut Document, tag: &Tag<'_>) -> NodeId {
    match tag {
        Tag::Heading { level, id, .. } => {
            let el = doc.create_element(HEADING_TAGS[(*level as usize).clamp(1, 6) - 1]);
            if let Some(id) = id {
                doc.set_attribute(el, "id", id);
            }
            el
        }
        Tag::Paragraph => doc.create_element("p"),
        Tag::BlockQuote(_) => doc.create_element("blockquote"),
        Tag::CodeBlock(_) => doc.create_element("pre"),
        Tag::List(Some(start)) => {
            let el = doc.create_element("ol");
            if *start != 1 {
                doc.set_attribute(el, "start", &start.to_string());
            }
            el
        }
        Tag::List(None) => doc.create_element("ul"),
        Tag::Item => doc.create_element("li"),
        Tag::Table(_) => doc.create_element("table"),
        Tag::TableHead => doc.create_element("thead"),
        Tag::TableRow => doc.create_element("tr"),
        Tag::TableCell => doc.create_element("td"),
        Tag::Emphasis => doc.create_element("em"),
        Tag::Strong => doc.create_element("strong"),
        Tag::Strikethrough => doc.create_element("del"),
        Tag::Link { dest_url, .. } => {
            let el = doc.create_element("a");
            doc.set_attribute(el, "href", dest_url);
            el
        }
        Tag::Image { dest_url, .. } => {
            let el = doc.create_element("img");
            doc.set_attribute(el, "src", dest_url);
            el
        }
        _ => doc.create_element("div"),
    }
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "blockquote" | "pre" | "ol" | "ul" | "li" | "table" | "thead" | "tr" | "hr" | "div"
    ) || HEADING_TAGS.contains(&tag)
}

/// Assign offsets to the block children of `node` and return its height
fn measure(doc: &mut Document, node: NodeId, metrics: &LayoutMetrics) -> f64 {
    let blocks: Vec<NodeId> = doc
        .children(node)
        .iter()
        .copied()
        .filter(|child| doc.tag_name(*child).is_some_and(is_block))
        .collect();

    if blocks.is_empty() {
        return leaf_height(doc, node, metrics);
    }

    let mut cursor = 0.0;
    for block in blocks {
        doc.set_offset_top(block, cursor);
        cursor += measure(doc, block, metrics) + metrics.block_margin;
    }
    cursor
}

fn leaf_height(doc: &Document, node: NodeId, metrics: &LayoutMetrics) -> f64 {
    let tag = doc.tag_name(node).unwrap_or_default();
    let text = doc.text_content(node);

    let lines = if tag == "pre" {
        text.lines().count().max(1)
    } else if tag == "hr" {
        1
    } else {
        text.chars().count().div_ceil(metrics.chars_per_line.max(1)).max(1)
    };

    let line_height = if HEADING_TAGS.contains(&tag) {
        metrics.line_height * metrics.heading_scale
    } else {
        metrics.line_height
    };

    lines as f64 * line_height
}

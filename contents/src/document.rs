//! Arena-backed element tree
//!
//! A [`Document`] owns every node in a flat `Vec`, and nodes refer to each other
//! through [`NodeId`] indices. Parent links are plain indices, so moving a subtree
//! never creates ownership cycles.

use itertools::Itertools;
use std::fmt;

/// Heading tag names in level order
pub const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Handle to a node in a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element payload
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Lower-case tag name
    pub tag: String,
    /// Attributes in insertion order
    pub attributes: Vec<(String, String)>,
    /// Vertical offset relative to the parent element, in pixels
    pub offset_top: f64,
}

/// What a node holds
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A structured document made of elements and text nodes
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with an empty `<body>` root
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        doc.root = doc.create_element("body");
        doc
    }

    /// The root element
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes ever allocated
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty (never true for a constructed document)
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` refers to a node of this document
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Allocate a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            offset_top: 0.0,
        }))
    }

    /// Allocate a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Node payload
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|n| &n.kind)
    }

    /// Element payload, if `id` is an element
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id)? {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.kind)? {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    /// Whether `id` is a live element
    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    /// Parent node, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    /// Child nodes in order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Attribute value
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set or replace an attribute; ignored for text nodes
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(el) = self.element_mut(id) else {
            return;
        };
        match el.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => el.attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// The `id` attribute, treating an empty value as absent
    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.attribute(id, "id").filter(|v| !v.is_empty())
    }

    /// Layout offset relative to the parent element
    pub fn offset_top(&self, id: NodeId) -> f64 {
        self.element(id).map_or(0.0, |el| el.offset_top)
    }

    /// Set the layout offset relative to the parent element
    pub fn set_offset_top(&mut self, id: NodeId, offset: f64) {
        if let Some(el) = self.element_mut(id) {
            el.offset_top = offset;
        }
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(NodeKind::Text(text)) = self.kind(id) {
            out.push_str(text);
        }
        for node in self.descendants(id) {
            if let Some(NodeKind::Text(text)) = self.kind(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// Remove `child` from its current parent, leaving it detached
    pub fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.parent(child) else {
            return;
        };
        self.nodes[parent.0].children.retain(|c| *c != child);
        self.nodes[child.0].parent = None;
    }

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Insert `child` before `reference` (or at the end when `None` or not a child)
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if !self.contains(parent) || !self.contains(child) || parent == child {
            return;
        }
        if self.is_ancestor(child, parent) {
            log::warn!("Refusing to move {} under its own descendant {}", child, parent);
            return;
        }
        self.detach(child);
        let siblings = &mut self.nodes[parent.0].children;
        let position = reference
            .and_then(|r| siblings.iter().position(|c| *c == r))
            .unwrap_or(siblings.len());
        siblings.insert(position, child);
        self.nodes[child.0].parent = Some(parent);
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Descendants of `id` in pre-order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// Elements under the root whose tag is in `tags`, in document order
    pub fn elements_by_tag(&self, tags: &[&str]) -> Vec<NodeId> {
        self.descendants(self.root)
            .filter(|node| {
                self.tag_name(*node)
                    .is_some_and(|tag| tags.iter().any(|t| t.eq_ignore_ascii_case(tag)))
            })
            .collect()
    }

    /// All heading elements (`h1`..`h6`) in document order
    pub fn headings(&self) -> Vec<NodeId> {
        self.elements_by_tag(&HEADING_TAGS)
    }

    /// First element under the root with the given `id` attribute
    pub fn find_by_id(&self, value: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .find(|node| self.element_id(*node) == Some(value))
    }

    /// Serialize a node and its subtree as HTML
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    /// Serialize only the children of a node
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_html(*child, &mut out);
        }
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => out.push_str(&escape_html(text)),
            Some(NodeKind::Element(el)) => {
                out.push('<');
                out.push_str(&el.tag);
                let attrs = el
                    .attributes
                    .iter()
                    .map(|(k, v)| format!(" {}=\"{}\"", k, escape_html(v)))
                    .join("");
                out.push_str(&attrs);
                out.push('>');
                for child in self.children(id) {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
                if is_block_tag(&el.tag) {
                    out.push('\n');
                }
            }
            None => {}
        }
    }
}

/// Pre-order iterator over a subtree
#[derive(Debug)]
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(node).iter().rev().copied());
        Some(node)
    }
}

fn is_block_tag(tag: &str) -> bool {
    matches!(
        tag,
        "body" | "ol" | "ul" | "li" | "p" | "pre" | "blockquote" | "nav" | "div" | "hr"
    ) || HEADING_TAGS.contains(&tag)
}

/// Escape special HTML characters
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let h1 = doc.create_element("H1");
        let text = doc.create_text("Intro");
        doc.append_child(h1, text);
        doc.append_child(doc.root(), h1);
        let p = doc.create_element("p");
        let body = doc.create_text("Body & more");
        doc.append_child(p, body);
        doc.append_child(doc.root(), p);
        (doc, h1, p)
    }

    #[test]
    fn test_tag_names_are_lowercased() {
        let (doc, h1, _) = sample();
        assert_eq!(doc.tag_name(h1), Some("h1"));
        assert_eq!(doc.headings(), vec![h1]);
    }

    #[test]
    fn test_text_content_concatenates_descendants() {
        let mut doc = Document::new();
        let h2 = doc.create_element("h2");
        let em = doc.create_element("em");
        let a = doc.create_text("Hello ");
        let b = doc.create_text("world");
        doc.append_child(h2, a);
        doc.append_child(em, b);
        doc.append_child(h2, em);
        assert_eq!(doc.text_content(h2), "Hello world");
    }

    #[test]
    fn test_append_moves_node_between_parents() {
        let (mut doc, h1, p) = sample();
        let text = doc.children(h1)[0];
        doc.append_child(p, text);
        assert!(doc.children(h1).is_empty());
        assert_eq!(doc.parent(text), Some(p));
        assert_eq!(doc.text_content(p), "Body & moreIntro");
    }

    #[test]
    fn test_insert_before_places_node_first() {
        let (mut doc, h1, _) = sample();
        let a = doc.create_element("a");
        doc.insert_before(h1, a, doc.children(h1).first().copied());
        assert_eq!(doc.children(h1)[0], a);
    }

    #[test]
    fn test_cannot_move_node_under_itself() {
        let (mut doc, h1, _) = sample();
        let root = doc.root();
        doc.append_child(h1, root);
        assert_eq!(doc.parent(root), None);
    }

    #[test]
    fn test_html_serialization_escapes_text() {
        let (mut doc, h1, p) = sample();
        doc.set_attribute(h1, "id", "intro");
        assert_eq!(doc.to_html(h1), "<h1 id=\"intro\">Intro</h1>\n");
        assert_eq!(doc.to_html(p), "<p>Body &amp; more</p>\n");
    }

    #[test]
    fn test_find_by_id_ignores_detached_nodes() {
        let (mut doc, h1, _) = sample();
        doc.set_attribute(h1, "id", "intro");
        let loose = doc.create_element("h2");
        doc.set_attribute(loose, "id", "loose");
        assert_eq!(doc.find_by_id("intro"), Some(h1));
        assert_eq!(doc.find_by_id("loose"), None);
    }
}

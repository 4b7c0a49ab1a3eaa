//! Ordered-list rendering of an outline

use crate::article::Article;
use crate::document::{Document, NodeId};
use crate::outline::Outline;
use std::fmt;

/// Custom link callback: receives the `<li>` guide and the article it represents
pub type LinkFn = Box<dyn FnMut(&mut Document, NodeId, &Article)>;

/// Hook invoked for every article while the list is rendered
///
/// It decides what goes inside each list item and how the source heading is
/// wired to it.
#[derive(Default)]
pub enum LinkHook {
    /// Wrap the heading content in a self-link and add a guide link to the item
    #[default]
    Anchor,
    /// Leave list items empty and the source document untouched
    Disabled,
    /// Caller-supplied behaviour
    Custom(LinkFn),
}

impl fmt::Debug for LinkHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anchor => write!(f, "Anchor"),
            Self::Disabled => write!(f, "Disabled"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl LinkHook {
    /// Wrap a closure as a custom hook
    pub fn custom<F>(f: F) -> Self
    where
        F: FnMut(&mut Document, NodeId, &Article) + 'static,
    {
        Self::Custom(Box::new(f))
    }

    fn apply(&mut self, doc: &mut Document, guide: NodeId, article: &Article) {
        match self {
            Self::Anchor => anchor_link(doc, guide, article),
            Self::Disabled => {}
            Self::Custom(f) => f(doc, guide, article),
        }
    }
}

/// Default link behaviour
///
/// Sets the source element id, moves the source element's children into an
/// `<a href="#id">` appended to it, and inserts a guide `<a href="#id">name</a>`
/// as the first child of the list item.
pub fn anchor_link(doc: &mut Document, guide: NodeId, article: &Article) {
    let href = format!("#{}", article.id);
    let source = article.element;

    doc.set_attribute(source, "id", &article.id);

    let article_link = doc.create_element("a");
    doc.set_attribute(article_link, "href", &href);
    let moved: Vec<NodeId> = doc.children(source).to_vec();
    for child in moved {
        doc.append_child(article_link, child);
    }
    doc.append_child(source, article_link);

    let guide_link = doc.create_element("a");
    let text = doc.create_text(&article.name);
    doc.append_child(guide_link, text);
    doc.set_attribute(guide_link, "href", &href);
    let first = doc.children(guide).first().copied();
    doc.insert_before(guide, guide_link, first);
}

/// Result of rendering an outline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedList {
    /// Root `<ol>` (detached; the caller decides where to insert it)
    pub list: NodeId,
    /// `<li>` elements in pre-order, aligned with the flat article list
    pub guides: Vec<NodeId>,
}

/// Generate an ordered list from an outline
pub fn render_list(doc: &mut Document, outline: &Outline, link: &mut LinkHook) -> RenderedList {
    let mut guides = Vec::with_capacity(outline.len());
    let list = render_level(doc, outline, outline.roots(), link, &mut guides);
    log::debug!("Rendered {} list items", guides.len());
    RenderedList { list, guides }
}

fn render_level(
    doc: &mut Document,
    outline: &Outline,
    indices: &[usize],
    link: &mut LinkHook,
    guides: &mut Vec<NodeId>,
) -> NodeId {
    let list = doc.create_element("ol");

    for &index in indices {
        let Some(article) = outline.article(index) else {
            continue;
        };
        let li = doc.create_element("li");
        guides.push(li);

        link.apply(doc, li, article);

        let descendants = outline.children(index);
        if !descendants.is_empty() {
            let nested = render_level(doc, outline, descendants, link, guides);
            doc.append_child(li, nested);
        }

        doc.append_child(list, li);
    }

    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{default_article_id, default_article_name, extract};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn doc_with(headings: &[(&str, &str)]) -> Document {
        let mut doc = Document::new();
        for (tag, text) in headings {
            let el = doc.create_element(tag);
            let t = doc.create_text(text);
            doc.append_child(el, t);
            doc.append_child(doc.root(), el);
        }
        doc
    }

    fn outline_of(doc: &Document) -> Outline {
        let articles = extract(
            doc,
            &doc.headings(),
            &default_article_name,
            &default_article_id,
        )
        .unwrap();
        Outline::build(articles).unwrap()
    }

    #[test]
    fn test_nested_list_structure() {
        let mut doc = doc_with(&[("h1", "A"), ("h2", "B"), ("h2", "C"), ("h1", "D")]);
        let outline = outline_of(&doc);

        let rendered = render_list(&mut doc, &outline, &mut LinkHook::Anchor);

        assert_eq!(rendered.guides.len(), 4);
        assert_eq!(
            doc.to_html(rendered.list).replace('\n', ""),
            "<ol><li><a href=\"#a\">A</a><ol><li><a href=\"#b\">B</a></li>\
             <li><a href=\"#c\">C</a></li></ol></li><li><a href=\"#d\">D</a></li></ol>"
        );
    }

    #[test]
    fn test_anchor_link_wraps_source_heading() {
        let mut doc = doc_with(&[("h2", "Install Guide")]);
        let outline = outline_of(&doc);
        let heading = doc.headings()[0];

        render_list(&mut doc, &outline, &mut LinkHook::Anchor);

        assert_eq!(
            doc.to_html(heading),
            "<h2 id=\"install-guide\"><a href=\"#install-guide\">Install Guide</a></h2>\n"
        );
    }

    #[test]
    fn test_guides_follow_preorder() {
        let mut doc = doc_with(&[("h1", "A"), ("h2", "B"), ("h3", "C"), ("h1", "D")]);
        let outline = outline_of(&doc);

        let rendered = render_list(&mut doc, &outline, &mut LinkHook::Anchor);

        let texts: Vec<String> = rendered
            .guides
            .iter()
            .map(|li| doc.text_content(doc.children(*li)[0]))
            .collect();
        assert_eq!(texts, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_disabled_hook_leaves_source_untouched() {
        let mut doc = doc_with(&[("h1", "A")]);
        let outline = outline_of(&doc);
        let heading = doc.headings()[0];

        let rendered = render_list(&mut doc, &outline, &mut LinkHook::Disabled);

        assert_eq!(doc.to_html(heading), "<h1>A</h1>\n");
        assert!(doc.children(rendered.guides[0]).is_empty());
    }

    #[test]
    fn test_custom_hook_sees_every_article() {
        let mut doc = doc_with(&[("h1", "A"), ("h2", "B")]);
        let outline = outline_of(&doc);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut hook = LinkHook::custom(move |doc, li, article| {
            doc.set_attribute(li, "data-level", &article.level.to_string());
            sink.borrow_mut().push(article.id.clone());
        });
        let rendered = render_list(&mut doc, &outline, &mut hook);

        assert_eq!(*seen.borrow(), vec!["a", "b"]);
        assert_eq!(doc.attribute(rendered.guides[1], "data-level"), Some("2"));
    }
}

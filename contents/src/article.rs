//! Heading extraction
//!
//! Turns heading-bearing elements into a flat, document-ordered list of
//! [`Article`] records.

use crate::document::{Document, NodeId, HEADING_TAGS};
use crate::error::ConfigurationError;
use crate::slug::format_id;

/// Data attribute that sets the level of a non-heading element
pub const LEVEL_ATTRIBUTE: &str = "data-contents-level";

/// One outline entry
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// Nesting level (h1 = 1 ... h6 = 6)
    pub level: u32,
    /// Display name
    pub name: String,
    /// Anchor id
    pub id: String,
    /// Source element in the document
    pub element: NodeId,
}

/// Derives the display name of an article
pub type ArticleNameFn = Box<dyn Fn(&Document, NodeId) -> String>;

/// Derives the id of an article from its name and element
pub type ArticleIdFn = Box<dyn Fn(&str, &Document, NodeId) -> String>;

/// Default article name: the element's text content
pub fn default_article_name(doc: &Document, element: NodeId) -> String {
    doc.text_content(element)
}

/// Default article id: the element's existing id, otherwise a slug of the name
pub fn default_article_id(name: &str, doc: &Document, element: NodeId) -> String {
    match doc.element_id(element) {
        Some(id) => id.to_string(),
        None => format_id(name),
    }
}

/// Extract the element level used to construct the outline hierarchy
///
/// Headings use their tag (`h1` is 1, `h2` is 2, ...). Other elements read
/// [`LEVEL_ATTRIBUTE`], defaulting to 1.
pub fn level(doc: &Document, element: NodeId) -> Result<u32, ConfigurationError> {
    let tag = doc.tag_name(element).unwrap_or_default();

    if let Some(position) = HEADING_TAGS.iter().position(|t| *t == tag) {
        return Ok(position as u32 + 1);
    }

    match doc.attribute(element, LEVEL_ATTRIBUTE) {
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(level) if level >= 1 => Ok(level),
            _ => Err(ConfigurationError::InvalidLevel {
                tag: tag.to_string(),
                value: raw.to_string(),
            }),
        },
        None => Ok(1),
    }
}

/// Generate the flat index of the articles
///
/// # Parameters
/// * `doc` - Document owning the elements
/// * `elements` - Heading-bearing elements in document order
/// * `article_name` - Naming function
/// * `article_id` - Id function, receives the derived name
///
/// # Returns
/// * `Ok(Vec<Article>)` - One article per element, same order
/// * `Err(ConfigurationError)` - An element carries an invalid level attribute
pub fn extract(
    doc: &Document,
    elements: &[NodeId],
    article_name: &dyn Fn(&Document, NodeId) -> String,
    article_id: &dyn Fn(&str, &Document, NodeId) -> String,
) -> Result<Vec<Article>, ConfigurationError> {
    elements
        .iter()
        .map(|&element| {
            let level = level(doc, element)?;
            let name = article_name(doc, element);
            let id = article_id(&name, doc, element);
            log::debug!("Article h{} {:?} -> #{}", level, name, id);
            Ok(Article {
                level,
                name,
                id,
                element,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(doc: &mut Document, tag: &str, text: &str) -> NodeId {
        let el = doc.create_element(tag);
        let t = doc.create_text(text);
        doc.append_child(el, t);
        doc.append_child(doc.root(), el);
        el
    }

    #[test]
    fn test_level_from_heading_tag() {
        let mut doc = Document::new();
        let h3 = add(&mut doc, "h3", "Three");
        assert_eq!(level(&doc, h3), Ok(3));
    }

    #[test]
    fn test_level_from_data_attribute() {
        let mut doc = Document::new();
        let div = add(&mut doc, "div", "Custom");
        doc.set_attribute(div, LEVEL_ATTRIBUTE, "4");
        assert_eq!(level(&doc, div), Ok(4));
    }

    #[test]
    fn test_level_defaults_to_one() {
        let mut doc = Document::new();
        let p = add(&mut doc, "p", "Plain");
        assert_eq!(level(&doc, p), Ok(1));
    }

    #[test]
    fn test_invalid_level_attribute_is_rejected() {
        let mut doc = Document::new();
        let div = add(&mut doc, "div", "Broken");
        doc.set_attribute(div, LEVEL_ATTRIBUTE, "zero");
        assert!(matches!(
            level(&doc, div),
            Err(ConfigurationError::InvalidLevel { .. })
        ));
        doc.set_attribute(div, LEVEL_ATTRIBUTE, "0");
        assert!(level(&doc, div).is_err());
    }

    #[test]
    fn test_extract_uses_existing_id_or_slug() {
        let mut doc = Document::new();
        let a = add(&mut doc, "h1", "Getting Started");
        let b = add(&mut doc, "h2", "Install");
        doc.set_attribute(b, "id", "setup");

        let articles =
            extract(&doc, &[a, b], &default_article_name, &default_article_id).unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].id, "getting-started");
        assert_eq!(articles[0].name, "Getting Started");
        assert_eq!(articles[0].level, 1);
        assert_eq!(articles[1].id, "setup");
        assert_eq!(articles[1].element, b);
    }

    #[test]
    fn test_extract_with_custom_functions() {
        let mut doc = Document::new();
        let a = add(&mut doc, "h2", "  Padded  ");

        let name = |doc: &Document, el: NodeId| doc.text_content(el).trim().to_uppercase();
        let id = |name: &str, _: &Document, _: NodeId| format!("x-{}", name.to_lowercase());
        let articles = extract(&doc, &[a], &name, &id).unwrap();

        assert_eq!(articles[0].name, "PADDED");
        assert_eq!(articles[0].id, "x-padded");
    }
}

//! Outline configuration
//!
//! Four options are recognised: `articles`, `article_name`, `article_id` and
//! `link`. Each is optional and falls back to the documented default when
//! the configuration is resolved against a document.

use crate::article::{default_article_id, default_article_name, ArticleIdFn, ArticleNameFn};
use crate::document::{Document, NodeId};
use crate::error::ConfigurationError;
use crate::list::LinkHook;
use std::fmt;

/// Caller-supplied configuration
#[derive(Default)]
pub struct Config {
    articles: Option<Vec<NodeId>>,
    article_name: Option<ArticleNameFn>,
    article_id: Option<ArticleIdFn>,
    link: Option<LinkHook>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("articles", &self.articles)
            .field("article_name", &self.article_name.as_ref().map(|_| ".."))
            .field("article_id", &self.article_id.as_ref().map(|_| ".."))
            .field("link", &self.link)
            .finish()
    }
}

impl Config {
    /// Configuration with every option at its default
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit element collection instead of all `h1`..`h6`
    pub fn articles(mut self, elements: Vec<NodeId>) -> Self {
        self.articles = Some(elements);
        self
    }

    /// Override how article names are derived
    pub fn article_name<F>(mut self, f: F) -> Self
    where
        F: Fn(&Document, NodeId) -> String + 'static,
    {
        self.article_name = Some(Box::new(f));
        self
    }

    /// Override how article ids are derived
    pub fn article_id<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &Document, NodeId) -> String + 'static,
    {
        self.article_id = Some(Box::new(f));
        self
    }

    /// Override the list rendering hook
    pub fn link(mut self, hook: LinkHook) -> Self {
        self.link = Some(hook);
        self
    }

    /// Validate against `doc` and fill in defaults
    ///
    /// # Returns
    /// * `Ok(ResolvedConfig)` - Every option populated
    /// * `Err(ConfigurationError)` - The explicit article collection is empty or
    ///   holds something that is not an element of `doc`
    pub fn resolve(self, doc: &Document) -> Result<ResolvedConfig, ConfigurationError> {
        let articles = match self.articles {
            Some(elements) => {
                if elements.is_empty() {
                    return Err(ConfigurationError::EmptyArticles);
                }
                if let Some(index) = elements.iter().position(|el| !doc.is_element(*el)) {
                    return Err(ConfigurationError::NotAnElement { index });
                }
                elements
            }
            None => doc.headings(),
        };

        Ok(ResolvedConfig {
            articles,
            article_name: self
                .article_name
                .unwrap_or_else(|| Box::new(default_article_name) as ArticleNameFn),
            article_id: self
                .article_id
                .unwrap_or_else(|| Box::new(default_article_id) as ArticleIdFn),
            link: self.link.unwrap_or_default(),
        })
    }
}

/// Configuration with defaults applied
pub struct ResolvedConfig {
    /// Elements to extract articles from, in document order
    pub articles: Vec<NodeId>,
    /// Naming function
    pub article_name: ArticleNameFn,
    /// Id function
    pub article_id: ArticleIdFn,
    /// List rendering hook
    pub link: LinkHook,
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("articles", &self.articles)
            .field("link", &self.link)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let h1 = doc.create_element("h1");
        let text = doc.create_text("Title");
        doc.append_child(h1, text);
        doc.append_child(doc.root(), h1);
        (doc, h1, text)
    }

    #[test]
    fn test_defaults_discover_headings() {
        let (doc, h1, _) = doc();
        let resolved = Config::new().resolve(&doc).unwrap();

        assert_eq!(resolved.articles, vec![h1]);
        assert_eq!((resolved.article_name)(&doc, h1), "Title");
        assert_eq!((resolved.article_id)("Title", &doc, h1), "title");
        assert!(matches!(resolved.link, LinkHook::Anchor));
    }

    #[test]
    fn test_empty_articles_rejected() {
        let (doc, _, _) = doc();
        let err = Config::new().articles(Vec::new()).resolve(&doc).unwrap_err();
        assert_eq!(err, ConfigurationError::EmptyArticles);
    }

    #[test]
    fn test_text_node_in_articles_rejected() {
        let (doc, h1, text) = doc();
        let err = Config::new()
            .articles(vec![h1, text])
            .resolve(&doc)
            .unwrap_err();
        assert_eq!(err, ConfigurationError::NotAnElement { index: 1 });
    }

    #[test]
    fn test_custom_functions_are_kept() {
        let (doc, h1, _) = doc();
        let resolved = Config::new()
            .article_name(|_, _| "Fixed".to_string())
            .article_id(|name, _, _| format!("id-{}", name))
            .link(LinkHook::Disabled)
            .resolve(&doc)
            .unwrap();

        assert_eq!((resolved.article_name)(&doc, h1), "Fixed");
        assert_eq!((resolved.article_id)("Fixed", &doc, h1), "id-Fixed");
        assert!(matches!(resolved.link, LinkHook::Disabled));
    }
}

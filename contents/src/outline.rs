//! Hierarchical outline built from a flat article list
//!
//! The outline is an arena: every [`OutlineNode`] lives in one `Vec`, stores
//! the index of its parent (or `None` for roots) and the indices of its
//! descendants. Nodes are stored in extraction order, which is also the
//! pre-order traversal of the forest.

use crate::article::Article;
use crate::error::StructuralError;
use crate::slug::IdPool;

/// One article placed in the outline
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineNode {
    /// The article itself
    pub article: Article,
    /// Arena index of the parent, `None` for roots
    pub parent: Option<usize>,
    /// Arena indices of the direct descendants, in document order
    pub descendants: Vec<usize>,
}

/// Forest of articles representing the document structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    nodes: Vec<OutlineNode>,
    roots: Vec<usize>,
}

impl Outline {
    /// Build the outline from articles in document order
    pub fn build(articles: Vec<Article>) -> Result<Self, StructuralError> {
        Self::build_inner(articles, None)
    }

    /// Build the outline, first making every article id unique within `pool`
    pub fn build_with_unique_ids(
        articles: Vec<Article>,
        pool: &mut IdPool,
    ) -> Result<Self, StructuralError> {
        Self::build_inner(articles, Some(pool))
    }

    fn build_inner(
        articles: Vec<Article>,
        mut pool: Option<&mut IdPool>,
    ) -> Result<Self, StructuralError> {
        let mut outline = Self {
            nodes: Vec::with_capacity(articles.len()),
            roots: Vec::new(),
        };
        let mut last: Option<usize> = None;

        for mut article in articles {
            if let Some(pool) = pool.as_deref_mut() {
                article.id = pool.unique_id(&article.id);
            }

            let parent = match last {
                None => None,
                Some(last) => {
                    let last_level = outline.node(last)?.article.level;
                    if article.level == last_level {
                        outline.node(last)?.parent
                    } else if article.level > last_level {
                        Some(last)
                    } else {
                        outline.find_parent_with_level_lower(last, article.level)?
                    }
                }
            };

            last = Some(outline.attach(parent, article));
        }

        Ok(outline)
    }

    fn node(&self, index: usize) -> Result<&OutlineNode, StructuralError> {
        self.nodes
            .get(index)
            .ok_or(StructuralError::DanglingIndex(index))
    }

    fn attach(&mut self, parent: Option<usize>, article: Article) -> usize {
        let index = self.nodes.len();
        self.nodes.push(OutlineNode {
            article,
            parent,
            descendants: Vec::new(),
        });
        match parent {
            Some(p) => self.nodes[p].descendants.push(index),
            None => self.roots.push(index),
        }
        index
    }

    /// Walk up from `start` to the first ancestor whose level is below `level`
    ///
    /// `None` stands for the implicit level-0 root.
    fn find_parent_with_level_lower(
        &self,
        start: usize,
        level: u32,
    ) -> Result<Option<usize>, StructuralError> {
        let mut current = self.node(start)?.parent;

        for _ in 0..=self.nodes.len() {
            match current {
                None => return Ok(None),
                Some(index) => {
                    let node = self.node(index)?;
                    if node.article.level < level {
                        return Ok(Some(index));
                    }
                    current = node.parent;
                }
            }
        }

        Err(StructuralError::NoAncestor {
            index: start,
            level,
        })
    }

    /// Arena indices of the root articles
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Node at an arena index
    pub fn get(&self, index: usize) -> Option<&OutlineNode> {
        self.nodes.get(index)
    }

    /// Article at an arena index
    pub fn article(&self, index: usize) -> Option<&Article> {
        self.nodes.get(index).map(|n| &n.article)
    }

    /// Direct descendants of a node
    pub fn children(&self, index: usize) -> &[usize] {
        self.nodes
            .get(index)
            .map(|n| n.descendants.as_slice())
            .unwrap_or(&[])
    }

    /// Parent of a node
    pub fn parent(&self, index: usize) -> Option<usize> {
        self.nodes.get(index).and_then(|n| n.parent)
    }

    /// Number of ancestors above a node (roots have depth 0)
    pub fn depth(&self, index: usize) -> usize {
        let mut depth = 0;
        let mut current = self.parent(index);
        while let Some(p) = current {
            depth += 1;
            current = self.parent(p);
        }
        depth
    }

    /// Total number of articles
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the outline has no articles
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Arena indices in pre-order, obtained by walking the forest
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder {
            outline: self,
            stack: self.roots.iter().rev().copied().collect(),
        }
    }

    /// Articles in pre-order
    pub fn flatten(&self) -> Vec<&Article> {
        self.iter().filter_map(|i| self.article(i)).collect()
    }

    /// Articles in storage (extraction) order
    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.nodes.iter().map(|n| &n.article)
    }

    /// Check that every descendant is deeper than its parent and that
    /// parent/descendant links agree
    pub fn validate(&self) -> Result<(), StructuralError> {
        for (index, node) in self.nodes.iter().enumerate() {
            for &child in &node.descendants {
                let child_node = self.node(child)?;
                if child_node.parent != Some(index)
                    || child_node.article.level <= node.article.level
                {
                    return Err(StructuralError::NoAncestor {
                        index: child,
                        level: child_node.article.level,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Pre-order walk over an [`Outline`]
#[derive(Debug)]
pub struct PreOrder<'a> {
    outline: &'a Outline,
    stack: Vec<usize>,
}

impl Iterator for PreOrder<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let index = self.stack.pop()?;
        self.stack
            .extend(self.outline.children(index).iter().rev().copied());
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn articles(entries: &[(u32, &str)]) -> Vec<Article> {
        let mut doc = Document::new();
        entries.iter()
            .map(|(level, name)| Article {
                level: *level,
                name: name.to_string(),
                id: name.to_lowercase(),
                element: doc.create_element("h1"),
            })
            .collect()
    }

    fn names(outline: &Outline, indices: &[usize]) -> Vec<String> {
        indices
            .iter()
            .map(|i| outline.article(*i).unwrap().name.clone())
            .collect()
    }

    #[test]
    fn test_siblings_and_new_root() {
        let outline = Outline::build(articles(&[(1, "A"), (2, "B"), (2, "C"), (1, "D")])).unwrap();

        assert_eq!(names(&outline, outline.roots()), vec!["A", "D"]);
        let a = outline.roots()[0];
        let d = outline.roots()[1];
        assert_eq!(names(&outline, outline.children(a)), vec!["B", "C"]);
        assert!(outline.children(d).is_empty());
    }

    #[test]
    fn test_skipped_level_nests_under_previous() {
        let outline = Outline::build(articles(&[(1, "A"), (3, "B")])).unwrap();

        assert_eq!(names(&outline, outline.roots()), vec!["A"]);
        assert_eq!(names(&outline, outline.children(0)), vec!["B"]);
        assert_eq!(outline.parent(1), Some(0));
        assert_eq!(outline.depth(1), 1);
    }

    #[test]
    fn test_lower_level_climbs_to_matching_ancestor() {
        // h1 A, h2 B, h4 C, h3 D -> D becomes a child of B, sibling of C
        let outline =
            Outline::build(articles(&[(1, "A"), (2, "B"), (4, "C"), (3, "D")])).unwrap();

        assert_eq!(names(&outline, outline.children(1)), vec!["C", "D"]);
        outline.validate().unwrap();
    }

    #[test]
    fn test_document_starting_below_top_level() {
        let outline = Outline::build(articles(&[(3, "A"), (2, "B"), (3, "C"), (1, "D")])).unwrap();

        assert_eq!(names(&outline, outline.roots()), vec!["A", "B", "D"]);
        assert_eq!(names(&outline, outline.children(1)), vec!["C"]);
    }

    #[test]
    fn test_flatten_round_trips_levels() {
        let levels = [1, 2, 3, 3, 2, 4, 1, 1, 5, 2, 6, 3, 1];
        let entries: Vec<(u32, &str)> = levels.iter().map(|l| (*l, "x")).collect();
        let input = articles(&entries);
        let outline = Outline::build(input.clone()).unwrap();

        let flat: Vec<Article> = outline.flatten().into_iter().cloned().collect();
        assert_eq!(flat, input);
        outline.validate().unwrap();
    }

    #[test]
    fn test_unique_ids_are_assigned_in_order() {
        let mut pool = IdPool::new();
        let outline = Outline::build_with_unique_ids(
            articles(&[(1, "Intro"), (2, "Intro"), (2, "Intro")]),
            &mut pool,
        )
        .unwrap();

        let ids: Vec<&str> = outline.flatten().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["intro", "intro-1", "intro-2"]);
    }

    #[test]
    fn test_empty_outline() {
        let outline = Outline::build(Vec::new()).unwrap();
        assert!(outline.is_empty());
        assert_eq!(outline.iter().count(), 0);
    }
}

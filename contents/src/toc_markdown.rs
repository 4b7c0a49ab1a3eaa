//! Markdown rendering of an outline
//!
//! Produces a nested bullet list of links, suitable for pasting at the top of
//! a Markdown document.

use crate::outline::Outline;
use itertools::Itertools;

/// Indentation added per nesting level
const INDENT: &str = "  ";

/// Render the outline as a nested Markdown list of `[name](#id)` links
pub fn to_markdown(outline: &Outline) -> String {
    outline
        .iter()
        .filter_map(|index| {
            let article = outline.article(index)?;
            Some(format!(
                "{}- [{}](#{})",
                INDENT.repeat(outline.depth(index)),
                escape_link_text(article.name.trim()),
                article.id
            ))
        })
        .map(|line| line + "\n")
        .join("")
}

fn escape_link_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('[', "\\[")
        .replace(']', "\\]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{default_article_id, default_article_name, extract};
    use crate::markdown;

    fn outline_for(source: &str) -> Outline {
        let doc = markdown::parse(source);
        let articles =
            extract(&doc, &doc.headings(), &default_article_name, &default_article_id).unwrap();
        Outline::build(articles).unwrap()
    }

    #[test]
    fn test_nested_markdown_list() {
        let outline = outline_for("# Guide\n\n## Install\n\n### Linux\n\n## Usage\n\n# FAQ\n");

        assert_eq!(
            to_markdown(&outline),
            "- [Guide](#guide)\n  - [Install](#install)\n    - [Linux](#linux)\n  - [Usage](#usage)\n- [FAQ](#faq)\n"
        );
    }

    #[test]
    fn test_brackets_are_escaped() {
        let outline = outline_for("# Arrays [advanced]\n");
        assert_eq!(
            to_markdown(&outline),
            "- [Arrays \\[advanced\\]](#arrays-advanced)\n"
        );
    }

    #[test]
    fn test_empty_outline_renders_nothing() {
        assert_eq!(to_markdown(&Outline::default()), "");
    }
}

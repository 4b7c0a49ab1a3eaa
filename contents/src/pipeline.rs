//! Batch outlining of Markdown files
//!
//! This module drives the command-line tool in two stages:
//! 1. **Loading**: Discover Markdown files and parse them into documents
//! 2. **Outlining**: Extract articles, build each outline and render its list
//!
//! Documents processed together share one [`IdPool`] so that ids stay unique
//! when the results end up on the same page.

use crate::article;
use crate::document::{Document, NodeId};
use crate::error::{ContentsError, Result};
use crate::list::render_list;
use crate::markdown;
use crate::outline::Outline;
use crate::settings::Settings;
use crate::slug::IdPool;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A parsed Markdown file
#[derive(Debug)]
pub struct SourceDocument {
    /// Path the document was read from
    pub path: PathBuf,
    /// Parsed document
    pub document: Document,
}

/// A document together with its outline and rendered list
#[derive(Debug)]
pub struct OutlinedDocument {
    pub path: PathBuf,
    pub document: Document,
    pub outline: Outline,
    /// Root `<ol>` of the rendered list, detached from the document body
    pub list: NodeId,
}

/// Collect Markdown files under each input path
///
/// Files are taken as given. Directories are walked recursively and their
/// `.md` files are returned sorted by path.
pub fn discover(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    for input in inputs {
        if input.is_file() {
            paths.push(input.clone());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(input)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path().is_file() && e.path().extension().and_then(|s| s.to_str()) == Some("md")
            })
            .map(|e| e.path().to_path_buf())
            .collect();
        found.sort();

        if found.is_empty() {
            log::warn!("No markdown files found under {}", input.display());
        }
        paths.extend(found);
    }

    paths
}

/// Stage 1: Read and parse every file
///
/// # Parameters
/// * `paths` - Markdown files to load
///
/// # Returns
/// * `Ok(Vec<SourceDocument>)` - Parsed documents in the order of `paths`
/// * `Err(ContentsError)` - A file could not be read
pub fn load_sources(paths: &[PathBuf]) -> Result<Vec<SourceDocument>> {
    #[cfg(feature = "parallel")]
    let sources: Result<Vec<_>> = paths.par_iter().map(|path| load_markdown(path)).collect();

    #[cfg(not(feature = "parallel"))]
    let sources: Result<Vec<_>> = paths.iter().map(|path| load_markdown(path)).collect();

    let sources = sources?;
    log::info!("Loaded {} markdown files", sources.len());
    Ok(sources)
}

/// Parse a single Markdown file
pub fn load_markdown(path: &Path) -> Result<SourceDocument> {
    let content = std::fs::read_to_string(path).map_err(|source| ContentsError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(SourceDocument {
        path: path.to_path_buf(),
        document: markdown::parse(&content),
    })
}

/// Stage 2: Outline every document
///
/// # Parameters
/// * `sources` - Documents from [`load_sources`]
/// * `settings` - Outline options; `output.unique_ids` shares one id pool
///   across all documents
///
/// # Returns
/// * `Ok(Vec<OutlinedDocument>)` - One outline per source, same order
/// * `Err(ContentsError)` - Invalid settings for a document or a broken outline
pub fn build_outlines(
    sources: Vec<SourceDocument>,
    settings: &Settings,
) -> Result<Vec<OutlinedDocument>> {
    let mut pool = IdPool::new();

    sources
        .into_iter()
        .map(|source| {
            let unique = settings.output.unique_ids.then_some(&mut pool);
            outline_document(source, settings, unique)
        })
        .collect()
}

fn outline_document(
    source: SourceDocument,
    settings: &Settings,
    pool: Option<&mut IdPool>,
) -> Result<OutlinedDocument> {
    let SourceDocument { path, mut document } = source;

    let mut resolved = settings.to_config(&document)?.resolve(&document)?;
    let articles = article::extract(
        &document,
        &resolved.articles,
        &*resolved.article_name,
        &*resolved.article_id,
    )?;

    let outline = match pool {
        Some(pool) => Outline::build_with_unique_ids(articles, pool)?,
        None => Outline::build(articles)?,
    };
    let rendered = render_list(&mut document, &outline, &mut resolved.link);

    log::info!(
        "Outlined {}: {} articles",
        path.display(),
        outline.len()
    );

    Ok(OutlinedDocument {
        path,
        document,
        outline,
        list: rendered.list,
    })
}

//! Error types for outline construction and scroll tracking

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised synchronously while interpreting configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A settings key outside the recognised set was supplied
    #[error("Unknown configuration property: {0}")]
    UnknownProperty(String),

    /// A named strategy (article name, article id, link) is not recognised
    #[error("Option \"{option}\" does not accept \"{value}\"")]
    UnknownStrategy {
        /// The option being configured
        option: &'static str,
        /// The rejected value
        value: String,
    },

    /// The explicit article collection is empty
    #[error("Option \"articles\" must not be empty")]
    EmptyArticles,

    /// The explicit article collection contains something other than an element
    #[error("Option \"articles\" is not a collection of elements (entry {index})")]
    NotAnElement {
        /// Position of the offending entry
        index: usize,
    },

    /// A level data attribute could not be read as a positive integer
    #[error("Invalid article level \"{value}\" on <{tag}>")]
    InvalidLevel {
        /// Tag name of the element carrying the attribute
        tag: String,
        /// Raw attribute value
        value: String,
    },

    /// The settings file could not be parsed
    #[error("Settings parse error in {path}: {message}", path = .path.display())]
    Parse {
        /// Path of the settings file
        path: PathBuf,
        /// Parser message
        message: String,
    },
}

/// Violation of the outline tree invariants
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// Walking parent links from a node did not reach a suitable ancestor
    #[error("Invalid tree: no ancestor of article {index} accepts level {level}")]
    NoAncestor {
        /// Arena index of the node the walk started from
        index: usize,
        /// Level of the article being attached
        level: u32,
    },

    /// A node referenced an index outside the arena
    #[error("Invalid tree: dangling article index {0}")]
    DanglingIndex(usize),
}

/// Top-level error for the contents library
#[derive(Error, Debug)]
pub enum ContentsError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Structural error: {0}")]
    Structural(#[from] StructuralError),

    /// Nearest-value search over an empty offset index
    #[error("Offset index must not be empty")]
    EmptyIndex,

    #[error("IO error for {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the crate
pub type Result<T, E = ContentsError> = std::result::Result<T, E>;

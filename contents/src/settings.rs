//! File-based settings (contents.toml)
//!
//! Settings are the serialisable counterpart of [`Config`]: the element
//! collection is given as tag names and the naming, id and link behaviours
//! are picked by strategy name.

use crate::article::default_article_name;
use crate::config::Config;
use crate::document::Document;
use crate::error::{ConfigurationError, ContentsError};
use crate::list::LinkHook;
use crate::slug::format_id;
use crate::tracker::TrackerOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default file name looked up when no settings path is given
pub const SETTINGS_FILE: &str = "contents.toml";

/// Keys accepted in the `[contents]` table
const CONTENTS_KEYS: [&str; 4] = ["articles", "article_name", "article_id", "link"];

/// Top-level settings file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Outline options
    pub contents: ContentsSettings,

    /// Scroll tracker timing and viewport
    pub tracker: TrackerSettings,

    /// Output options for the command-line tool
    pub output: OutputSettings,
}

/// The `[contents]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContentsSettings {
    /// Tag names of the elements to outline; all headings when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub articles: Option<Vec<String>>,

    /// `text` or `trimmed-text`
    pub article_name: String,

    /// `id-or-slug` or `slug`
    pub article_id: String,

    /// `anchor` or `none`
    pub link: String,
}

impl Default for ContentsSettings {
    fn default() -> Self {
        Self {
            articles: None,
            article_name: "text".to_string(),
            article_id: "id-or-slug".to_string(),
            link: "anchor".to_string(),
        }
    }
}

/// The `[tracker]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerSettings {
    /// Minimum spacing between handled host signals in milliseconds
    pub throttle_ms: u64,

    /// Delay before the initial resize/ready events in milliseconds
    pub bootstrap_delay_ms: u64,

    /// Viewport height used by the command-line tracker
    pub window_height: f64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            throttle_ms: 100,
            bootstrap_delay_ms: 10,
            window_height: 800.0,
        }
    }
}

/// The `[output]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    /// Suffix ids that repeat across documents
    pub unique_ids: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self { unique_ids: true }
    }
}

impl Settings {
    /// Load settings from a TOML file
    ///
    /// # Parameters
    /// * `path` - Path to the settings file
    ///
    /// # Returns
    /// * `Ok(Settings)` - Parsed settings
    /// * `Err(ContentsError)` - The file could not be read, is not valid TOML,
    ///   or names an unknown option
    pub fn load(path: &Path) -> Result<Self, ContentsError> {
        let content = std::fs::read_to_string(path).map_err(|source| ContentsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content, path)?)
    }

    /// Load settings from `path` if it exists, or fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ContentsError> {
        if path.is_file() {
            log::info!("Loading settings from {}", path.display());
            Self::load(path)
        } else {
            log::debug!("No settings at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parse settings text; `path` is only used in error messages
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigurationError> {
        let parse_error = |message: String| ConfigurationError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let table: toml::Table = toml::from_str(content).map_err(|e| parse_error(e.to_string()))?;

        // Unknown outline options get their own error rather than a parse message
        if let Some(contents) = table.get("contents").and_then(|v| v.as_table()) {
            if let Some(key) = contents
                .keys()
                .find(|key| !CONTENTS_KEYS.contains(&key.as_str()))
            {
                return Err(ConfigurationError::UnknownProperty(key.clone()));
            }
        }

        let settings: Settings = toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| parse_error(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that every strategy name is recognised
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let contents = &self.contents;
        check_strategy("article_name", &contents.article_name, &["text", "trimmed-text"])?;
        check_strategy("article_id", &contents.article_id, &["id-or-slug", "slug"])?;
        check_strategy("link", &contents.link, &["anchor", "none"])?;
        Ok(())
    }

    /// Build an outline configuration for `doc`
    ///
    /// When `articles` lists tag names, the matching elements of `doc` become
    /// the explicit collection; resolving it fails if nothing matches.
    pub fn to_config(&self, doc: &Document) -> Result<Config, ConfigurationError> {
        self.validate()?;
        let contents = &self.contents;
        let mut config = Config::new();

        if let Some(tags) = &contents.articles {
            let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
            config = config.articles(doc.elements_by_tag(&tags));
        }

        if contents.article_name == "trimmed-text" {
            config = config.article_name(|doc, el| default_article_name(doc, el).trim().to_string());
        }

        if contents.article_id == "slug" {
            config = config.article_id(|name, _, _| format_id(name));
        }

        if contents.link == "none" {
            config = config.link(LinkHook::Disabled);
        }

        Ok(config)
    }

    /// Tracker timing
    pub fn tracker_options(&self) -> TrackerOptions {
        TrackerOptions {
            throttle: Duration::from_millis(self.tracker.throttle_ms),
            bootstrap_delay: Duration::from_millis(self.tracker.bootstrap_delay_ms),
        }
    }

    /// Serialise to TOML
    pub fn to_toml(&self) -> Result<String, ConfigurationError> {
        toml::to_string_pretty(self).map_err(|e| ConfigurationError::Parse {
            path: SETTINGS_FILE.into(),
            message: e.to_string(),
        })
    }
}

fn check_strategy(
    option: &'static str,
    value: &str,
    accepted: &[&str],
) -> Result<(), ConfigurationError> {
    if accepted.contains(&value) {
        Ok(())
    } else {
        Err(ConfigurationError::UnknownStrategy {
            option,
            value: value.to_string(),
        })
    }
}

//! contents - table of contents generation and scroll tracking
//!
//! Builds a hierarchical outline from the headings of a document, renders it
//! as a nested ordered list with anchor links, and follows a viewport to
//! report which article is currently being read.
//!
//! ```
//! use contents::{markdown, Config, Contents, StaticHost, TimerQueue};
//! use std::rc::Rc;
//!
//! let mut doc = markdown::parse("# Guide\n\n## Install\n\n## Usage\n");
//! let host = Rc::new(StaticHost::from_document(&doc, 800.0));
//! let timers = TimerQueue::new();
//!
//! let contents = Contents::new(&mut doc, Config::new(), host, &timers).unwrap();
//! assert_eq!(contents.tree().roots().len(), 1);
//! assert_eq!(contents.guides().len(), 3);
//! ```

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod article;
pub mod config;
pub mod contents;
pub mod document;
pub mod error;
pub mod event_bus;
pub mod list;
pub mod markdown;
pub mod outline;
pub mod pipeline;
pub mod settings;
pub mod slug;
pub mod timer;
pub mod toc_markdown;
pub mod tracker;

pub use article::Article;
pub use config::Config;
pub use contents::Contents;
pub use document::{Document, NodeId};
pub use error::{ConfigurationError, ContentsError, Result, StructuralError};
pub use event_bus::{ActiveEntry, ChangeEvent, Event, EventBus, EventName, Subscription};
pub use list::LinkHook;
pub use outline::Outline;
pub use settings::Settings;
pub use slug::{format_id, IdPool};
pub use timer::TimerQueue;
pub use tracker::{Host, ScrollTracker, StaticHost, TrackerOptions, TrackerState};

//! Table of contents for a live document
//!
//! [`Contents`] ties the pieces together: it resolves the configuration,
//! extracts articles, builds the outline, renders the list and binds a
//! [`ScrollTracker`] to its own [`EventBus`].

use crate::article;
use crate::config::Config;
use crate::document::{Document, NodeId};
use crate::error::Result;
use crate::event_bus::EventBus;
use crate::list::render_list;
use crate::outline::Outline;
use crate::timer::TimerQueue;
use crate::tracker::{Host, ScrollTracker, TrackerOptions};
use std::rc::Rc;

/// A generated table of contents and the tracker following the viewport
#[derive(Debug)]
pub struct Contents {
    list: NodeId,
    guides: Vec<NodeId>,
    outline: Outline,
    bus: EventBus,
    tracker: ScrollTracker,
}

impl Contents {
    /// Build the table of contents with default tracker timing
    ///
    /// # Parameters
    /// * `doc` - Document to outline; headings are rewired by the link hook
    /// * `config` - Outline options
    /// * `host` - Viewport geometry for scroll tracking
    /// * `timers` - Queue that drives the deferred bootstrap and throttles
    ///
    /// # Returns
    /// * `Ok(Contents)` - Outline built and tracker bootstrap scheduled
    /// * `Err(ContentsError)` - Invalid configuration or a broken outline
    pub fn new(
        doc: &mut Document,
        config: Config,
        host: Rc<dyn Host>,
        timers: &TimerQueue,
    ) -> Result<Self> {
        Self::with_options(doc, config, host, timers, TrackerOptions::default())
    }

    /// Build the table of contents with explicit tracker timing
    pub fn with_options(
        doc: &mut Document,
        config: Config,
        host: Rc<dyn Host>,
        timers: &TimerQueue,
        options: TrackerOptions,
    ) -> Result<Self> {
        let mut resolved = config.resolve(doc)?;

        let articles = article::extract(
            doc,
            &resolved.articles,
            &*resolved.article_name,
            &*resolved.article_id,
        )?;
        let outline = Outline::build(articles)?;
        let rendered = render_list(doc, &outline, &mut resolved.link);

        log::info!(
            "Built contents: {} articles, {} top-level",
            outline.len(),
            outline.roots().len()
        );
        if outline.is_empty() {
            log::warn!("Document has no headings; scroll tracking will fail on first scroll");
        }

        let bus = EventBus::new();
        let tracker = ScrollTracker::bind(
            &bus,
            host,
            outline.articles().cloned().collect(),
            rendered.guides.clone(),
            timers,
            options,
        );

        Ok(Self {
            list: rendered.list,
            guides: rendered.guides,
            outline,
            bus,
            tracker,
        })
    }

    /// Root `<ol>` of the rendered table of contents
    pub fn list(&self) -> NodeId {
        self.list
    }

    /// `<li>` guides aligned with the flat article list
    pub fn guides(&self) -> &[NodeId] {
        &self.guides
    }

    /// Hierarchical representation of the table of contents
    pub fn tree(&self) -> &Outline {
        &self.outline
    }

    /// Bus used to attach listeners and publish events
    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// The scroll tracker
    pub fn tracker(&self) -> &ScrollTracker {
        &self.tracker
    }

    /// Forward a host resize signal to the tracker
    pub fn host_resized(&self) -> Result<()> {
        self.tracker.host_resized()
    }

    /// Forward a host scroll signal to the tracker
    pub fn host_scrolled(&self) -> Result<()> {
        self.tracker.host_scrolled()
    }

    /// Stop tracking the viewport
    pub fn detach(&mut self) {
        self.tracker.detach();
    }
}

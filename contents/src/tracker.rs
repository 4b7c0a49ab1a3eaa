//! Scroll tracking
//!
//! The tracker keeps an index of article offsets and, whenever the viewport
//! scrolls, publishes a [`Event::Change`] if a different article became the
//! active one. Viewport geometry comes from a [`Host`].

use crate::article::Article;
use crate::document::{Document, NodeId};
use crate::error::{ContentsError, Result};
use crate::event_bus::{ActiveEntry, ChangeEvent, Event, EventBus, EventName, Subscription};
use crate::timer::{Throttle, TimerQueue};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

/// Offsets are rounded to the nearest multiple of this value
pub const OFFSET_GRANULARITY: f64 = 3.0;

/// Share of the window height added to the scroll position when picking the
/// active article
pub const VIEWPORT_RATIO: f64 = 0.05;

/// Viewport and layout information supplied by the embedding environment
pub trait Host {
    /// Visible height of the viewport
    fn window_height(&self) -> f64;

    /// Current vertical scroll position
    fn scroll_y(&self) -> f64;

    /// Vertical position of an element within the document
    fn offset_top(&self, element: NodeId) -> f64;
}

/// Position of an element as the sum of its own offset and the offsets of
/// all its ancestors
pub fn document_offset(doc: &Document, element: NodeId) -> f64 {
    let mut offset = doc.offset_top(element);
    let mut node = doc.parent(element);
    while let Some(ancestor) = node {
        offset += doc.offset_top(ancestor);
        node = doc.parent(ancestor);
    }
    offset
}

/// A host whose geometry is set explicitly
#[derive(Debug, Default)]
pub struct StaticHost {
    window_height: Cell<f64>,
    scroll_y: Cell<f64>,
    offsets: RefCell<HashMap<NodeId, f64>>,
}

impl StaticHost {
    /// Create a host with the given window height and no known offsets
    pub fn new(window_height: f64) -> Self {
        Self {
            window_height: Cell::new(window_height),
            ..Self::default()
        }
    }

    /// Create a host that reports the layout offsets recorded in `doc`
    pub fn from_document(doc: &Document, window_height: f64) -> Self {
        let host = Self::new(window_height);
        {
            let mut offsets = host.offsets.borrow_mut();
            for node in doc.descendants(doc.root()) {
                if doc.is_element(node) {
                    offsets.insert(node, document_offset(doc, node));
                }
            }
        }
        host
    }

    /// Scroll the viewport
    pub fn scroll_to(&self, y: f64) {
        self.scroll_y.set(y);
    }

    /// Resize the viewport
    pub fn set_window_height(&self, height: f64) {
        self.window_height.set(height);
    }

    /// Override the offset of one element
    pub fn set_offset(&self, element: NodeId, offset: f64) {
        self.offsets.borrow_mut().insert(element, offset);
    }
}

impl Host for StaticHost {
    fn window_height(&self) -> f64 {
        self.window_height.get()
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y.get()
    }

    fn offset_top(&self, element: NodeId) -> f64 {
        self.offsets
            .borrow()
            .get(&element)
            .copied()
            .unwrap_or_default()
    }
}

/// Produce a rounded offset for each element
pub fn index_offsets(host: &dyn Host, elements: impl IntoIterator<Item = NodeId>) -> Vec<i64> {
    elements
        .into_iter()
        .map(|element| {
            let offset = host.offset_top(element);
            (OFFSET_GRANULARITY * (offset / OFFSET_GRANULARITY).round()) as i64
        })
        .collect()
}

/// Find the index of the value nearest to `needle`
///
/// Scans left to right keeping the best index so far and stops as soon as an
/// element fails to improve on it. Offsets are expected to be non-decreasing.
///
/// # Returns
/// * `Ok(usize)` - Index of the nearest value
/// * `Err(ContentsError::EmptyIndex)` - `haystack` is empty
pub fn index_of_closest_value(needle: f64, haystack: &[i64]) -> Result<usize> {
    if haystack.is_empty() {
        return Err(ContentsError::EmptyIndex);
    }

    let distance = |value: i64| (needle - value as f64).abs();
    let mut closest = 0;
    let mut last_closest = None;

    for (i, value) in haystack.iter().enumerate() {
        if distance(haystack[closest]) > distance(*value) {
            closest = i;
        }

        if last_closest == Some(closest) {
            break;
        }

        last_closest = Some(closest);
    }

    Ok(closest)
}

/// Timing of the tracker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerOptions {
    /// Minimum spacing between handled host signals
    pub throttle: Duration,
    /// Delay before the initial `resize`/`ready` events
    pub bootstrap_delay: Duration,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            throttle: Duration::from_millis(100),
            bootstrap_delay: Duration::from_millis(10),
        }
    }
}

/// Lifecycle of a tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// Bootstrap has not run yet; host signals are ignored
    Uninitialized,
    /// Listening to host signals
    Ready,
}

#[derive(Debug)]
struct TrackerInner {
    state: TrackerState,
    window_height: f64,
    offsets: Vec<i64>,
    last_index: Option<usize>,
    articles: Vec<Article>,
    guides: Vec<NodeId>,
}

impl TrackerInner {
    fn entry(&self, index: usize) -> Option<ActiveEntry> {
        self.articles.get(index).map(|article| ActiveEntry {
            index,
            article: article.clone(),
            guide: self.guides.get(index).copied(),
        })
    }
}

#[derive(Debug)]
struct HostListeners {
    resize: Throttle<()>,
    scroll: Throttle<()>,
}

/// Reports which article is active as the viewport moves
pub struct ScrollTracker {
    inner: Rc<RefCell<TrackerInner>>,
    listeners: Rc<RefCell<Option<HostListeners>>>,
    bus: EventBus,
    subscriptions: Vec<Subscription>,
}

impl std::fmt::Debug for ScrollTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollTracker")
            .field("inner", &self.inner.borrow())
            .field("bus", &self.bus)
            .finish()
    }
}

impl ScrollTracker {
    /// Subscribe the tracker to `bus` and schedule its bootstrap
    ///
    /// # Parameters
    /// * `bus` - Bus the tracker listens on and publishes to
    /// * `host` - Viewport geometry
    /// * `articles` - Flat article list in document order
    /// * `guides` - `<li>` guides aligned with `articles`
    /// * `timers` - Queue that runs the bootstrap and throttled signals
    /// * `options` - Throttle interval and bootstrap delay
    pub fn bind(
        bus: &EventBus,
        host: Rc<dyn Host>,
        articles: Vec<Article>,
        guides: Vec<NodeId>,
        timers: &TimerQueue,
        options: TrackerOptions,
    ) -> Self {
        let inner = Rc::new(RefCell::new(TrackerInner {
            state: TrackerState::Uninitialized,
            window_height: 0.0,
            offsets: Vec::new(),
            last_index: None,
            articles,
            guides,
        }));
        let listeners = Rc::new(RefCell::new(None));
        let mut subscriptions = Vec::with_capacity(2);

        let resize_inner = Rc::clone(&inner);
        let resize_host = Rc::clone(&host);
        let resize_bus = bus.downgrade();
        subscriptions.push(bus.try_subscribe(EventName::Resize, move |_| {
            {
                let mut state = resize_inner.borrow_mut();
                state.window_height = resize_host.window_height();
                let elements: Vec<NodeId> = state.articles.iter().map(|a| a.element).collect();
                state.offsets = index_offsets(resize_host.as_ref(), elements);
                log::debug!("Offset index recomputed: {:?}", state.offsets);
            }
            resize_bus.publish(Event::Scroll)
        }));

        let scroll_inner = Rc::clone(&inner);
        let scroll_host = Rc::clone(&host);
        let scroll_bus = bus.downgrade();
        subscriptions.push(bus.try_subscribe(EventName::Scroll, move |_| {
            let change = {
                let mut state = scroll_inner.borrow_mut();
                let target = scroll_host.scroll_y() + state.window_height * VIEWPORT_RATIO;
                let index = index_of_closest_value(target, &state.offsets)?;

                if state.last_index == Some(index) {
                    None
                } else {
                    let previous = state.last_index.and_then(|i| state.entry(i));
                    let current = state.entry(index);
                    state.last_index = Some(index);
                    current.map(|current| ChangeEvent { current, previous })
                }
            };

            match change {
                Some(change) => {
                    log::info!(
                        "Active article: #{} ({})",
                        change.current.article.id,
                        change.current.index
                    );
                    scroll_bus.publish(Event::Change(change))
                }
                None => Ok(()),
            }
        }));

        let boot_inner = Rc::clone(&inner);
        let boot_listeners = Rc::clone(&listeners);
        let boot_bus = bus.downgrade();
        let boot_timers = timers.clone();
        timers.set_timeout(options.bootstrap_delay, move || {
            boot_bus.publish(Event::Resize)?;
            boot_inner.borrow_mut().state = TrackerState::Ready;
            boot_bus.publish(Event::Ready)?;

            let resize_bus = boot_bus.clone();
            let scroll_bus = boot_bus;
            *boot_listeners.borrow_mut() = Some(HostListeners {
                resize: Throttle::new(&boot_timers, options.throttle, move |()| {
                    resize_bus.publish(Event::Resize)
                }),
                scroll: Throttle::new(&boot_timers, options.throttle, move |()| {
                    scroll_bus.publish(Event::Scroll)
                }),
            });
            log::debug!("Scroll tracker ready");
            Ok(())
        });

        Self {
            inner,
            listeners,
            bus: bus.clone(),
            subscriptions,
        }
    }

    /// Lifecycle state
    pub fn state(&self) -> TrackerState {
        self.inner.borrow().state
    }

    /// Current offset index, one entry per article
    pub fn offsets(&self) -> Vec<i64> {
        self.inner.borrow().offsets.clone()
    }

    /// Window height captured at the last resize
    pub fn window_height(&self) -> f64 {
        self.inner.borrow().window_height
    }

    /// Index of the active article, if any change has been published yet
    pub fn active_index(&self) -> Option<usize> {
        self.inner.borrow().last_index
    }

    /// The host viewport was resized
    pub fn host_resized(&self) -> Result<()> {
        let throttle = self.listeners.borrow().as_ref().map(|l| l.resize.clone());
        match throttle {
            Some(throttle) => throttle.call(()),
            None => {
                log::debug!("Resize signal before bootstrap ignored");
                Ok(())
            }
        }
    }

    /// The host viewport was scrolled
    pub fn host_scrolled(&self) -> Result<()> {
        let throttle = self.listeners.borrow().as_ref().map(|l| l.scroll.clone());
        match throttle {
            Some(throttle) => throttle.call(()),
            None => {
                log::debug!("Scroll signal before bootstrap ignored");
                Ok(())
            }
        }
    }

    /// Stop tracking: remove the bus subscriptions and host listeners
    pub fn detach(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            self.bus.unsubscribe(&subscription);
        }
        self.listeners.borrow_mut().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_value_prefers_smaller_distance() {
        assert_eq!(index_of_closest_value(150.0, &[0, 100, 205, 300]).unwrap(), 1);
    }

    #[test]
    fn test_closest_value_edges() {
        let index = [0, 100, 200, 300];
        assert_eq!(index_of_closest_value(-50.0, &index).unwrap(), 0);
        assert_eq!(index_of_closest_value(0.0, &index).unwrap(), 0);
        assert_eq!(index_of_closest_value(260.0, &index).unwrap(), 3);
        assert_eq!(index_of_closest_value(10_000.0, &index).unwrap(), 3);
        assert_eq!(index_of_closest_value(42.0, &[7]).unwrap(), 0);
    }

    #[test]
    fn test_closest_value_tie_keeps_earlier_index() {
        assert_eq!(index_of_closest_value(50.0, &[0, 100]).unwrap(), 0);
    }

    #[test]
    fn test_closest_value_on_empty_index() {
        assert!(matches!(
            index_of_closest_value(1.0, &[]),
            Err(ContentsError::EmptyIndex)
        ));
    }

    #[test]
    fn test_offsets_round_to_multiple_of_three() {
        let host = StaticHost::new(600.0);
        let mut doc = Document::new();
        let elements: Vec<NodeId> = (0..4).map(|_| doc.create_element("h2")).collect();
        for (el, offset) in elements.iter().zip([0.0, 100.0, 101.6, 205.2]) {
            host.set_offset(*el, offset);
        }

        assert_eq!(index_offsets(&host, elements), vec![0, 99, 102, 204]);
    }

    #[test]
    fn test_document_offset_adds_parent_offset() {
        let mut doc = Document::new();
        let section = doc.create_element("section");
        let heading = doc.create_element("h2");
        doc.append_child(doc.root(), section);
        doc.append_child(section, heading);
        doc.set_offset_top(section, 400.0);
        doc.set_offset_top(heading, 25.0);

        assert_eq!(document_offset(&doc, heading), 425.0);
        let host = StaticHost::from_document(&doc, 800.0);
        assert_eq!(host.offset_top(heading), 425.0);
        assert_eq!(host.window_height(), 800.0);
    }

    #[test]
    fn test_document_offset_sums_every_ancestor() {
        let mut doc = Document::new();
        let section = doc.create_element("section");
        let wrapper = doc.create_element("div");
        let heading = doc.create_element("h2");
        doc.append_child(doc.root(), section);
        doc.append_child(section, wrapper);
        doc.append_child(wrapper, heading);
        doc.set_offset_top(section, 400.0);
        doc.set_offset_top(wrapper, 30.0);
        doc.set_offset_top(heading, 25.0);

        assert_eq!(document_offset(&doc, heading), 455.0);
        assert_eq!(document_offset(&doc, wrapper), 430.0);
    }

    #[test]
    fn test_nested_markdown_headings_keep_document_order() {
        let doc = crate::markdown::parse(
            "# A\n\ntext\n\n## B\n\ntext\n\n- item\n\n  > ### Deep\n\n## C\n",
        );
        let host = StaticHost::from_document(&doc, 800.0);
        let headings = doc.headings();
        let offsets: Vec<f64> = headings.iter().map(|h| host.offset_top(*h)).collect();

        assert_eq!(headings.len(), 4);
        assert_eq!(doc.text_content(headings[2]), "Deep");
        assert!(
            offsets.windows(2).all(|pair| pair[0] < pair[1]),
            "{:?}",
            offsets
        );
    }
}

//! Publish/subscribe bus for outline events
//!
//! Each [`crate::Contents`] owns its own bus; there is no process-wide
//! instance. Handlers run synchronously on the publishing call, newest
//! subscription first.
//!
//! A handler is never re-entered. An event published to a handler that is
//! still running (because it published something that came back to it) is
//! queued on that handler and delivered as soon as the running call returns.

use crate::article::Article;
use crate::document::NodeId;
use crate::error::Result;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

/// Names of the events the bus carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    Ready,
    Resize,
    Scroll,
    Change,
}

impl EventName {
    /// Lower-case event name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Resize => "resize",
            Self::Scroll => "scroll",
            Self::Change => "change",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outline entry as reported by a change event
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEntry {
    /// Position in the flat article list
    pub index: usize,
    /// The article
    pub article: Article,
    /// Its `<li>` in the rendered list
    pub guide: Option<NodeId>,
}

/// Payload of [`Event::Change`]
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Entry that just became active
    pub current: ActiveEntry,
    /// Entry that was active before, absent on the first change
    pub previous: Option<ActiveEntry>,
}

/// Event with its typed payload
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Bootstrap finished
    Ready,
    /// Viewport geometry changed
    Resize,
    /// Viewport scrolled
    Scroll,
    /// Active outline entry changed
    Change(ChangeEvent),
}

impl Event {
    /// Name used to route the event
    pub fn name(&self) -> EventName {
        match self {
            Self::Ready => EventName::Ready,
            Self::Resize => EventName::Resize,
            Self::Scroll => EventName::Scroll,
            Self::Change(_) => EventName::Change,
        }
    }
}

type HandlerFn = Box<dyn FnMut(&Event) -> Result<()>>;

/// A subscribed handler and the events queued while it was running
struct HandlerSlot {
    handler: RefCell<HandlerFn>,
    backlog: RefCell<VecDeque<Event>>,
}

impl HandlerSlot {
    fn new(handler: HandlerFn) -> Self {
        Self {
            handler: RefCell::new(handler),
            backlog: RefCell::new(VecDeque::new()),
        }
    }

    /// Run the handler, or queue the event if the handler is already running
    ///
    /// The outermost call drains the backlog in arrival order before it
    /// returns. An error drops whatever is still queued.
    fn deliver(&self, event: &Event) -> Result<()> {
        let Ok(mut handler) = self.handler.try_borrow_mut() else {
            log::trace!("Handler busy, queueing {}", event.name());
            self.backlog.borrow_mut().push_back(event.clone());
            return Ok(());
        };

        let mut result = (&mut **handler)(event);
        while result.is_ok() {
            let Some(next) = self.backlog.borrow_mut().pop_front() else {
                break;
            };
            result = (&mut **handler)(&next);
        }

        if result.is_err() {
            self.backlog.borrow_mut().clear();
        }
        result
    }
}

type Handler = Rc<HandlerSlot>;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    name: EventName,
    id: u64,
}

impl Subscription {
    /// Event the subscription listens to
    pub fn name(&self) -> EventName {
        self.name
    }
}

struct Listener {
    id: u64,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<EventName, Vec<Listener>>,
}

impl Registry {
    fn is_subscribed(&self, name: EventName, id: u64) -> bool {
        self.listeners
            .get(&name)
            .is_some_and(|list| list.iter().any(|l| l.id == id))
    }
}

/// Event bus handle; clones share the same subscriptions
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Rc<RefCell<Registry>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        let counts: HashMap<EventName, usize> = registry
            .listeners
            .iter()
            .map(|(name, list)| (*name, list.len()))
            .collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

impl EventBus {
    /// Create a bus with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-owning handle, for handlers that need to publish on their own bus
    pub fn downgrade(&self) -> WeakEventBus {
        WeakEventBus {
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Subscribe an infallible handler
    pub fn subscribe<F>(&self, name: EventName, mut handler: F) -> Subscription
    where
        F: FnMut(&Event) + 'static,
    {
        self.try_subscribe(name, move |event| {
            handler(event);
            Ok(())
        })
    }

    /// Subscribe a handler whose error aborts the dispatch and is returned by
    /// [`EventBus::publish`]
    pub fn try_subscribe<F>(&self, name: EventName, handler: F) -> Subscription
    where
        F: FnMut(&Event) -> Result<()> + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.entry(name).or_default().push(Listener {
            id,
            handler: Rc::new(HandlerSlot::new(Box::new(handler))),
        });
        Subscription { name, id }
    }

    /// Remove a subscription; unknown handles are ignored
    pub fn unsubscribe(&self, subscription: &Subscription) {
        let mut registry = self.registry.borrow_mut();
        if let Some(list) = registry.listeners.get_mut(&subscription.name) {
            if let Some(position) = list.iter().position(|l| l.id == subscription.id) {
                list.remove(position);
            }
        }
    }

    /// Number of handlers subscribed to `name`
    pub fn subscriber_count(&self, name: EventName) -> usize {
        self.registry
            .borrow()
            .listeners
            .get(&name)
            .map_or(0, Vec::len)
    }

    /// Invoke every handler subscribed to the event's name, newest first
    ///
    /// The handler list is captured when the call starts. Handlers removed by
    /// an earlier handler during the same dispatch are skipped; handlers added
    /// during the dispatch only see later events. A handler that is already
    /// running receives the event once it returns.
    pub fn publish(&self, event: Event) -> Result<()> {
        let name = event.name();
        let snapshot: Vec<(u64, Handler)> = match self.registry.borrow().listeners.get(&name) {
            Some(list) => list
                .iter()
                .rev()
                .map(|l| (l.id, Rc::clone(&l.handler)))
                .collect(),
            None => return Ok(()),
        };

        log::trace!("Publishing {} to {} handler(s)", name, snapshot.len());

        for (id, handler) in snapshot {
            if !self.registry.borrow().is_subscribed(name, id) {
                continue;
            }
            handler.deliver(&event)?;
        }

        Ok(())
    }
}

/// Weak counterpart of [`EventBus`]
#[derive(Clone, Default)]
pub struct WeakEventBus {
    registry: Weak<RefCell<Registry>>,
}

impl fmt::Debug for WeakEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakEventBus")
            .field("alive", &(self.registry.strong_count() > 0))
            .finish()
    }
}

impl WeakEventBus {
    /// The bus, if it is still alive
    pub fn upgrade(&self) -> Option<EventBus> {
        self.registry.upgrade().map(|registry| EventBus { registry })
    }

    /// Publish if the bus is still alive; a dropped bus swallows the event
    pub fn publish(&self, event: Event) -> Result<()> {
        match self.upgrade() {
            Some(bus) => bus.publish(event),
            None => Ok(()),
        }
    }
}

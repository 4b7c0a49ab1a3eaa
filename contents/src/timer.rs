//! Deferred callbacks on a single logical thread
//!
//! [`TimerQueue`] keeps virtual time: nothing runs until the owner calls
//! [`TimerQueue::advance`], which fires due callbacks in deadline order.
//! [`Throttle`] builds a trailing-edge rate limiter on top of it.

use crate::error::Result;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

type TimerCallback = Box<dyn FnOnce() -> Result<()>>;

/// Handle to a scheduled callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

struct Timer {
    id: TimerId,
    due: Duration,
    callback: TimerCallback,
}

#[derive(Default)]
struct Queue {
    now: Duration,
    next_id: u64,
    timers: Vec<Timer>,
}

/// Virtual-time timer queue; clones share the same clock and timers
#[derive(Clone, Default)]
pub struct TimerQueue {
    inner: Rc<RefCell<Queue>>,
}

impl fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.inner.borrow();
        f.debug_struct("TimerQueue")
            .field("now", &queue.now)
            .field("pending", &queue.timers.len())
            .finish()
    }
}

impl TimerQueue {
    /// Create a queue at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Number of callbacks waiting to fire
    pub fn pending(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Run `callback` once `delay` has elapsed
    pub fn set_timeout<F>(&self, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce() -> Result<()> + 'static,
    {
        let mut queue = self.inner.borrow_mut();
        let id = TimerId(queue.next_id);
        queue.next_id += 1;
        let due = queue.now + delay;
        queue.timers.push(Timer {
            id,
            due,
            callback: Box::new(callback),
        });
        id
    }

    /// Cancel a scheduled callback; already fired or unknown ids are ignored
    pub fn clear_timeout(&self, id: TimerId) {
        self.inner.borrow_mut().timers.retain(|t| t.id != id);
    }

    /// Move the clock forward, firing every callback that falls due
    ///
    /// Callbacks run in deadline order, ties in scheduling order. Callbacks
    /// scheduled while advancing also fire if they fall due before the target.
    /// The first callback error stops the advance and is returned.
    pub fn advance(&self, by: Duration) -> Result<()> {
        let target = self.now() + by;

        while let Some(timer) = self.pop_due(target) {
            (timer.callback)()?;
        }

        self.inner.borrow_mut().now = target;
        Ok(())
    }

    /// Fire callbacks until the queue is empty
    pub fn run_until_idle(&self) -> Result<()> {
        loop {
            let next_due = self.inner.borrow().timers.iter().map(|t| t.due).min();
            let Some(due) = next_due else {
                return Ok(());
            };
            let now = self.now();
            self.advance(due.saturating_sub(now))?;
        }
    }

    fn pop_due(&self, target: Duration) -> Option<Timer> {
        let mut queue = self.inner.borrow_mut();
        let position = queue
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= target)
            .min_by_key(|(_, t)| (t.due, t.id))
            .map(|(i, _)| i)?;
        let timer = queue.timers.remove(position);
        queue.now = timer.due;
        Some(timer)
    }
}

#[derive(Debug, Default)]
struct ThrottleState {
    last: Option<Duration>,
    pending: Option<TimerId>,
}

/// Trailing-edge throttle
///
/// The first call runs immediately. Calls arriving within `interval` of the
/// last run replace any pending deferred call with a new one scheduled
/// `interval` later, carrying the latest arguments, so the last call of a
/// burst always runs. A call that runs immediately cancels any deferred call,
/// so stale arguments never run after newer ones.
pub struct Throttle<A> {
    timers: TimerQueue,
    interval: Duration,
    state: Rc<RefCell<ThrottleState>>,
    callback: Rc<RefCell<dyn FnMut(A) -> Result<()>>>,
}

impl<A> Clone for Throttle<A> {
    fn clone(&self) -> Self {
        Self {
            timers: self.timers.clone(),
            interval: self.interval,
            state: Rc::clone(&self.state),
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<A> fmt::Debug for Throttle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle")
            .field("interval", &self.interval)
            .field("state", &self.state.borrow())
            .finish()
    }
}

impl<A: 'static> Throttle<A> {
    /// Wrap `callback` so it runs at most once per `interval`
    pub fn new<F>(timers: &TimerQueue, interval: Duration, callback: F) -> Self
    where
        F: FnMut(A) -> Result<()> + 'static,
    {
        Self {
            timers: timers.clone(),
            interval,
            state: Rc::new(RefCell::new(ThrottleState::default())),
            callback: Rc::new(RefCell::new(callback)),
        }
    }

    /// Whether a deferred call is waiting
    pub fn is_pending(&self) -> bool {
        self.state.borrow().pending.is_some()
    }

    /// Invoke the throttled callback
    pub fn call(&self, args: A) -> Result<()> {
        let now = self.timers.now();
        let within_interval = self
            .state
            .borrow()
            .last
            .is_some_and(|last| now < last + self.interval);

        // A newer call always supersedes a deferred one
        if let Some(id) = self.state.borrow_mut().pending.take() {
            self.timers.clear_timeout(id);
        }

        if !within_interval {
            self.state.borrow_mut().last = Some(now);
            return (&mut *self.callback.borrow_mut())(args);
        }

        let state = Rc::clone(&self.state);
        let callback = Rc::clone(&self.callback);
        let id = self.timers.set_timeout(self.interval, move || {
            {
                let mut state = state.borrow_mut();
                state.last = Some(now);
                state.pending = None;
            }
            (&mut *callback.borrow_mut())(args)
        });
        self.state.borrow_mut().pending = Some(id);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let timers = TimerQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for (delay, label) in [(30, "c"), (10, "a"), (20, "b"), (10, "a2")] {
            let log = Rc::clone(&log);
            timers.set_timeout(ms(delay), move || {
                log.borrow_mut().push(label);
                Ok(())
            });
        }

        timers.advance(ms(15)).unwrap();
        assert_eq!(*log.borrow(), vec!["a", "a2"]);
        assert_eq!(timers.now(), ms(15));

        timers.advance(ms(100)).unwrap();
        assert_eq!(*log.borrow(), vec!["a", "a2", "b", "c"]);
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn test_cleared_timer_never_fires() {
        let timers = TimerQueue::new();
        let fired = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&fired);
        let id = timers.set_timeout(ms(5), move || {
            *flag.borrow_mut() = true;
            Ok(())
        });

        timers.clear_timeout(id);
        timers.run_until_idle().unwrap();

        assert!(!*fired.borrow());
    }

    #[test]
    fn test_callback_can_schedule_followup() {
        let timers = TimerQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner = timers.clone();
        let outer_log = Rc::clone(&log);

        timers.set_timeout(ms(10), move || {
            outer_log.borrow_mut().push(inner.now());
            let log = Rc::clone(&outer_log);
            let clock = inner.clone();
            inner.set_timeout(ms(10), move || {
                log.borrow_mut().push(clock.now());
                Ok(())
            });
            Ok(())
        });

        timers.advance(ms(50)).unwrap();
        assert_eq!(*log.borrow(), vec![ms(10), ms(20)]);
    }

    #[test]
    fn test_throttle_runs_first_call_immediately() {
        let timers = TimerQueue::new();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        let throttle = Throttle::new(&timers, ms(100), move |n: u32| {
            sink.borrow_mut().push(n);
            Ok(())
        });

        throttle.call(1).unwrap();

        assert_eq!(*calls.borrow(), vec![1]);
        assert!(!throttle.is_pending());
    }

    #[test]
    fn test_throttle_coalesces_burst_to_latest_arguments() {
        let timers = TimerQueue::new();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        let throttle = Throttle::new(&timers, ms(100), move |n: u32| {
            sink.borrow_mut().push(n);
            Ok(())
        });

        throttle.call(1).unwrap();
        timers.advance(ms(20)).unwrap();
        throttle.call(2).unwrap();
        timers.advance(ms(20)).unwrap();
        throttle.call(3).unwrap();
        assert!(throttle.is_pending());
        assert_eq!(calls.borrow().len(), 1);

        timers.advance(ms(100)).unwrap();

        assert_eq!(*calls.borrow(), vec![1, 3]);
        assert!(!throttle.is_pending());
    }

    #[test]
    fn test_immediate_call_cancels_stale_deferred_call() {
        let timers = TimerQueue::new();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        let clock = timers.clone();
        let throttle = Throttle::new(&timers, ms(100), move |n: u32| {
            sink.borrow_mut().push((clock.now(), n));
            Ok(())
        });

        throttle.call(1).unwrap();
        timers.advance(ms(99)).unwrap();
        throttle.call(2).unwrap();
        timers.advance(ms(51)).unwrap();
        throttle.call(3).unwrap();
        timers.run_until_idle().unwrap();

        assert_eq!(*calls.borrow(), vec![(ms(0), 1), (ms(150), 3)]);
        assert!(!throttle.is_pending());
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn test_throttle_runs_again_after_interval() {
        let timers = TimerQueue::new();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let throttle = Throttle::new(&timers, ms(100), move |_: ()| {
            *sink.borrow_mut() += 1;
            Ok(())
        });

        throttle.call(()).unwrap();
        timers.advance(ms(150)).unwrap();
        throttle.call(()).unwrap();

        assert_eq!(*count.borrow(), 2);
        assert_eq!(timers.pending(), 0);
    }
}

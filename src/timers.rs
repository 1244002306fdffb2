//! Highlight timers and the clock they run on.
//!
//! Each highlighted element has at most one pending cleanup. Scheduling a
//! cleanup for an element that already has one replaces it; the element's
//! original tab-index, captured by the first activation, survives the
//! replacement so the cleanup restores what the document had before any
//! highlighting began.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::dom::NodeId;

/// Monotonic time source.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: Rc<Cell<Duration>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Jump to an absolute time. Time never runs backwards.
    pub fn set(&self, at: Duration) {
        if at > self.now.get() {
            self.now.set(at);
        }
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// A scheduled highlight removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCleanup {
    /// When the cleanup is due.
    pub deadline: Duration,
    /// `tabindex` the element had before it was first highlighted.
    pub prior_tabindex: Option<String>,
}

/// Owner of all pending highlight cleanups, keyed by element.
#[derive(Debug, Default)]
pub struct HighlightTimers {
    pending: HashMap<NodeId, PendingCleanup>,
}

impl HighlightTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a cleanup, replacing any pending one for the same element.
    ///
    /// Returns `true` if an earlier cleanup was superseded. In that case the
    /// earlier `prior_tabindex` is kept and the one passed here is ignored.
    pub fn schedule(
        &mut self,
        element: NodeId,
        deadline: Duration,
        prior_tabindex: Option<String>,
    ) -> bool {
        match self.cancel(element) {
            Some(previous) => {
                self.pending.insert(
                    element,
                    PendingCleanup {
                        deadline,
                        prior_tabindex: previous.prior_tabindex,
                    },
                );
                true
            }
            None => {
                self.pending.insert(
                    element,
                    PendingCleanup {
                        deadline,
                        prior_tabindex,
                    },
                );
                false
            }
        }
    }

    /// Cancel the pending cleanup for an element. Cancelling twice is fine.
    pub fn cancel(&mut self, element: NodeId) -> Option<PendingCleanup> {
        self.pending.remove(&element)
    }

    pub fn is_pending(&self, element: NodeId) -> bool {
        self.pending.contains_key(&element)
    }

    pub fn get(&self, element: NodeId) -> Option<&PendingCleanup> {
        self.pending.get(&element)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.values().map(|p| p.deadline).min()
    }

    /// Remove and return every cleanup due at `now`, earliest first.
    pub fn take_due(&mut self, now: Duration) -> Vec<(NodeId, PendingCleanup)> {
        let due: Vec<NodeId> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(&id, _)| id)
            .collect();

        let mut taken: Vec<_> = due
            .into_iter()
            .filter_map(|id| self.pending.remove(&id).map(|p| (id, p)))
            .collect();
        taken.sort_by_key(|(id, p)| (p.deadline, *id));
        taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_virtual_clock_shared_between_clones() {
        let clock = VirtualClock::new();
        let other = clock.clone();
        clock.advance(ms(150));
        assert_eq!(other.now(), ms(150));

        other.set(ms(100));
        assert_eq!(clock.now(), ms(150), "time must not run backwards");
    }

    #[test]
    fn test_schedule_replaces_and_keeps_original_tabindex() {
        let mut timers = HighlightTimers::new();
        let el = NodeId(4);

        assert!(!timers.schedule(el, ms(2000), Some("3".to_string())));
        assert!(timers.schedule(el, ms(2500), Some("-1".to_string())));

        assert_eq!(timers.pending_count(), 1);
        let pending = timers.get(el).unwrap();
        assert_eq!(pending.deadline, ms(2500));
        assert_eq!(pending.prior_tabindex.as_deref(), Some("3"));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut timers = HighlightTimers::new();
        let el = NodeId(1);
        timers.schedule(el, ms(10), None);

        assert!(timers.cancel(el).is_some());
        assert!(timers.cancel(el).is_none());
        assert!(!timers.is_pending(el));
    }

    #[test]
    fn test_take_due_in_deadline_order() {
        let mut timers = HighlightTimers::new();
        timers.schedule(NodeId(1), ms(300), None);
        timers.schedule(NodeId(2), ms(100), None);
        timers.schedule(NodeId(3), ms(900), None);

        assert_eq!(timers.next_deadline(), Some(ms(100)));
        let due: Vec<_> = timers.take_due(ms(300)).into_iter().map(|(id, _)| id).collect();
        assert_eq!(due, vec![NodeId(2), NodeId(1)]);
        assert_eq!(timers.pending_count(), 1);
        assert!(timers.take_due(ms(899)).is_empty());
    }
}

//! Single-threaded discrete-event queue.
//!
//! All "concurrent" transmissions in the simulated medium are serialized by
//! this queue's global virtual-time order. The channel schedules delivery
//! events into it; scenario code pumps them out. Two guarantees matter to the
//! rest of the crate:
//!
//! - Events fire in non-decreasing virtual time.
//! - Events scheduled for the same virtual time fire in the order they were
//!   enqueued (a monotonically increasing sequence number breaks ties). This
//!   is a stable tie-break, not a semantic promise to callers.
//!
//! Popping an event advances the queue's clock to the event's timestamp; the
//! clock never moves backwards. There is no cancellation: once scheduled, an
//! event always fires.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::time::{SimDuration, SimTime};

struct ScheduledEvent<E> {
    at: SimTime,
    seq: u64,
    event: E,
}

impl<E> PartialEq for ScheduledEvent<E> {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl<E> Eq for ScheduledEvent<E> {}

impl<E> PartialOrd for ScheduledEvent<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for ScheduledEvent<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Time first, then enqueue order. The payload never participates.
        self.at.cmp(&other.at).then(self.seq.cmp(&other.seq))
    }
}

/// Min-ordered event queue over virtual time.
///
/// Generic over the event payload so the channel can keep its delivery
/// records private while tests drive the queue with plain markers.
pub struct EventQueue<E> {
    heap: BinaryHeap<Reverse<ScheduledEvent<E>>>,
    now: SimTime,
    next_seq: u64,
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        EventQueue {
            heap: BinaryHeap::new(),
            now: SimTime::ZERO,
            next_seq: 0,
        }
    }

    /// Current virtual time: the timestamp of the most recently popped event.
    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Schedule `event` to fire `delay` after the current virtual time.
    pub fn schedule_after(&mut self, delay: SimDuration, event: E) {
        self.schedule_at(self.now + delay, event);
    }

    /// Schedule `event` at an absolute virtual timestamp. Timestamps in the
    /// past are clamped to `now`; the clock never runs backwards.
    pub fn schedule_at(&mut self, at: SimTime, event: E) {
        let at = at.max(self.now);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(ScheduledEvent { at, seq, event }));
    }

    /// Advance the clock to `t` without firing anything. Scenario code uses
    /// this to idle between bursts; moving backwards is a no-op.
    pub fn advance_to(&mut self, t: SimTime) {
        debug_assert!(
            self.peek_deadline().is_none_or(|at| at >= t),
            "advance_to would skip over a pending event"
        );
        self.now = self.now.max(t);
    }

    /// Timestamp of the next event without removing it.
    pub fn peek_deadline(&self) -> Option<SimTime> {
        self.heap.peek().map(|Reverse(ev)| ev.at)
    }

    /// Remove the next event, advancing the clock to its timestamp.
    pub fn pop_next(&mut self) -> Option<(SimTime, E)> {
        let Reverse(ev) = self.heap.pop()?;
        self.now = ev.at;
        Some((ev.at, ev.event))
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

//! Events postponed to a later frame.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::machine::MachineEvent;

#[derive(Debug, Clone)]
struct DelayedEvent {
    due: u64,
    seq: u64,
    event: MachineEvent,
}

// Ordered by due frame, then by scheduling order.
impl Ord for DelayedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due.cmp(&other.due).then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for DelayedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DelayedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DelayedEvent {}

/// Min-heap of events keyed by the frame they fall due. Events due on the
/// same frame come out in the order they were scheduled.
///
/// An event is never queued for a frame already served, so `pop_due`
/// returns exactly the events due on the frame it is given.
#[derive(Debug, Clone, Default)]
pub(super) struct DelayedEvents {
    heap: BinaryHeap<Reverse<DelayedEvent>>,
    scheduled: u64,
    served: u64,
}

impl DelayedEvents {
    /// Queue `event` for frame `due`.
    pub(super) fn push(&mut self, due: u64, event: MachineEvent) {
        debug_assert!(due >= self.served, "event due on frame {due} queued after frame {}", self.served);
        let seq = self.scheduled;
        self.scheduled += 1;
        self.heap.push(Reverse(DelayedEvent { due, seq, event }));
    }

    /// The next event due on or before `frame`.
    pub(super) fn pop_due(&mut self, frame: u64) -> Option<MachineEvent> {
        self.served = frame;
        if self.heap.peek().is_some_and(|Reverse(d)| d.due <= frame) {
            self.heap.pop().map(|Reverse(d)| d.event)
        } else {
            None
        }
    }

    /// Events waiting.
    #[must_use]
    pub(super) fn len(&self) -> usize {
        self.heap.len()
    }

    /// True when nothing is waiting.
    #[allow(dead_code)]
    #[must_use]
    pub(super) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

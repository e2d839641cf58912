//! Runtime event queue.
//!
//! Events are produced by the scheduler delegate and consumed by the main
//! loop, which handles them in priority order.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Scheduler   │────▶│  EventQueue  │────▶│  Main Loop   │
//! │ Stop signal │────▶│  (bounded)   │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use heapless::Deque;

/// Maximum number of pending events.
const EVENT_QUEUE_CAP: usize = 8;

/// Loop event types.  Lower discriminant = higher priority when several
/// are pending at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Event {
    /// Stop was requested; shut down at this boundary.
    Shutdown = 0,
    /// Run one control tick.
    ControlTick = 10,
    /// Queue the twelve-hourly report.
    PeriodicReport = 20,
}

/// Bounded queue owned by the runtime.
pub struct EventQueue {
    pending: Deque<Event, EVENT_QUEUE_CAP>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            pending: Deque::new(),
        }
    }

    /// Queue an event.  An event already pending is coalesced.  Returns
    /// `false` if the queue is full (event dropped).
    pub fn push(&mut self, event: Event) -> bool {
        if self.pending.iter().any(|e| *e == event) {
            return true;
        }
        self.pending.push_back(event).is_ok()
    }

    /// Hand every pending event to `handler`, highest priority first.
    pub fn drain(&mut self, mut handler: impl FnMut(Event)) {
        let mut batch: heapless::Vec<Event, EVENT_QUEUE_CAP> = heapless::Vec::new();
        while let Some(e) = self.pending.pop_front() {
            // Capacities match, so this cannot overflow.
            let _ = batch.push(e);
        }
        batch.sort_unstable();
        for e in batch {
            handler(e);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

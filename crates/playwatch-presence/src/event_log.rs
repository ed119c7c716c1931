//! Bounded audit trail of accepted events.
//!
//! Server events (start, stop, backup) never touch a player record; this
//! log is where they remain visible.

use std::collections::VecDeque;

use playwatch_protocol::Event;

/// How many events the tracker keeps by default.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 1_000;

/// Newest-first ring of recent events.
#[derive(Debug)]
pub struct EventLog {
    events: VecDeque<Event>,
    capacity: usize,
}

impl EventLog {
    /// Creates an empty log. A capacity of 0 keeps nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_LOG_CAPACITY)),
            capacity,
        }
    }

    /// Records an event, evicting the oldest one when full.
    pub fn push(&mut self, event: Event) {
        if self.capacity == 0 {
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_back();
        }
        self.events.push_front(event);
    }

    /// Up to `limit` events, newest first.
    pub fn recent(&self, limit: usize) -> Vec<Event> {
        self.events.iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_LOG_CAPACITY)
    }
}

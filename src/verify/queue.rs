//! Single-flight job queue.
//!
//! Pending entries are served strictly in arrival order by at most one drain
//! at a time. The queue itself only tracks state; the owner runs the drain
//! loop and is told when one has to be started.
//!
//! ```text
//!            Enqueued                 Enqueued
//!   ┌──────┐ ───────► ┌──────────┐ ◄──────────┐
//!   │ Idle │          │ Draining │ ───────────┘
//!   └──────┘ ◄─────── └──────────┘
//!            Exhausted
//! ```

use std::collections::VecDeque;

/// Whether a drain is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainState {
    /// No drain is running; the queue is empty.
    #[default]
    Idle,
    /// A drain is processing entries one at a time.
    Draining,
}

/// Inputs to the drain state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueEvent {
    /// An entry was appended.
    Enqueued,
    /// The drain found the queue empty.
    Exhausted,
}

impl DrainState {
    /// Next state after `event`.
    #[must_use]
    pub fn transition(self, event: QueueEvent) -> Self {
        match event {
            QueueEvent::Enqueued => Self::Draining,
            QueueEvent::Exhausted => Self::Idle,
        }
    }
}

/// FIFO of pending jobs plus drain state.
#[derive(Debug)]
pub struct JobQueue<T> {
    state: DrainState,
    pending: VecDeque<T>,
}

impl<T> Default for JobQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> JobQueue<T> {
    /// Create an idle, empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: DrainState::Idle,
            pending: VecDeque::new(),
        }
    }

    /// Append an entry.
    ///
    /// Returns `true` when the queue was idle, meaning the caller must start
    /// a drain. While a drain is running this always returns `false`.
    #[must_use]
    pub fn push(&mut self, entry: T) -> bool {
        self.pending.push_back(entry);
        let start_drain = self.state == DrainState::Idle;
        self.state = self.state.transition(QueueEvent::Enqueued);
        start_drain
    }

    /// Take the oldest entry for the running drain.
    ///
    /// Returns `None` and moves to [`DrainState::Idle`] when nothing is
    /// pending; the drain must stop at that point.
    pub fn next(&mut self) -> Option<T> {
        let entry = self.pending.pop_front();
        if entry.is_none() {
            self.state = self.state.transition(QueueEvent::Exhausted);
        }
        entry
    }

    /// Current drain state.
    #[must_use]
    pub fn state(&self) -> DrainState {
        self.state
    }

    /// Entries waiting to be taken.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

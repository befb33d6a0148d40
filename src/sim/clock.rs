//! Virtual millisecond clock with one-shot timers
//!
//! Every delayed action in the game (spawn ticks, target expiry, cell
//! cooldown) is a task queued here. Nothing runs on its own: the driver
//! advances the clock and the session dispatches whatever came due, one task
//! at a time, so a task's mutations never interleave with another's.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Milliseconds on the virtual clock
pub type Millis = u64;

/// Cancellation handle for a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// One-shot timer queue over a virtual clock
///
/// Tasks due at the same instant fire in the order they were scheduled.
/// Cancelled entries stay in the heap and are skipped when they surface.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Millis,
    next_id: u64,
    queue: BinaryHeap<Reverse<(Millis, u64)>>,
    pending: HashMap<u64, T>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_id: 1,
            queue: BinaryHeap::new(),
            pending: HashMap::new(),
        }
    }

    /// Current virtual time
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Queue `task` to fire `delay` milliseconds from now
    pub fn schedule(&mut self, delay: Millis, task: T) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.queue.push(Reverse((self.now.saturating_add(delay), id)));
        self.pending.insert(id, task);
        TimerId(id)
    }

    /// Cancel a pending task. Returns the task if it had not fired yet.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        self.pending.remove(&id.0)
    }

    /// Whether `id` is still waiting to fire
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.contains_key(&id.0)
    }

    /// Number of tasks still waiting to fire
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Cancel everything
    pub fn clear(&mut self) {
        self.queue.clear();
        self.pending.clear();
    }

    /// Due time of the earliest live task
    pub fn next_due(&mut self) -> Option<Millis> {
        self.discard_cancelled();
        self.queue.peek().map(|Reverse((due, _))| *due)
    }

    /// Pop the earliest task due at or before `until`, moving the clock to
    /// its due time.
    pub fn pop_due(&mut self, until: Millis) -> Option<(TimerId, T)> {
        self.discard_cancelled();
        let Reverse((due, id)) = *self.queue.peek()?;
        if due > until {
            return None;
        }
        self.queue.pop();
        self.now = self.now.max(due);
        self.pending.remove(&id).map(|task| (TimerId(id), task))
    }

    /// Move the clock forward to `t` (never backwards)
    pub fn settle(&mut self, t: Millis) {
        self.now = self.now.max(t);
    }

    fn discard_cancelled(&mut self) {
        while let Some(Reverse((_, id))) = self.queue.peek() {
            if self.pending.contains_key(id) {
                break;
            }
            self.queue.pop();
        }
    }
}

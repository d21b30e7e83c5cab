//! Time-ordered queue for one-shot tasks.
//!
//! Entries are keyed by `(execute_time, sequence)` so equal fire times pop
//! in insertion order.

use std::collections::BTreeMap;

/// Min-ordered queue of items keyed by an absolute time in milliseconds.
#[derive(Debug)]
pub struct TimeQueue<T> {
    entries: BTreeMap<(i64, u64), T>,
    next_seq: u64,
}

impl<T> Default for TimeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimeQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Insert an item due at `time`.
    pub fn push(&mut self, time: i64, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert((time, seq), item);
    }

    /// Time of the earliest entry.
    pub fn peek_time(&self) -> Option<i64> {
        self.entries.keys().next().map(|&(time, _)| time)
    }

    /// Remove and return the earliest entry if it is due at or before `now`.
    ///
    /// Never looks past the first entry: anything behind it is due no sooner.
    pub fn pop_due(&mut self, now: i64) -> Option<(i64, T)> {
        let first = self.entries.first_entry()?;
        let (time, _) = *first.key();
        if time > now {
            return None;
        }
        Some((time, first.remove()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Per-manager execution counters.

use serde::Serialize;

/// Running totals for one manager since construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionStats {
    /// Number of `tick()` calls
    pub ticks: u64,
    /// Task runs started
    pub executed: u64,
    /// Runs that returned an error or panicked
    pub failed: u64,
    /// Runs at or over the warning threshold
    pub slow: u64,
    /// Tasks removed from the live set
    pub removed: u64,
    /// Pending entries merged into the live set
    pub merged: u64,
}

impl ExecutionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add another set of counters onto these.
    pub fn absorb(&mut self, other: &ExecutionStats) {
        self.ticks += other.ticks;
        self.executed += other.executed;
        self.failed += other.failed;
        self.slow += other.slow;
        self.removed += other.removed;
        self.merged += other.merged;
    }

    /// Runs that completed without error.
    pub fn succeeded(&self) -> u64 {
        self.executed.saturating_sub(self.failed)
    }
}

//! Tick Loop - heartbeat cadence and bookkeeping
//!
//! The heartbeat ticks every registered manager once per pass, then sleeps
//! out the remainder of the interval. A pass that takes longer than the
//! interval is an overrun: the next pass starts immediately.

use std::time::Duration;

/// Shortest interval the heartbeat will sleep between passes
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for the heartbeat loop
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Interval between tick passes
    pub tick_interval: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(10),
        }
    }
}

impl TickConfig {
    /// Create a new tick config. Intervals below 1 ms are raised to 1 ms.
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            tick_interval: tick_interval.max(MIN_TICK_INTERVAL),
        }
    }

    /// Create a tick config from an interval in milliseconds
    pub fn from_millis(tick_interval_ms: u64) -> Self {
        Self::new(Duration::from_millis(tick_interval_ms))
    }

    /// Time left to sleep after a pass that took `elapsed`
    pub fn remaining(&self, elapsed: Duration) -> Duration {
        self.tick_interval.saturating_sub(elapsed)
    }
}

/// Tick state tracks what happened across passes
#[derive(Debug, Default)]
pub struct TickState {
    /// Number of passes since start
    pub tick_count: u64,
    /// Passes that took longer than the interval
    pub overruns: u64,
    /// Duration of the most recent pass
    pub last_pass: Duration,
    /// Longest pass seen
    pub max_pass: Duration,
    /// Whether shutdown has been requested
    pub shutdown_requested: bool,
}

impl TickState {
    /// Create a new tick state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pass; returns true when it overran the interval
    pub fn record_pass(&mut self, elapsed: Duration, interval: Duration) -> bool {
        self.tick_count += 1;
        self.last_pass = elapsed;
        self.max_pass = self.max_pass.max(elapsed);
        let overran = elapsed > interval;
        if overran {
            self.overruns += 1;
        }
        overran
    }

    /// Request shutdown
    pub fn request_shutdown(&mut self) {
        self.shutdown_requested = true;
    }
}

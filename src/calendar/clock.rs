//! Wall-clock sources.
//!
//! Managers never read the system time directly; they go through a
//! [`Clock`] so hosts and tests can control time.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Local, NaiveDateTime, Utc};

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;

    /// Local wall-clock date/time used for calendar fields.
    fn now_local(&self) -> NaiveDateTime;
}

/// The host's real clock, in local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn now_local(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to. Calendar fields are read as UTC.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// Create a clock reading `millis` since the epoch.
    pub fn new(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    /// Create a clock reading the given wall-clock time.
    pub fn at(datetime: NaiveDateTime) -> Self {
        Self::new(datetime.and_utc().timestamp_millis())
    }

    /// Move the clock forward (or backward, for negative values).
    pub fn advance_millis(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Move the clock forward by whole seconds.
    pub fn advance_secs(&self, secs: i64) {
        self.advance_millis(secs * 1000);
    }

    /// Jump to an absolute reading.
    pub fn set_millis(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }

    fn now_local(&self) -> NaiveDateTime {
        DateTime::from_timestamp_millis(self.now_millis())
            .unwrap_or_default()
            .naive_utc()
    }
}

//! Closure-backed task implementations.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::calendar::DateTimeUnit;

use super::{PeriodicTask, ScheduledTask};

type TaskBody = Box<dyn Fn() -> eyre::Result<()> + Send + Sync>;

/// A periodic task built from a closure.
///
/// ```ignore
/// let task = PeriodicFn::new("flush-metrics", DateTimeUnit::Minute, || flush())
///     .every(5)
///     .limit(12);
/// ```
pub struct PeriodicFn {
    name: String,
    unit: DateTimeUnit,
    interval: u32,
    max_runs: Option<u64>,
    runs: AtomicU64,
    body: TaskBody,
}

impl PeriodicFn {
    /// Create a task running `body` on every crossing of `unit`.
    pub fn new<F>(name: impl Into<String>, unit: DateTimeUnit, body: F) -> Self
    where
        F: Fn() -> eyre::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            unit,
            interval: 1,
            max_runs: None,
            runs: AtomicU64::new(0),
            body: Box::new(body),
        }
    }

    /// Run on every Nth crossing instead of every one.
    pub fn every(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    /// Become destroyable after `runs` executions.
    pub fn limit(mut self, runs: u64) -> Self {
        self.max_runs = Some(runs);
        self
    }

    /// Number of times the body has been invoked.
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }
}

impl PeriodicTask for PeriodicFn {
    fn do_periodic_task(&self) -> eyre::Result<()> {
        self.runs.fetch_add(1, Ordering::Relaxed);
        (self.body)()
    }

    fn date_time_unit(&self) -> DateTimeUnit {
        self.unit
    }

    fn interval(&self) -> u32 {
        self.interval
    }

    fn is_destroyable(&self) -> bool {
        self.max_runs.is_some_and(|max| self.runs() >= max)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for PeriodicFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodicFn")
            .field("name", &self.name)
            .field("unit", &self.unit)
            .field("interval", &self.interval)
            .field("max_runs", &self.max_runs)
            .field("runs", &self.runs())
            .finish()
    }
}

/// A one-shot task built from a closure.
pub struct ScheduledFn {
    name: String,
    body: TaskBody,
}

impl ScheduledFn {
    /// Create a named one-shot task.
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn() -> eyre::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            body: Box::new(body),
        }
    }
}

impl ScheduledTask for ScheduledFn {
    fn execute(&self) -> eyre::Result<()> {
        (self.body)()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for ScheduledFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledFn").field("name", &self.name).finish()
    }
}

//! Task contracts
//!
//! Two kinds of deferred work are supported:
//! - [`PeriodicTask`]: recurs on calendar-unit boundaries, optionally every
//!   Nth boundary, until it reports itself destroyable.
//! - [`ScheduledTask`]: fires exactly once after an absolute delay.
//!
//! Full objects implement the traits directly when they need identity or
//! destroyability; bare closures go through [`PeriodicFn`] / [`ScheduledFn`].
//!
//! Task bodies run synchronously on the thread calling `tick()` and must be
//! short. Returning `Err` (or panicking) marks the run as failed.

mod adapters;

pub use adapters::{PeriodicFn, ScheduledFn};

use crate::calendar::DateTimeUnit;

/// Recurring work driven by calendar-boundary crossings.
pub trait PeriodicTask: Send + Sync {
    /// The work.
    fn do_periodic_task(&self) -> eyre::Result<()>;

    /// Calendar unit whose crossings drive this task.
    fn date_time_unit(&self) -> DateTimeUnit;

    /// Run every Nth crossing. Must be > 0.
    fn interval(&self) -> u32 {
        1
    }

    /// Checked after every run; once true the task is removed for good.
    fn is_destroyable(&self) -> bool {
        false
    }

    /// Label used in logs and reports.
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// One-shot work fired after a delay.
pub trait ScheduledTask: Send + Sync {
    /// The work.
    fn execute(&self) -> eyre::Result<()>;

    /// Label used in logs and reports.
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// Last path segment of a type name, generics dropped.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

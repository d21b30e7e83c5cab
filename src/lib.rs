//! Tickr - a tick-driven, in-process task scheduler
//!
//! Tickr runs two kinds of deferred work for a long-running process:
//! periodic tasks that recur on calendar-unit boundaries, and one-shot tasks
//! that fire once after a delay. The scheduler owns no threads or timers;
//! a host loop advances it by calling `tick()` at millisecond cadence.

pub mod calendar;
pub mod daemon;
pub mod definition;
pub mod error;
pub mod manager;
pub mod queue;
pub mod report;
pub mod task;

pub use calendar::{CalendarSnapshot, Clock, DateTimeUnit, ManualClock, SystemClock};
pub use definition::TaskDefinition;
pub use error::{Result, TickrError};
pub use manager::{PeriodicTaskManager, ScheduledTaskManager, Tickable};
pub use report::{ExecutionStats, LogReporter, RecordingReporter, TaskReporter};
pub use task::{PeriodicFn, PeriodicTask, ScheduledFn, ScheduledTask};

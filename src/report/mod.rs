//! Observability sink for task execution
//!
//! Managers never log directly about task outcomes; they hand events to a
//! [`TaskReporter`]. [`LogReporter`] forwards them as structured tracing
//! events, [`RecordingReporter`] keeps them in memory for inspection.

mod stats;

pub use stats::ExecutionStats;

use std::sync::Mutex;

use serde::Serialize;

/// Why a task left a manager's live set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalReason {
    /// Periodic task reported itself destroyable
    Destroyed,
    /// Periodic task failed while discard-on-error is enabled
    Discarded,
}

impl RemovalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalReason::Destroyed => "destroyed",
            RemovalReason::Discarded => "discarded",
        }
    }
}

impl std::fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Receiver for per-task timing and error reports.
pub trait TaskReporter: Send + Sync {
    /// A run took at least the manager's warning threshold.
    fn slow_task(&self, task: &str, elapsed_ms: u64, threshold_ms: u64);

    /// A run returned an error or panicked.
    fn task_failed(&self, task: &str, error: &eyre::Report);

    /// A periodic task was removed from the live set.
    fn task_removed(&self, _task: &str, _reason: RemovalReason) {}
}

/// Default reporter: structured tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl TaskReporter for LogReporter {
    fn slow_task(&self, task: &str, elapsed_ms: u64, threshold_ms: u64) {
        tracing::warn!(
            task = %task,
            elapsed_ms = elapsed_ms,
            threshold_ms = threshold_ms,
            "Slow task"
        );
    }

    fn task_failed(&self, task: &str, error: &eyre::Report) {
        tracing::error!(task = %task, error = %error, "Task failed");
    }

    fn task_removed(&self, task: &str, reason: RemovalReason) {
        tracing::debug!(task = %task, reason = %reason, "Task removed");
    }
}

/// A reported event, as captured by [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Slow { task: String, elapsed_ms: u64 },
    Failed { task: String, error: String },
    Removed { task: String, reason: RemovalReason },
}

/// Reporter that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<TaskEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event recorded so far.
    pub fn events(&self) -> Vec<TaskEvent> {
        self.lock().clone()
    }

    /// Names of tasks reported as failed, in report order.
    pub fn failures(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                TaskEvent::Failed { task, .. } => Some(task.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<TaskEvent>> {
        self.events.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn push(&self, event: TaskEvent) {
        self.lock().push(event);
    }
}

impl TaskReporter for RecordingReporter {
    fn slow_task(&self, task: &str, elapsed_ms: u64, _threshold_ms: u64) {
        self.push(TaskEvent::Slow {
            task: task.to_string(),
            elapsed_ms,
        });
    }

    fn task_failed(&self, task: &str, error: &eyre::Report) {
        self.push(TaskEvent::Failed {
            task: task.to_string(),
            error: error.to_string(),
        });
    }

    fn task_removed(&self, task: &str, reason: RemovalReason) {
        self.push(TaskEvent::Removed {
            task: task.to_string(),
            reason,
        });
    }
}

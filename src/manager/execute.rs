//! Timed, failure-contained execution of a single task run.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use crate::report::{ExecutionStats, TaskReporter};

/// Run one task body, timing it and containing any error or panic.
///
/// Returns `true` when the body completed without error.
pub(crate) fn run_timed<F>(
    name: &str,
    warning_elapsed_ms: u64,
    reporter: &dyn TaskReporter,
    stats: &mut ExecutionStats,
    body: F,
) -> bool
where
    F: FnOnce() -> eyre::Result<()>,
{
    let started = Instant::now();
    let result = contain(body).unwrap_or_else(|message| Err(eyre::eyre!("task panicked: {}", message)));
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    stats.executed += 1;
    if elapsed_ms >= warning_elapsed_ms {
        stats.slow += 1;
        reporter.slow_task(name, elapsed_ms, warning_elapsed_ms);
    }

    match result {
        Ok(()) => true,
        Err(e) => {
            stats.failed += 1;
            reporter.task_failed(name, &e);
            false
        }
    }
}

/// Run `f`, turning a panic into its message.
pub(crate) fn contain<R>(f: impl FnOnce() -> R) -> Result<R, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

/// A task's name, or a placeholder when `name()` itself panics.
pub(crate) fn task_label(name: impl FnOnce() -> String) -> String {
    contain(name).unwrap_or_else(|_| "<unnamed>".to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{RecordingReporter, TaskEvent};

    #[test]
    fn test_success_counts_execution() {
        let reporter = RecordingReporter::new();
        let mut stats = ExecutionStats::new();
        assert!(run_timed("ok", 10_000, &reporter, &mut stats, || Ok(())));
        assert_eq!(stats.executed, 1);
        assert_eq!(stats.failed, 0);
        assert!(reporter.events().is_empty());
    }

    #[test]
    fn test_error_is_reported() {
        let reporter = RecordingReporter::new();
        let mut stats = ExecutionStats::new();
        let ok = run_timed("bad", 10_000, &reporter, &mut stats, || Err(eyre::eyre!("nope")));
        assert!(!ok);
        assert_eq!(stats.failed, 1);
        assert_eq!(
            reporter.events(),
            vec![TaskEvent::Failed {
                task: "bad".to_string(),
                error: "nope".to_string()
            }]
        );
    }

    #[test]
    fn test_panic_is_contained() {
        let reporter = RecordingReporter::new();
        let mut stats = ExecutionStats::new();
        let ok = run_timed("panicky", 10_000, &reporter, &mut stats, || panic!("kaboom"));
        assert!(!ok);
        match &reporter.events()[0] {
            TaskEvent::Failed { task, error } => {
                assert_eq!(task, "panicky");
                assert!(error.contains("kaboom"), "got {}", error);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_contain_returns_value_or_message() {
        assert_eq!(contain(|| 7), Ok(7));
        assert_eq!(contain(|| -> u32 { panic!("hook broke") }), Err("hook broke".to_string()));
    }

    #[test]
    fn test_task_label_falls_back() {
        assert_eq!(task_label(|| "flush".to_string()), "flush");
        assert_eq!(task_label(|| panic!("no name")), "<unnamed>");
    }

    #[test]
    fn test_zero_threshold_always_warns() {
        let reporter = RecordingReporter::new();
        let mut stats = ExecutionStats::new();
        run_timed("any", 0, &reporter, &mut stats, || Ok(()));
        assert_eq!(stats.slow, 1);
        assert!(matches!(reporter.events()[0], TaskEvent::Slow { .. }));
    }

    #[test]
    fn test_slow_body_warns() {
        let reporter = RecordingReporter::new();
        let mut stats = ExecutionStats::new();
        run_timed("sleepy", 5, &reporter, &mut stats, || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok(())
        });
        match &reporter.events()[0] {
            TaskEvent::Slow { task, elapsed_ms } => {
                assert_eq!(task, "sleepy");
                assert!(*elapsed_ms >= 5);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}

//! Periodic task manager.
//!
//! Each tick refreshes a calendar snapshot, walks the live task list in
//! merge order and runs every task whose unit crossed a boundary since the
//! previous tick and whose interval count is satisfied. Registrations land
//! in a pending buffer and are merged after the walk.
//!
//! Counters, the live count and the live names sit outside the execution
//! lock, so a task body may inspect its own manager while the walk runs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::calendar::{CalendarSnapshot, Clock, DateTimeUnit, SystemClock};
use crate::error::{Result, TickrError};
use crate::report::{ExecutionStats, LogReporter, RemovalReason, TaskReporter};
use crate::task::{PeriodicFn, PeriodicTask};

use super::execute::{contain, run_timed, task_label};
use super::{Tickable, lock, same_task};

/// A live task, its label and its crossing counter.
struct TaskAndCounter {
    task: Arc<dyn PeriodicTask>,
    name: String,
    count: u32,
}

/// Execution-side state, guarded by the execution lock.
struct LiveSet {
    tasks: Vec<TaskAndCounter>,
    current: CalendarSnapshot,
    last: CalendarSnapshot,
}

/// Runs recurring work on calendar-unit boundaries.
///
/// `add_task` may be called from any thread at any time. `tick` must be
/// driven by a single caller and never overlap with itself.
pub struct PeriodicTaskManager {
    discard_error_task: bool,
    warning_elapsed_ms: u64,
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn TaskReporter>,
    pending: Mutex<Vec<Arc<dyn PeriodicTask>>>,
    live: Mutex<LiveSet>,
    stats: Mutex<ExecutionStats>,
    live_len: AtomicUsize,
    live_names: Mutex<Vec<String>>,
}

impl PeriodicTaskManager {
    /// Create a manager on the system clock, reporting through tracing.
    ///
    /// With `discard_error_task` set, a task whose run fails is removed.
    /// Runs taking at least `warning_elapsed_ms` are reported as slow.
    pub fn new(discard_error_task: bool, warning_elapsed_ms: u64) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let snapshot = CalendarSnapshot::from_datetime(&clock.now_local());
        Self {
            discard_error_task,
            warning_elapsed_ms,
            clock,
            reporter: Arc::new(LogReporter),
            pending: Mutex::new(Vec::new()),
            live: Mutex::new(LiveSet {
                tasks: Vec::new(),
                current: snapshot,
                last: snapshot,
            }),
            stats: Mutex::new(ExecutionStats::new()),
            live_len: AtomicUsize::new(0),
            live_names: Mutex::new(Vec::new()),
        }
    }

    /// Use a different wall-clock source. Resets both snapshots to its reading.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        let snapshot = CalendarSnapshot::from_datetime(&clock.now_local());
        let live = self
            .live
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        live.current = snapshot;
        live.last = snapshot;
        self.clock = clock;
        self
    }

    /// Send slow-task and failure reports somewhere other than tracing.
    pub fn with_reporter(mut self, reporter: Arc<dyn TaskReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn discard_error_task(&self) -> bool {
        self.discard_error_task
    }

    pub fn warning_elapsed_ms(&self) -> u64 {
        self.warning_elapsed_ms
    }

    /// Register a task. It becomes eligible from the tick after the next merge.
    ///
    /// Rejects a zero interval immediately. The calendar unit cannot be
    /// missing here; declarative definitions check for it when built.
    pub fn add_task(&self, task: Arc<dyn PeriodicTask>) -> Result<()> {
        let interval = task.interval();
        if interval == 0 {
            return Err(TickrError::InvalidInterval {
                task: task.name().to_string(),
                interval,
            });
        }

        tracing::debug!(
            task = %task.name(),
            unit = %task.date_time_unit(),
            interval = interval,
            "Periodic task queued"
        );
        lock(&self.pending).push(task);
        Ok(())
    }

    /// Register a closure as a named task running on every crossing of `unit`.
    pub fn add_fn<F>(&self, name: impl Into<String>, unit: DateTimeUnit, body: F) -> Result<()>
    where
        F: Fn() -> eyre::Result<()> + Send + Sync + 'static,
    {
        self.add_task(Arc::new(PeriodicFn::new(name, unit, body)))
    }

    /// Run every task whose unit crossed a boundary, then merge pending tasks.
    pub fn tick(&self) {
        let mut pass = ExecutionStats {
            ticks: 1,
            ..Default::default()
        };

        {
            let mut guard = lock(&self.live);
            let LiveSet { tasks, current, last } = &mut *guard;

            *current = CalendarSnapshot::from_datetime(&self.clock.now_local());
            let (now, previous) = (*current, *last);

            let before = tasks.len();
            tasks.retain_mut(|entry| match contain(|| self.visit(&mut *entry, &now, &previous, &mut pass)) {
                Ok(keep) => keep,
                Err(message) => self.hook_panicked(entry, &message, &mut pass),
            });
            if tasks.len() != before {
                self.publish(tasks);
            }

            *last = now;
        }

        lock(&self.stats).absorb(&pass);
        self.merge_pending();
    }

    /// Evaluate one live task. Returns whether it stays live.
    fn visit(
        &self,
        entry: &mut TaskAndCounter,
        current: &CalendarSnapshot,
        last: &CalendarSnapshot,
        pass: &mut ExecutionStats,
    ) -> bool {
        if !current.crossed(last, entry.task.date_time_unit()) {
            return true;
        }

        entry.count += 1;
        if entry.count < entry.task.interval() {
            return true;
        }
        entry.count = 0;

        let task = &entry.task;
        let name = entry.name.as_str();
        let ok = run_timed(name, self.warning_elapsed_ms, self.reporter.as_ref(), pass, || {
            task.do_periodic_task()
        });

        let removal = if !ok && self.discard_error_task {
            Some(RemovalReason::Discarded)
        } else if task.is_destroyable() {
            Some(RemovalReason::Destroyed)
        } else {
            None
        };

        match removal {
            Some(reason) => {
                pass.removed += 1;
                self.reporter.task_removed(name, reason);
                false
            }
            None => true,
        }
    }

    /// A task's unit, interval or destroy hook panicked. Same policy as a failed run.
    fn hook_panicked(&self, entry: &TaskAndCounter, message: &str, pass: &mut ExecutionStats) -> bool {
        pass.failed += 1;
        let error = eyre::eyre!("task hook panicked: {}", message);
        self.reporter.task_failed(&entry.name, &error);

        if !self.discard_error_task {
            return true;
        }
        pass.removed += 1;
        self.reporter.task_removed(&entry.name, RemovalReason::Discarded);
        false
    }

    /// Refresh the view served to readers. Called under the execution lock.
    fn publish(&self, tasks: &[TaskAndCounter]) {
        self.live_len.store(tasks.len(), Ordering::Release);
        *lock(&self.live_names) = tasks.iter().map(|entry| entry.name.clone()).collect();
    }

    /// Move pending registrations into the live set, skipping tasks already live.
    fn merge_pending(&self) {
        let drained = std::mem::take(&mut *lock(&self.pending));
        if drained.is_empty() {
            return;
        }

        let mut merged = 0;
        {
            let mut live = lock(&self.live);
            for task in drained {
                let name = task_label(|| task.name().to_string());
                if live.tasks.iter().any(|entry| same_task(&entry.task, &task)) {
                    tracing::debug!(task = %name, "Periodic task already registered, skipping");
                    continue;
                }
                live.tasks.push(TaskAndCounter { task, name, count: 0 });
                merged += 1;
            }
            self.publish(&live.tasks);

            tracing::debug!(merged = merged, live = live.tasks.len(), "Merged pending periodic tasks");
        }

        lock(&self.stats).merged += merged;
    }

    /// Number of live tasks.
    pub fn len(&self) -> usize {
        self.live_len.load(Ordering::Acquire)
    }

    /// Number of registrations waiting for the next merge.
    pub fn pending_len(&self) -> usize {
        lock(&self.pending).len()
    }

    /// No live and no pending tasks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.pending_len() == 0
    }

    /// Names of live tasks in execution order.
    pub fn task_names(&self) -> Vec<String> {
        lock(&self.live_names).clone()
    }

    /// Counters as of the last completed tick or merge.
    pub fn stats(&self) -> ExecutionStats {
        lock(&self.stats).clone()
    }
}

impl Tickable for PeriodicTaskManager {
    fn tick(&self) {
        PeriodicTaskManager::tick(self);
    }

    fn name(&self) -> &str {
        "periodic"
    }
}

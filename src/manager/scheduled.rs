//! One-shot scheduled task manager.
//!
//! Tasks are queued with an absolute fire time computed at `schedule()`.
//! Each tick pops and runs every due entry in ascending time order and
//! stops at the first entry that is not due yet.
//!
//! Counters, the queue length and the next fire time sit outside the
//! execution lock, so a task body may inspect its own manager.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::calendar::{Clock, SystemClock};
use crate::queue::TimeQueue;
use crate::report::{ExecutionStats, LogReporter, TaskReporter};
use crate::task::{ScheduledFn, ScheduledTask};

use super::execute::{run_timed, task_label};
use super::{Tickable, lock};

/// A registration waiting in the pending buffer.
struct ScheduledTaskWrapper {
    task: Arc<dyn ScheduledTask>,
    execute_time: i64,
}

/// Runs one-shot work after a delay, strictly in fire-time order.
///
/// `schedule` may be called from any thread at any time. `tick` must be
/// driven by a single caller and never overlap with itself.
pub struct ScheduledTaskManager {
    warning_elapsed_ms: u64,
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn TaskReporter>,
    pending: Mutex<Vec<ScheduledTaskWrapper>>,
    live: Mutex<TimeQueue<Arc<dyn ScheduledTask>>>,
    stats: Mutex<ExecutionStats>,
    live_len: AtomicUsize,
    next_execute: Mutex<Option<i64>>,
}

impl ScheduledTaskManager {
    /// Create a manager on the system clock, reporting through tracing.
    pub fn new(warning_elapsed_ms: u64) -> Self {
        Self {
            warning_elapsed_ms,
            clock: Arc::new(SystemClock),
            reporter: Arc::new(LogReporter),
            pending: Mutex::new(Vec::new()),
            live: Mutex::new(TimeQueue::new()),
            stats: Mutex::new(ExecutionStats::new()),
            live_len: AtomicUsize::new(0),
            next_execute: Mutex::new(None),
        }
    }

    /// Use a different wall-clock source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Send slow-task and failure reports somewhere other than tracing.
    pub fn with_reporter(mut self, reporter: Arc<dyn TaskReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn warning_elapsed_ms(&self) -> u64 {
        self.warning_elapsed_ms
    }

    /// Queue `task` to run once `delay_ms` from now. Returns the fire time.
    ///
    /// Every call queues an independent run, even for the same task object.
    pub fn schedule(&self, delay_ms: u64, task: Arc<dyn ScheduledTask>) -> i64 {
        let delay = i64::try_from(delay_ms).unwrap_or(i64::MAX);
        let execute_time = self.clock.now_millis().saturating_add(delay);

        tracing::debug!(
            task = %task.name(),
            delay_ms = delay_ms,
            execute_time = execute_time,
            "Scheduled task queued"
        );
        lock(&self.pending).push(ScheduledTaskWrapper { task, execute_time });
        execute_time
    }

    /// Queue `task` for the first tick after the next merge.
    pub fn schedule_now(&self, task: Arc<dyn ScheduledTask>) -> i64 {
        self.schedule(0, task)
    }

    /// Queue a closure as a named one-shot task.
    pub fn schedule_fn<F>(&self, delay_ms: u64, name: impl Into<String>, body: F) -> i64
    where
        F: Fn() -> eyre::Result<()> + Send + Sync + 'static,
    {
        self.schedule(delay_ms, Arc::new(ScheduledFn::new(name, body)))
    }

    /// Run every due task in fire-time order, then merge pending tasks.
    pub fn tick(&self) {
        let mut pass = ExecutionStats {
            ticks: 1,
            ..Default::default()
        };

        {
            let mut tasks = lock(&self.live);
            let now = self.clock.now_millis();

            while let Some((_, task)) = tasks.pop_due(now) {
                pass.removed += 1;
                let name = task_label(|| task.name().to_string());
                run_timed(&name, self.warning_elapsed_ms, self.reporter.as_ref(), &mut pass, || {
                    task.execute()
                });
            }
            if pass.removed > 0 {
                self.publish(&tasks);
            }
        }

        lock(&self.stats).absorb(&pass);
        self.merge_pending();
    }

    /// Refresh the view served to readers. Called under the execution lock.
    fn publish(&self, tasks: &TimeQueue<Arc<dyn ScheduledTask>>) {
        self.live_len.store(tasks.len(), Ordering::Release);
        *lock(&self.next_execute) = tasks.peek_time();
    }

    /// Move pending registrations into the time-ordered queue.
    fn merge_pending(&self) {
        let drained = std::mem::take(&mut *lock(&self.pending));
        if drained.is_empty() {
            return;
        }

        let merged = drained.len() as u64;
        {
            let mut tasks = lock(&self.live);
            for wrapper in drained {
                tasks.push(wrapper.execute_time, wrapper.task);
            }
            self.publish(&tasks);

            tracing::debug!(merged = merged, queued = tasks.len(), "Merged pending scheduled tasks");
        }

        lock(&self.stats).merged += merged;
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.live_len.load(Ordering::Acquire)
    }

    /// Number of registrations waiting for the next merge.
    pub fn pending_len(&self) -> usize {
        lock(&self.pending).len()
    }

    /// No queued and no pending tasks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.pending_len() == 0
    }

    /// Fire time of the earliest queued task, in epoch milliseconds.
    pub fn next_execute_time(&self) -> Option<i64> {
        *lock(&self.next_execute)
    }

    /// Counters as of the last completed tick or merge.
    pub fn stats(&self) -> ExecutionStats {
        lock(&self.stats).clone()
    }
}

impl Tickable for ScheduledTaskManager {
    fn tick(&self) {
        ScheduledTaskManager::tick(self);
    }

    fn name(&self) -> &str {
        "scheduled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::ManualClock;
    use crate::report::{RecordingReporter, TaskEvent};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ScheduledTask for Recorder {
        fn execute(&self) -> eyre::Result<()> {
            self.log.lock().unwrap().push(self.label);
            Ok(())
        }

        fn name(&self) -> &str {
            self.label
        }
    }

    fn manager() -> (ScheduledTaskManager, Arc<ManualClock>, Arc<RecordingReporter>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let reporter = Arc::new(RecordingReporter::new());
        let manager = ScheduledTaskManager::new(10_000)
            .with_clock(clock.clone())
            .with_reporter(reporter.clone());
        (manager, clock, reporter)
    }

    #[test]
    fn test_schedule_computes_fire_time_at_call() {
        let (manager, clock, _) = manager();
        let at = manager.schedule_fn(250, "t", || Ok(()));
        assert_eq!(at, 1_000_250);

        // Merging later does not move the fire time
        clock.advance_millis(100);
        manager.tick();
        assert_eq!(manager.next_execute_time(), Some(1_000_250));
    }

    #[test]
    fn test_runs_in_fire_time_order() {
        let (manager, clock, _) = manager();
        let log = Arc::new(Mutex::new(Vec::new()));
        for (delay, label) in [(300, "300ms"), (100, "100ms"), (200, "200ms")] {
            manager.schedule(delay, Arc::new(Recorder { label, log: log.clone() }));
        }
        manager.tick();

        for _ in 0..40 {
            clock.advance_millis(10);
            manager.tick();
        }
        assert_eq!(*log.lock().unwrap(), vec!["100ms", "200ms", "300ms"]);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_only_due_tasks_run() {
        let (manager, clock, _) = manager();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        manager.schedule_fn(500, "later", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        manager.tick();

        clock.advance_millis(499);
        manager.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(manager.len(), 1);

        clock.advance_millis(1);
        manager.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(manager.len(), 0);
    }

    #[test]
    fn test_schedule_now_waits_for_merge() {
        let (manager, _, _) = manager();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        manager.schedule_now(Arc::new(ScheduledFn::new("now", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })));

        manager.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        manager.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        manager.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_same_task_scheduled_twice_runs_twice() {
        let (manager, clock, _) = manager();
        let log = Arc::new(Mutex::new(Vec::new()));
        let task: Arc<dyn ScheduledTask> = Arc::new(Recorder {
            label: "dup",
            log: log.clone(),
        });
        manager.schedule(10, task.clone());
        manager.schedule(10, task);
        manager.tick();
        assert_eq!(manager.len(), 2);

        clock.advance_millis(10);
        manager.tick();
        assert_eq!(*log.lock().unwrap(), vec!["dup", "dup"]);
    }

    #[test]
    fn test_failed_task_removed_and_reported() {
        let (manager, _, reporter) = manager();
        manager.schedule_fn(0, "broken", || Err(eyre::eyre!("no route")));
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        manager.schedule_fn(0, "healthy", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        manager.tick();
        manager.tick();
        manager.tick();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(manager.is_empty());
        assert_eq!(
            reporter.events(),
            vec![TaskEvent::Failed {
                task: "broken".to_string(),
                error: "no route".to_string()
            }]
        );
        let stats = manager.stats();
        assert_eq!(stats.executed, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.removed, 2);
    }

    #[test]
    fn test_task_scheduled_from_inside_tick_runs_later() {
        let clock = Arc::new(ManualClock::new(0));
        let manager = Arc::new(ScheduledTaskManager::new(10_000).with_clock(clock.clone()));
        let hits = Arc::new(AtomicUsize::new(0));

        let handle = Arc::downgrade(&manager);
        let counter = hits.clone();
        manager.schedule_fn(0, "parent", move || {
            if let Some(manager) = handle.upgrade() {
                let counter = counter.clone();
                manager.schedule_fn(0, "child", move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                });
            }
            Ok(())
        });

        manager.tick(); // merge parent
        manager.tick(); // run parent, merge child
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        manager.tick(); // run child
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_task_can_inspect_its_manager_during_tick() {
        let clock = Arc::new(ManualClock::new(0));
        let manager = Arc::new(ScheduledTaskManager::new(10_000).with_clock(clock.clone()));
        let seen = Arc::new(Mutex::new(None));

        let handle = Arc::downgrade(&manager);
        let out = seen.clone();
        manager.schedule_fn(10, "inspector", move || {
            if let Some(manager) = handle.upgrade() {
                *out.lock().unwrap() = Some((
                    manager.len(),
                    manager.is_empty(),
                    manager.next_execute_time(),
                    manager.stats().merged,
                ));
            }
            Ok(())
        });
        manager.schedule_fn(500, "later", || Ok(()));
        manager.tick();
        clock.advance_millis(10);

        // Drive the tick on another thread so a lock cycle fails the test instead of hanging it
        let (done_tx, done_rx) = std::sync::mpsc::channel();
        let driver = manager.clone();
        std::thread::spawn(move || {
            driver.tick();
            let _ = done_tx.send(());
        });
        done_rx
            .recv_timeout(std::time::Duration::from_secs(3))
            .expect("tick did not finish");

        // The reader sees the queue as published before this tick's walk
        assert_eq!(*seen.lock().unwrap(), Some((2, false, Some(10), 2)));
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.next_execute_time(), Some(500));
        assert_eq!(manager.stats().executed, 1);
    }

    #[test]
    fn test_tickable_delegates() {
        let (manager, _, _) = manager();
        let tickable: &dyn Tickable = &manager;
        tickable.tick();
        assert_eq!(tickable.name(), "scheduled");
        assert_eq!(manager.stats().ticks, 1);
    }
}

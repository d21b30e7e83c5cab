//! Heartbeat - the host loop that drives the managers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::manager::Tickable;

use super::tick::{TickConfig, TickState};

/// Ticks a set of managers at a fixed cadence on the calling thread.
pub struct Heartbeat {
    config: TickConfig,
    targets: Vec<Arc<dyn Tickable>>,
    state: TickState,
    shutdown: Arc<AtomicBool>,
}

impl Heartbeat {
    /// Create a heartbeat with no targets.
    pub fn new(config: TickConfig) -> Self {
        Self {
            config,
            targets: Vec::new(),
            state: TickState::new(),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add a manager to tick on every pass.
    pub fn with_target(mut self, target: Arc<dyn Tickable>) -> Self {
        self.add_target(target);
        self
    }

    /// Add a manager to tick on every pass.
    pub fn add_target(&mut self, target: Arc<dyn Tickable>) {
        tracing::debug!(target = %target.name(), "Heartbeat target added");
        self.targets.push(target);
    }

    /// Flag that stops [`Heartbeat::run`] when set from any thread.
    pub fn shutdown_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn state(&self) -> &TickState {
        &self.state
    }

    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    /// Tick every target once. Returns how long the pass took.
    pub fn tick_once(&mut self) -> Duration {
        let started = Instant::now();
        for target in &self.targets {
            target.tick();
        }
        let elapsed = started.elapsed();

        if self.state.record_pass(elapsed, self.config.tick_interval) {
            let elapsed_ms = elapsed.as_millis();
            let interval_ms = self.config.tick_interval.as_millis();
            tracing::warn!(elapsed_ms, interval_ms, "Heartbeat pass overran interval");
        }
        elapsed
    }

    /// Run until the shutdown signal is set.
    pub fn run(&mut self) {
        let interval_ms = self.config.tick_interval.as_millis();
        tracing::info!(targets = self.targets.len(), interval_ms, "Heartbeat starting");

        while !self.shutdown.load(Ordering::Relaxed) {
            let elapsed = self.tick_once();
            std::thread::sleep(self.config.remaining(elapsed));
        }

        self.state.request_shutdown();
        tracing::info!(ticks = self.state.tick_count, "Heartbeat stopped");
    }

    /// Run for roughly `duration`, or until the shutdown signal is set.
    pub fn run_for(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while !self.shutdown.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let elapsed = self.tick_once();
            let sleep = self.config.remaining(elapsed).min(deadline.saturating_duration_since(Instant::now()));
            std::thread::sleep(sleep);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    #[derive(Default)]
    struct CountingTarget {
        ticks: AtomicU64,
    }

    impl Tickable for CountingTarget {
        fn tick(&self) {
            self.ticks.fetch_add(1, Ordering::SeqCst);
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_tick_once_ticks_every_target() {
        let a = Arc::new(CountingTarget::default());
        let b = Arc::new(CountingTarget::default());
        let mut heartbeat = Heartbeat::new(TickConfig::default())
            .with_target(a.clone())
            .with_target(b.clone());

        heartbeat.tick_once();
        heartbeat.tick_once();

        assert_eq!(a.ticks.load(Ordering::SeqCst), 2);
        assert_eq!(b.ticks.load(Ordering::SeqCst), 2);
        assert_eq!(heartbeat.state().tick_count, 2);
    }

    #[test]
    fn test_run_for_stops_at_deadline() {
        let target = Arc::new(CountingTarget::default());
        let mut heartbeat = Heartbeat::new(TickConfig::from_millis(5)).with_target(target.clone());

        let started = Instant::now();
        heartbeat.run_for(Duration::from_millis(60));

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(target.ticks.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_run_stops_on_shutdown_signal() {
        let target = Arc::new(CountingTarget::default());
        let mut heartbeat = Heartbeat::new(TickConfig::from_millis(1)).with_target(target.clone());
        let shutdown = heartbeat.shutdown_signal();

        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            shutdown.store(true, Ordering::Relaxed);
        });
        heartbeat.run();
        stopper.join().unwrap();

        assert!(heartbeat.state().shutdown_requested);
        assert!(target.ticks.load(Ordering::SeqCst) >= 1);
    }
}

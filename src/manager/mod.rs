//! Tick-driven task managers
//!
//! - **PeriodicTaskManager**: recurring tasks on calendar-unit boundaries.
//! - **ScheduledTaskManager**: one-shot tasks in fire-time order.
//!
//! # Pending/merge protocol
//!
//! Both managers keep two independently locked structures:
//! 1. A pending buffer that registrations append to from any thread.
//! 2. A live structure that only `tick()` walks.
//!
//! At the end of each tick the pending buffer is drained under its own lock,
//! the lock is released, and the drained entries are appended to the live
//! structure under the execution lock. The two locks are never held at once,
//! so registering never waits on a running tick and a registration made
//! during a tick is first seen by the next one.
//!
//! Managers own no threads. A host calls `tick()` (see [`crate::daemon`]).

mod execute;
mod periodic;
mod scheduled;

pub use periodic::PeriodicTaskManager;
pub use scheduled::ScheduledTaskManager;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Something a host loop advances by repeated `tick()` calls.
pub trait Tickable: Send + Sync {
    /// Do whatever work is due. Must not be called concurrently with itself.
    fn tick(&self);

    /// Label used in host-loop logs.
    fn name(&self) -> &str;
}

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Identity comparison of two task handles, ignoring vtables.
pub(crate) fn same_task<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

//! Daemon Core - the host loop driving the task managers
//!
//! The daemon side owns the managers (by `Arc` handle) and:
//! - Ticks each manager at a fixed millisecond cadence
//! - Tracks pass timing and overruns
//! - Stops on a shared shutdown flag
//!
//! Producers that register work get clones of the same handles; there is
//! no global registry.

pub mod heartbeat;
pub mod tick;

pub use heartbeat::*;
pub use tick::*;

//! Calendar model for periodic scheduling
//!
//! - **Units**: the granularities a periodic task can recur on.
//! - **Snapshots**: wall-clock time broken into calendar fields, compared
//!   tick-to-tick to detect boundary crossings.
//! - **Clocks**: the wall-clock source managers read from.

mod clock;
mod snapshot;
mod unit;

pub use clock::{Clock, ManualClock, SystemClock};
pub use snapshot::CalendarSnapshot;
pub use unit::DateTimeUnit;

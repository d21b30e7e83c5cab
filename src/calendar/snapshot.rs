//! Calendar snapshots and boundary-crossing detection.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::DateTimeUnit;

/// Wall-clock date/time broken into the fields periodic tasks recur on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSnapshot {
    pub second: u32,
    pub minute: u32,
    pub hour: u32,
    /// Day of month (1-31)
    pub day: u32,
    /// ISO week of year (1-53)
    pub week: u32,
    /// Month (1-12)
    pub month: u32,
    pub year: i32,
}

impl CalendarSnapshot {
    /// Break a local wall-clock time into calendar fields.
    pub fn from_datetime(at: &NaiveDateTime) -> Self {
        Self {
            second: at.second(),
            minute: at.minute(),
            hour: at.hour(),
            day: at.day(),
            week: at.iso_week().week(),
            month: at.month(),
            year: at.year(),
        }
    }

    /// Whether `unit` crossed a boundary between `last` and `self`.
    ///
    /// Second through week chain: a unit counts as crossed when it or any
    /// coarser unit up to week changed. Month and year are compared on
    /// their own and never feed the finer units.
    pub fn crossed(&self, last: &CalendarSnapshot, unit: DateTimeUnit) -> bool {
        let week = self.week != last.week;
        let day = week || self.day != last.day;
        let hour = day || self.hour != last.hour;
        let minute = hour || self.minute != last.minute;
        let second = minute || self.second != last.second;

        match unit {
            DateTimeUnit::Second => second,
            DateTimeUnit::Minute => minute,
            DateTimeUnit::Hour => hour,
            DateTimeUnit::Day => day,
            DateTimeUnit::Week => week,
            DateTimeUnit::Month => self.month != last.month,
            DateTimeUnit::Year => self.year != last.year,
        }
    }
}

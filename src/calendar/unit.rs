//! Calendar units a periodic task can recur on.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TickrError;

/// Calendar unit whose boundary crossings drive a periodic task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DateTimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    /// ISO week of year
    Week,
    Month,
    Year,
}

impl DateTimeUnit {
    /// Every unit, finest first.
    pub const ALL: [DateTimeUnit; 7] = [
        DateTimeUnit::Second,
        DateTimeUnit::Minute,
        DateTimeUnit::Hour,
        DateTimeUnit::Day,
        DateTimeUnit::Week,
        DateTimeUnit::Month,
        DateTimeUnit::Year,
    ];

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DateTimeUnit::Second => "second",
            DateTimeUnit::Minute => "minute",
            DateTimeUnit::Hour => "hour",
            DateTimeUnit::Day => "day",
            DateTimeUnit::Week => "week",
            DateTimeUnit::Month => "month",
            DateTimeUnit::Year => "year",
        }
    }
}

impl std::fmt::Display for DateTimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DateTimeUnit {
    type Err = TickrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let wanted = wanted.strip_suffix('s').unwrap_or(wanted.as_str());
        DateTimeUnit::ALL
            .into_iter()
            .find(|unit| unit.as_str() == wanted)
            .ok_or_else(|| TickrError::UnknownTimeUnit(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_matches_display() {
        for unit in DateTimeUnit::ALL {
            assert_eq!(unit.to_string(), unit.as_str());
        }
    }

    #[test]
    fn test_from_str_accepts_case_and_plural() {
        assert_eq!("second".parse::<DateTimeUnit>().unwrap(), DateTimeUnit::Second);
        assert_eq!("Minutes".parse::<DateTimeUnit>().unwrap(), DateTimeUnit::Minute);
        assert_eq!(" WEEK ".parse::<DateTimeUnit>().unwrap(), DateTimeUnit::Week);
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        let err = "fortnight".parse::<DateTimeUnit>().unwrap_err();
        assert!(matches!(err, TickrError::UnknownTimeUnit(ref s) if s == "fortnight"));
    }

    #[test]
    fn test_serde_lowercase() {
        let yaml = serde_yaml::to_string(&DateTimeUnit::Month).unwrap();
        assert_eq!(yaml.trim(), "month");
        let unit: DateTimeUnit = serde_yaml::from_str("year").unwrap();
        assert_eq!(unit, DateTimeUnit::Year);
    }
}

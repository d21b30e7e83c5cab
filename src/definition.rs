//! Declarative periodic task definitions
//!
//! Hosts can describe periodic tasks in configuration and attach a body at
//! startup. Definitions are validated when built, so a missing unit or a
//! zero interval is rejected before anything reaches a manager.

use serde::{Deserialize, Serialize};

use crate::calendar::DateTimeUnit;
use crate::error::{Result, TickrError};
use crate::task::PeriodicFn;

/// A periodic task as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Label used in logs
    pub name: String,
    /// Calendar unit driving the task
    #[serde(default)]
    pub unit: Option<DateTimeUnit>,
    /// Run every Nth crossing
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Remove the task after this many runs
    #[serde(default)]
    pub runs: Option<u64>,
}

fn default_interval() -> u32 {
    1
}

impl TaskDefinition {
    /// Create a definition running on every crossing of `unit`.
    pub fn new(name: impl Into<String>, unit: DateTimeUnit) -> Self {
        Self {
            name: name.into(),
            unit: Some(unit),
            interval: default_interval(),
            runs: None,
        }
    }

    /// Check the definition and return its unit.
    pub fn validate(&self) -> Result<DateTimeUnit> {
        let unit = self.unit.ok_or_else(|| TickrError::MissingTimeUnit {
            task: self.name.clone(),
        })?;
        if self.interval == 0 {
            return Err(TickrError::InvalidInterval {
                task: self.name.clone(),
                interval: self.interval,
            });
        }
        Ok(unit)
    }

    /// Attach a body, producing a registrable task.
    pub fn build<F>(&self, body: F) -> Result<PeriodicFn>
    where
        F: Fn() -> eyre::Result<()> + Send + Sync + 'static,
    {
        let unit = self.validate()?;
        let task = PeriodicFn::new(self.name.clone(), unit, body).every(self.interval);
        Ok(match self.runs {
            Some(runs) => task.limit(runs),
            None => task,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::PeriodicTask;

    #[test]
    fn test_parse_with_defaults() {
        let def: TaskDefinition = serde_yaml::from_str("name: heartbeat\nunit: second\n").unwrap();
        assert_eq!(def, TaskDefinition::new("heartbeat", DateTimeUnit::Second));
        assert_eq!(def.interval, 1);
        assert_eq!(def.runs, None);
    }

    #[test]
    fn test_parse_full() {
        let yaml = "name: rollup\nunit: hour\ninterval: 6\nruns: 4\n";
        let def: TaskDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.unit, Some(DateTimeUnit::Hour));
        assert_eq!(def.interval, 6);
        assert_eq!(def.runs, Some(4));
    }

    #[test]
    fn test_parse_rejects_unknown_unit() {
        let result = serde_yaml::from_str::<TaskDefinition>("name: x\nunit: fortnight\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_unit_rejected() {
        let def: TaskDefinition = serde_yaml::from_str("name: orphan\n").unwrap();
        let err = def.validate().unwrap_err();
        assert!(matches!(err, TickrError::MissingTimeUnit { ref task } if task == "orphan"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut def = TaskDefinition::new("never", DateTimeUnit::Day);
        def.interval = 0;
        assert!(matches!(def.build(|| Ok(())), Err(TickrError::InvalidInterval { .. })));
    }

    #[test]
    fn test_build_carries_settings() {
        let mut def = TaskDefinition::new("report", DateTimeUnit::Minute);
        def.interval = 15;
        def.runs = Some(1);

        let task = def.build(|| Ok(())).unwrap();
        assert_eq!(task.name(), "report");
        assert_eq!(task.date_time_unit(), DateTimeUnit::Minute);
        assert_eq!(task.interval(), 15);
        task.do_periodic_task().unwrap();
        assert!(task.is_destroyable());
    }
}

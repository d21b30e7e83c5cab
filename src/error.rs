//! Error types for Tickr
//!
//! Centralized error handling using thiserror. Task-body failures are not
//! represented here: they are `eyre::Report`s contained by the managers.

use thiserror::Error;

/// All error types that can occur in Tickr
#[derive(Debug, Error)]
pub enum TickrError {
    /// Periodic task registered with a non-positive interval
    #[error("Invalid interval for task {task}: {interval} (must be > 0)")]
    InvalidInterval { task: String, interval: u32 },

    /// Periodic task definition without a calendar unit
    #[error("Missing time unit for task {task}")]
    MissingTimeUnit { task: String },

    /// Calendar unit name that does not parse
    #[error("Unknown time unit: {0}")]
    UnknownTimeUnit(String),
}

/// Result type alias for Tickr operations
pub type Result<T> = std::result::Result<T, TickrError>;

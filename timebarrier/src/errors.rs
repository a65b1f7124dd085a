//! Error types for the timebarrier crate.
//!
//! The barrier itself only ever produces one kind of failure, a
//! [`DeadlineExceeded`] delivered to a stage. [`BarrierError`] covers
//! misuse of the barrier and scheduler failures.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The distinguished error kind signaling that a guarded section was
/// abandoned because its time budget elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Error, Serialize, Deserialize)]
#[error("deadline exceeded")]
pub struct DeadlineExceeded;

/// The main error type for timebarrier operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarrierError {
    /// `initialize()` was called on a barrier that already armed its timer.
    #[error("Barrier already initialized: the timer is armed once per barrier")]
    AlreadyInitialized,

    /// `execute()` was called on a timed barrier before `initialize()`.
    #[error("Barrier not initialized: call initialize() before execute()")]
    NotInitialized,

    /// The scheduler could not register a timer.
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// A guarded section missed its deadline.
    #[error("{0}")]
    DeadlineExceeded(#[from] DeadlineExceeded),

    /// Configuration could not be parsed or is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BarrierError {
    /// Creates a scheduler error.
    #[must_use]
    pub fn scheduler(message: impl Into<String>) -> Self {
        Self::Scheduler(message.into())
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Returns true if this error is a deadline signal.
    #[must_use]
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded(_))
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let kind = match self {
            Self::AlreadyInitialized => "AlreadyInitialized",
            Self::NotInitialized => "NotInitialized",
            Self::Scheduler(_) => "SchedulerError",
            Self::DeadlineExceeded(_) => "DeadlineExceeded",
            Self::InvalidConfig(_) => "InvalidConfig",
        };

        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!(kind));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

impl From<serde_json::Error> for BarrierError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

/// Error delivered to a named pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Stage {stage} failed: {message}")]
pub struct StageError {
    /// Stage that failed.
    pub stage: String,
    /// Original error message.
    pub message: String,
    /// Whether the failure was a missed deadline.
    pub deadline_exceeded: bool,
}

impl StageError {
    /// Creates a new stage error.
    #[must_use]
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            message: message.into(),
            deadline_exceeded: false,
        }
    }

    /// Sets the stage name, keeping the rest of the error.
    #[must_use]
    pub fn for_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = stage.into();
        self
    }
}

impl From<DeadlineExceeded> for StageError {
    fn from(err: DeadlineExceeded) -> Self {
        Self {
            stage: "<unnamed>".to_string(),
            message: err.to_string(),
            deadline_exceeded: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_exceeded_display() {
        assert_eq!(DeadlineExceeded.to_string(), "deadline exceeded");
    }

    #[test]
    fn test_barrier_error_from_deadline() {
        let err: BarrierError = DeadlineExceeded.into();
        assert!(err.is_deadline_exceeded());
        assert_eq!(err.to_string(), "deadline exceeded");
    }

    #[test]
    fn test_barrier_error_to_dict() {
        let dict = BarrierError::NotInitialized.to_dict();
        assert_eq!(dict.get("type").unwrap(), "NotInitialized");
        assert!(dict
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap()
            .contains("initialize()"));

        let dict = BarrierError::scheduler("runtime gone").to_dict();
        assert_eq!(dict.get("type").unwrap(), "SchedulerError");
    }

    #[test]
    fn test_stage_error_from_deadline() {
        let err = StageError::from(DeadlineExceeded).for_stage("enrich");
        assert_eq!(err.stage, "enrich");
        assert!(err.deadline_exceeded);
        assert!(err.to_string().contains("enrich"));
        assert!(err.to_string().contains("deadline exceeded"));
    }

    #[test]
    fn test_stage_error_new() {
        let err = StageError::new("store", "disk full");
        assert!(!err.deadline_exceeded);
        assert_eq!(err.to_string(), "Stage store failed: disk full");
    }

    #[test]
    fn test_invalid_json_maps_to_config_error() {
        let err: BarrierError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, BarrierError::InvalidConfig(_)));
    }
}

//! Threshold handler error types

use fm_platform::{NotificationGroupId, ObjectId};
use thiserror::Error;

/// Result type for handler operations
pub type Result<T> = std::result::Result<T, HandlerError>;

/// Handler errors
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Required alarm variable is absent
    #[error("Missing alarm variable: {0}")]
    MissingVar(String),

    /// Alarm variable has an unusable value
    #[error("Invalid alarm variable {key}: {reason}")]
    InvalidVar { key: String, reason: String },

    /// Metric type not in the catalogue
    #[error("Metric type not found: {0}")]
    MetricNotFound(String),

    /// Interface not found on the managed object
    #[error("Interface not found: {name} on managed object {managed_object}")]
    InterfaceNotFound { name: String, managed_object: ObjectId },

    /// Measurement unit the humanizer cannot scale
    #[error("Unsupported measure: {0}")]
    UnsupportedMeasure(String),

    /// Rate outside every humanizer bucket
    #[error("Invalid rate: {0}")]
    InvalidRate(f64),

    /// Notification group does not exist
    #[error("Invalid notification group {0}")]
    InvalidGroup(NotificationGroupId),

    /// Notification transport failed
    #[error("Sending notification error {0}")]
    Transport(String),

    /// Deferred call was rejected
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Platform port failure
    #[error("Platform error: {0}")]
    Platform(#[from] anyhow::Error),
}

impl HandlerError {
    /// Failures caused by the alarm or inventory contents rather than by the
    /// platform; enrichment logs these and carries on.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            HandlerError::MissingVar(_)
                | HandlerError::InvalidVar { .. }
                | HandlerError::MetricNotFound(_)
                | HandlerError::InterfaceNotFound { .. }
        )
    }

    pub fn missing_var(key: &str) -> Self {
        HandlerError::MissingVar(key.to_string())
    }

    pub fn invalid_var(key: &str, reason: impl Into<String>) -> Self {
        HandlerError::InvalidVar {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

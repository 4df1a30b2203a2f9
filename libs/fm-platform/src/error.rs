//! Platform error types

use thiserror::Error;

/// Result type for platform operations
pub type Result<T> = std::result::Result<T, PlatformError>;

/// Errors raised by the platform model and the in-memory backend
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Inventory fixture is inconsistent
    #[error("Invalid fixture: {0}")]
    Fixture(String),

    /// Notification transport failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Fixture file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Fixture file could not be parsed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

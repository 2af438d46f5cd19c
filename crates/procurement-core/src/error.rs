//! Error types for procurement-core

use thiserror::Error;

/// Result type alias using ProcurementError
pub type Result<T> = std::result::Result<T, ProcurementError>;

/// Error type alias for convenience
pub type Error = ProcurementError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for procurement-core
#[derive(Debug, Error)]
pub enum ProcurementError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Every search template failed; callers degrade to an empty hit list
    #[error("Search provider error: {0}")]
    SearchProvider(String),

    #[error("External service error: {0}")]
    ExternalError(String),

    #[error("Timed out after {0} ms")]
    Timeout(u64),

    /// Invariant violation inside the core; the only class that fails a workflow
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl ProcurementError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) | Self::Config(_) => exit_codes::INVALID_INPUT,
            _ => exit_codes::GENERAL_ERROR,
        }
    }

    /// Whether this error is caused by the caller's input rather than an upstream service
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Run a future under a deadline, mapping expiry to [`ProcurementError::Timeout`]
pub async fn with_timeout<T, F>(timeout: std::time::Duration, fut: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProcurementError::Timeout(timeout.as_millis() as u64)),
    }
}

//! Error types for the batch runner.
//!
//! Only setup problems end up here. Failures of individual regions or
//! archives are recorded in the batch report instead.

use thiserror::Error;

/// Errors that stop a batch before or after it runs.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Acquisition error: {0}")]
    AcquireError(#[from] landsat_acquire::AcquireError),

    #[error("Thread pool error: {0}")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),
}

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

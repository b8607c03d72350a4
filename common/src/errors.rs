//! Error types shared by all crates.
//!
//! Every failure of a run surfaces as an [`AppError`]; none of them are retried.

use thiserror::Error;

/// Result alias used across the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Application error taxonomy.
#[derive(Debug, Error)]
pub enum AppError {
    /// The data source rejected the supplied credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The data source could not be reached.
    #[error("data source unreachable: {0}")]
    Connectivity(String),

    /// A stats command failed for a database or collection.
    #[error("stats unavailable for {target}: {reason}")]
    StatsUnavailable { target: String, reason: String },

    /// A persisted snapshot is missing required fields or is inconsistent.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// Invalid option supplied at the boundary (unit, threshold, credentials).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Snapshot or report file I/O failure.
    #[error("io error")]
    Io(#[from] std::io::Error),

    /// JSON encoding failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Builds a [`AppError::StatsUnavailable`] for the given target.
    pub fn stats_unavailable(target: impl Into<String>, reason: impl ToString) -> Self {
        AppError::StatsUnavailable {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Authentication(_) => "AUTHENTICATION_ERROR",
            AppError::Connectivity(_) => "CONNECTIVITY_ERROR",
            AppError::StatsUnavailable { .. } => "STATS_UNAVAILABLE",
            AppError::MalformedSnapshot(_) => "MALFORMED_SNAPSHOT",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Process exit code for this error. Always non-zero.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Authentication(_) => 2,
            AppError::Connectivity(_) => 3,
            AppError::StatsUnavailable { .. } => 4,
            AppError::MalformedSnapshot(_) => 5,
            AppError::Configuration(_) => 6,
            AppError::Io(_) => 7,
            AppError::Serialization(_) => 8,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Configuration(err.to_string())
    }
}

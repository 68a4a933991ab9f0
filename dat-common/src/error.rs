//! Common error types for the DAT score workflow

use thiserror::Error;

/// Common result type for workflow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Request-level errors of the scoring workflow
///
/// Row-level scoring failures are not represented here; they are carried in
/// [`crate::ScoreOutcome::Failure`] and never abort a request.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or empty upload, empty column selection, bad parameter
    #[error("{0}")]
    InputValidation(String),

    /// Session token unknown or its backing storage has vanished
    #[error("{0} Please re-upload your CSV file.")]
    SessionExpired(String),

    /// A selected column is not part of the table header
    #[error("Column not found in uploaded file: {0}")]
    ColumnResolution(String),

    /// No scored output exists for the session
    #[error("No scored output is available for this session")]
    ArtifactNotFound,

    /// File I/O error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error while writing an artifact
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Session expiry caused by backing storage that is no longer on disk
    pub(crate) fn storage_gone() -> Self {
        Error::SessionExpired("The uploaded file is no longer available.".to_string())
    }

    /// Session expiry caused by an unknown or missing token
    pub fn unknown_session() -> Self {
        Error::SessionExpired("Session expired or invalid.".to_string())
    }
}

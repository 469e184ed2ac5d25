//! Core error types for studyroom-core.
//!
//! Recording failures never stop the timer: they are reported as
//! [`RecordingError`] values and turned into notices by the runtime.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

/// Core error type for studyroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local journal errors
    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    /// Session hand-off errors
    #[error("Recording error: {0}")]
    Recording(#[from] RecordingError),

    /// The timer runtime is gone
    #[error("Timer runtime has shut down")]
    RuntimeClosed,

    /// IO errors, e.g. building the async runtime
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Data directory could not be determined or created
    #[error("Cannot prepare data directory {path}: {message}")]
    DataDir { path: PathBuf, message: String },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown config key: {0}")]
    UnknownKey(String),
}

/// Local journal errors.
#[derive(Error, Debug)]
pub enum JournalError {
    /// Failed to open journal database
    #[error("Failed to open journal at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Stored row could not be decoded
    #[error("Corrupt journal row {id}: {message}")]
    CorruptRow { id: i64, message: String },

    /// Database is locked
    #[error("Journal is locked")]
    Locked,

    /// Goal target out of range
    #[error("Invalid goal: {0}")]
    InvalidGoal(String),
}

/// Session hand-off failures. Always non-fatal for the timer.
#[derive(Error, Debug)]
pub enum RecordingError {
    /// Transport failure talking to the session store
    #[error("Could not reach session store: {0}")]
    Network(#[from] reqwest::Error),

    /// The store answered with a non-success status
    #[error("Session store rejected the session (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// The store answered 2xx but the body was not a session
    #[error("Unexpected response from session store: {0}")]
    InvalidResponse(String),

    /// End time precedes start time
    #[error("Invalid session interval: end ({end}) is before start ({start})")]
    InvalidInterval {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// Store is unavailable for a reason other than transport
    #[error("Session store unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for JournalError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if matches!(
                    e.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                JournalError::Locked
            }
            _ => JournalError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

//! Error types for DealDesk.
//!
//! Library crates use [`DealDeskError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Every variant is recoverable: the data layer never treats a missing id,
//! a missing form field, or an unavailable integration as fatal.

use std::path::PathBuf;

/// Top-level error type for all DealDesk operations.
#[derive(Debug, thiserror::Error)]
pub enum DealDeskError {
    /// Mutation targeted an id that is not in its collection.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A required field was absent or blank.
    #[error("required field missing: {field}")]
    ValidationMissing { field: &'static str },

    /// Data validation error other than a missing field.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A placeholder CRM/Graph integration reported failure.
    #[error("integration unavailable: {0}")]
    IntegrationUnavailable(String),

    /// CSV import could not be parsed.
    #[error("malformed import{}: {message}", line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    MalformedImport { line: Option<u64>, message: String },

    /// Two writers claim the same resource (e.g. a contact list bound twice).
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// Persistent store or backend failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// `Result` with [`DealDeskError`] as the error.
pub type Result<T> = std::result::Result<T, DealDeskError>;

impl DealDeskError {
    /// Create a not-found error for an entity kind and id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create a missing-field error.
    pub fn missing(field: &'static str) -> Self {
        Self::ValidationMissing { field }
    }

    /// Free-form validation failure.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a conflict error from any displayable message.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict {
            message: msg.into(),
        }
    }

    /// Create a malformed-import error, optionally pinned to a CSV line.
    pub fn malformed_import(line: Option<u64>, msg: impl Into<String>) -> Self {
        Self::MalformedImport {
            line,
            message: msg.into(),
        }
    }

    /// Bad or unreadable configuration.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// I/O failure at `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// `true` for the "id does not exist" case callers routinely ignore.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for DealDeskError {
    fn from(e: serde_json::Error) -> Self {
        Self::Storage(format!("serialization failed: {e}"))
    }
}

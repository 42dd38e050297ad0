//! Backend error types.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors raised while executing or reading through a storage backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The database could not be reached, or a call timed out.
    #[error("connectivity failure: {0}")]
    Connectivity(String),

    /// Connection parameters could not be turned into a connection config.
    #[error("invalid connection parameters: {0}")]
    InvalidParams(#[from] crate::config::ConfigError),

    /// The backend rejected a statement.
    #[error("statement failed: {message} [sql: {sql_preview}]")]
    Statement {
        /// Error message from the backend.
        message: String,
        /// First characters of the offending statement.
        sql_preview: String,
    },

    /// The backend cannot run this kind of statement.
    #[error("{backend} backend does not support {operation}")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    /// A data file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A data file is not valid delimited text.
    #[error("failed to parse {path} at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A row does not have as many cells as the table has fields.
    /// Row 0 is a file's header line.
    #[error("table '{table}' row {row} has {found} values, expected {expected}")]
    Shape {
        table: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A file header names some declared fields but not this one.
    #[error("table '{table}' source has no column '{column}'")]
    MissingColumn { table: String, column: String },
}

impl BackendError {
    /// Create a statement error, keeping a bounded preview of the SQL.
    pub fn statement(message: impl Into<String>, sql: &str) -> Self {
        Self::Statement {
            message: message.into(),
            sql_preview: sql.chars().take(100).collect(),
        }
    }

    /// Check if this error means the backend could not be reached.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, BackendError::Connectivity(_))
    }

    /// Check if the backend rejected a statement.
    pub fn is_statement(&self) -> bool {
        matches!(self, BackendError::Statement { .. })
    }
}

//! Error types for sqlload ingestion and script execution
//!
//! Every failure is returned to the caller with enough context (value,
//! column, line or statement) to act on it. Nothing here is logged and
//! swallowed: the command layer decides how a failure ends the process.

use crate::schema::ColumnType;
use thiserror::Error;

/// Boxed error used for database-side causes, so test fakes can raise them
/// without a live driver.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, LoadError>;

#[derive(Error, Debug)]
pub enum LoadError {
    /// Malformed override document, separator or connection descriptor
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unreadable file or stream, including malformed CSV input
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A value does not match its column's declared type
    #[error("Parse error on line {line}: value '{value}' in column '{column}' (position {position}) is not a valid {expected}")]
    Parse {
        line: u64,
        column: String,
        position: usize,
        expected: ColumnType,
        value: String,
    },

    /// A record's field count differs from the header
    #[error("Schema error on line {line}: expected {expected} fields, found {found}")]
    Schema {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// The input has no header line to derive columns from
    #[error("Schema error: input has no header")]
    EmptyHeader,

    /// The database rejected a statement, a COPY chunk or a commit
    #[error("Execution error ({context}): {source}")]
    Execution {
        context: String,
        #[source]
        source: BoxError,
    },

    /// The connectivity probe ran out of attempts
    #[error("Connectivity error: could not reach the database (tried {attempts} times): {source}")]
    Connectivity {
        attempts: u32,
        #[source]
        source: BoxError,
    },

    /// Connecting to the database failed
    #[error("Could not connect to {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: BoxError,
    },
}

impl LoadError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an I/O error with what was being done when it happened
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an execution error
    pub fn execution(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Execution {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Whether the failure came from the input data rather than the database
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. } | Self::Schema { .. } | Self::EmptyHeader
        )
    }
}

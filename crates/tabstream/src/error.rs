//! Error types for record streaming

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::model::ColumnKind;

/// Why a record model rejected a line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The line split into the wrong number of fields
    #[error("expected {expected} fields, found {found}")]
    FieldCount {
        /// Number of configured columns
        expected: usize,
        /// Number of fields on the line
        found: usize,
    },

    /// A field could not be decoded as its column kind
    #[error("column `{column}`: {value:?} is not a valid {kind}")]
    InvalidField {
        /// Column name
        column: String,
        /// Expected kind
        kind: ColumnKind,
        /// Raw field text
        value: String,
    },

    /// Failure reported by a custom record model
    #[error("{0}")]
    Custom(String),
}

impl RecordError {
    /// Create a custom model error.
    pub fn custom(msg: impl Into<String>) -> Self {
        RecordError::Custom(msg.into())
    }
}

/// A line that failed to parse, tied to its position in the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line_number}: {reason}")]
pub struct MalformedRecordError {
    /// 1-based physical line number, blank lines included
    pub line_number: u64,
    /// The offending line
    pub line: String,
    /// What the model rejected
    #[source]
    pub reason: RecordError,
}

/// Errors produced while constructing or iterating a record stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Invalid or incomplete construction options
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The input path does not exist
    #[error("source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// A line was rejected by the record model
    #[error("malformed record at {0}")]
    Malformed(#[from] MalformedRecordError),

    /// Reading the underlying byte stream failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No record arrived within the configured wait timeout
    #[error("timed out waiting for a record after {timeout_ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// Iteration was cancelled through a cancel handle
    #[error("stream cancelled")]
    Cancelled,
}

impl StreamError {
    /// Create a configuration error with a message.
    pub fn config(msg: impl Into<String>) -> Self {
        StreamError::Configuration(msg.into())
    }

    /// Create a timeout error from the elapsed wait.
    pub fn timeout(wait: Duration) -> Self {
        StreamError::Timeout {
            timeout_ms: u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Whether iteration can meaningfully continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StreamError::Malformed(_) | StreamError::Timeout { .. })
    }

    /// Whether this error was raised at construction time.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            StreamError::Configuration(_) | StreamError::SourceNotFound(_)
        )
    }

    /// The malformed-line details, if this is a parse failure.
    pub fn as_malformed(&self) -> Option<&MalformedRecordError> {
        match self {
            StreamError::Malformed(e) => Some(e),
            _ => None,
        }
    }
}

/// Specialized Result type for stream operations
pub type StreamResult<T> = std::result::Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_recoverable() {
        let err = StreamError::timeout(Duration::from_millis(250));
        assert!(err.is_recoverable());
        assert!(matches!(err, StreamError::Timeout { timeout_ms: 250 }));

        let err = StreamError::config("missing columns");
        assert!(!err.is_recoverable());
        assert!(err.is_construction_error());
    }

    #[test]
    fn test_malformed_display_includes_line_number() {
        let err = MalformedRecordError {
            line_number: 7,
            line: "x".to_string(),
            reason: RecordError::FieldCount {
                expected: 2,
                found: 1,
            },
        };
        assert_eq!(err.to_string(), "line 7: expected 2 fields, found 1");

        let err = StreamError::from(err);
        assert!(err.as_malformed().is_some());
        assert_eq!(
            err.to_string(),
            "malformed record at line 7: expected 2 fields, found 1"
        );
    }
}

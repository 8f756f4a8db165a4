//! Error types for revision pointer operations.

use thiserror::Error;

/// Errors that can occur while reading or writing revision pointers.
#[derive(Debug, Error)]
pub enum RevisionError {
    /// A pointer file or name could not be interpreted.
    #[error("invalid pointer {name}: {reason}")]
    InvalidPointer { name: String, reason: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error during file-based pointer operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing store cannot be used (e.g. a poisoned lock).
    #[error("revision store unavailable: {0}")]
    Unavailable(String),
}

/// Convenience type alias for pointer operations.
pub type Result<T> = std::result::Result<T, RevisionError>;

//! Error types for the diff crate.

use pds_types::EntryHash;

/// Errors that can occur while committing, compacting, or rendering.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The parent named for a new entry is not a stored diff entry.
    #[error("invalid parent: {0}")]
    InvalidParent(EntryHash),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] pds_store::StoreError),

    /// Loading the revision graph failed.
    #[error("dag error: {0}")]
    Dag(#[from] pds_dag::DagError),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;

//! Error types for merge resolution.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    /// A merge needs at least two heads.
    #[error("merge needs at least two parents, got {0}")]
    TooFewParents(usize),

    #[error("store error: {0}")]
    Store(#[from] pds_store::StoreError),

    #[error("dag error: {0}")]
    Dag(#[from] pds_dag::DagError),

    #[error("diff error: {0}")]
    Diff(#[from] pds_diff::DiffError),
}

pub type MergeResult<T> = Result<T, MergeError>;

//! Error types for the revision DAG.

use pds_store::StoreError;
use pds_types::EntryHash;

/// Errors that can occur while loading or querying the revision DAG.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// A requested head is not in the entry store.
    #[error("entry not found: {0}")]
    MissingEntry(EntryHash),

    /// A parent reference points to an entry that is not in the store.
    #[error("dangling parent reference: entry {node} references missing parent {parent}")]
    DanglingParent {
        /// The entry containing the bad reference.
        node: EntryHash,
        /// The missing parent.
        parent: EntryHash,
    },

    /// The entry store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl DagError {
    /// The entry hash that could not be resolved, if that is what failed.
    pub fn unresolved(&self) -> Option<EntryHash> {
        match self {
            DagError::MissingEntry(id) => Some(*id),
            DagError::DanglingParent { parent, .. } => Some(*parent),
            DagError::Store(_) => None,
        }
    }
}

/// Convenience alias for DAG results.
pub type DagResult<T> = Result<T, DagError>;

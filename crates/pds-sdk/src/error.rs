use pds_dag::DagError;
use pds_diff::DiffError;
use pds_merge::MergeError;
use pds_store::StoreError;
use pds_types::EntryHash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PeerError {
    /// The entry store is unavailable or rejected a write.
    #[error("storage error: {0}")]
    Storage(StoreError),

    /// `current_revision` does not resolve to a stored entry.
    #[error("invalid parent: {0}")]
    InvalidParent(EntryHash),

    /// A pointer update names an entry that is not stored.
    #[error("unknown revision: {0}")]
    UnknownRevision(EntryHash),

    #[error("revision pointer error: {0}")]
    Revision(#[from] pds_revisions::RevisionError),

    #[error("sync error: {0}")]
    Sync(#[from] pds_sync::SyncError),

    #[error("graph error: {0}")]
    Graph(DagError),

    #[error("merge error: {0}")]
    Merge(MergeError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<StoreError> for PeerError {
    fn from(err: StoreError) -> Self {
        PeerError::Storage(err)
    }
}

impl From<DagError> for PeerError {
    fn from(err: DagError) -> Self {
        match err {
            DagError::Store(e) => PeerError::Storage(e),
            other => PeerError::Graph(other),
        }
    }
}

impl From<DiffError> for PeerError {
    fn from(err: DiffError) -> Self {
        match err {
            DiffError::InvalidParent(id) => PeerError::InvalidParent(id),
            DiffError::Store(e) => PeerError::Storage(e),
            DiffError::Dag(e) => e.into(),
        }
    }
}

impl From<MergeError> for PeerError {
    fn from(err: MergeError) -> Self {
        match err {
            MergeError::Store(e) => PeerError::Storage(e),
            MergeError::Dag(e) => e.into(),
            MergeError::Diff(e) => e.into(),
            other => PeerError::Merge(other),
        }
    }
}

pub type PeerResult<T> = Result<T, PeerError>;

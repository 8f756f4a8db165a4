use pds_types::EntryHash;

/// Errors from entry store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(EntryHash),

    /// Content hash mismatch on read (data corruption).
    #[error("hash mismatch for {id}: computed {computed}")]
    HashMismatch { id: EntryHash, computed: EntryHash },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The object data is malformed or cannot be decoded.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: EntryHash, reason: String },

    /// Attempted to write an object hashing to the null ID.
    #[error("cannot store object with null ID")]
    NullEntryHash,

    /// An entry already links to a different snapshot.
    #[error("entry {entry} already links snapshot {existing}, refusing {proposed}")]
    SnapshotConflict {
        entry: EntryHash,
        existing: EntryHash,
        proposed: EntryHash,
    },

    /// Storage backend rejects writes.
    #[error("store is read-only")]
    ReadOnly,

    /// Storage backend cannot be reached or its state is unusable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

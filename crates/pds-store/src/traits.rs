use pds_types::EntryHash;

use crate::error::StoreResult;
use crate::object::{DiffEntry, SnapshotObject, StoredObject};

/// Content-addressed, append-only entry store shared by every peer of a
/// perspective.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. The same data always produces the
///   same hash, so a second write of identical content is a no-op.
/// - Objects are never deleted.
/// - An entry links to at most one snapshot; relinking it to the same
///   snapshot is a no-op, relinking it to a different one is rejected.
/// - All I/O errors are propagated, never silently ignored.
pub trait EntryStore: Send + Sync {
    /// Read an object by its content-addressed hash.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    fn read(&self, id: &EntryHash) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its content-addressed hash.
    fn write(&self, object: &StoredObject) -> StoreResult<EntryHash>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &EntryHash) -> StoreResult<bool>;

    /// Record that `snapshot` materializes the state at `entry`.
    fn link_snapshot(&self, entry: &EntryHash, snapshot: &EntryHash) -> StoreResult<()>;

    /// The snapshot linked to `entry`, if any.
    fn snapshot_for(&self, entry: &EntryHash) -> StoreResult<Option<EntryHash>>;

    /// Read multiple objects in a batch.
    fn read_batch(&self, ids: &[EntryHash]) -> StoreResult<Vec<Option<StoredObject>>> {
        ids.iter().map(|id| self.read(id)).collect()
    }

    /// Serialize and store a diff entry.
    fn put_entry(&self, entry: &DiffEntry) -> StoreResult<EntryHash> {
        self.write(&entry.to_stored_object()?)
    }

    /// Read and decode a diff entry.
    fn get_entry(&self, id: &EntryHash) -> StoreResult<Option<DiffEntry>> {
        match self.read(id)? {
            Some(obj) => DiffEntry::from_stored_object(&obj).map(Some),
            None => Ok(None),
        }
    }

    /// Store a snapshot and link it to the entry it was taken at.
    fn put_snapshot(&self, snapshot: &SnapshotObject) -> StoreResult<EntryHash> {
        let id = self.write(&snapshot.to_stored_object()?)?;
        self.link_snapshot(&snapshot.since_entry, &id)?;
        Ok(id)
    }

    /// The decoded snapshot linked to `entry`, if any.
    fn get_snapshot(&self, entry: &EntryHash) -> StoreResult<Option<SnapshotObject>> {
        let Some(snapshot_id) = self.snapshot_for(entry)? else {
            return Ok(None);
        };
        match self.read(&snapshot_id)? {
            Some(obj) => SnapshotObject::from_stored_object(&obj).map(Some),
            None => Ok(None),
        }
    }
}

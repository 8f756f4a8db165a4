use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use pds_types::EntryHash;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::EntryStore;

#[derive(Default)]
struct Inner {
    objects: HashMap<EntryHash, StoredObject>,
    snapshot_links: HashMap<EntryHash, EntryHash>,
}

/// In-memory, HashMap-based entry store.
///
/// Intended for tests, simulation, and embedding. One instance shared behind
/// an `Arc` stands in for the replicated store every peer reads from.
pub struct InMemoryEntryStore {
    inner: RwLock<Inner>,
    read_only: AtomicBool,
}

impl InMemoryEntryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            read_only: AtomicBool::new(false),
        }
    }

    /// Make every subsequent write fail with [`StoreError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::SeqCst)
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.read_inner().map(|inner| inner.objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries with a linked snapshot.
    pub fn snapshot_count(&self) -> usize {
        self.read_inner()
            .map(|inner| inner.snapshot_links.len())
            .unwrap_or(0)
    }

    /// Sorted list of all object hashes in the store.
    pub fn all_ids(&self) -> Vec<EntryHash> {
        let Ok(inner) = self.read_inner() else {
            return Vec::new();
        };
        let mut ids: Vec<EntryHash> = inner.objects.keys().copied().collect();
        ids.sort();
        ids
    }

    fn read_inner(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("entry store lock poisoned".into()))
    }

    fn write_inner(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        if self.is_read_only() {
            return Err(StoreError::ReadOnly);
        }
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("entry store lock poisoned".into()))
    }
}

impl Default for InMemoryEntryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryStore for InMemoryEntryStore {
    fn read(&self, id: &EntryHash) -> StoreResult<Option<StoredObject>> {
        Ok(self.read_inner()?.objects.get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<EntryHash> {
        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullEntryHash);
        }
        let mut inner = self.write_inner()?;
        inner.objects.entry(id).or_insert_with(|| object.clone());
        Ok(id)
    }

    fn exists(&self, id: &EntryHash) -> StoreResult<bool> {
        Ok(self.read_inner()?.objects.contains_key(id))
    }

    fn link_snapshot(&self, entry: &EntryHash, snapshot: &EntryHash) -> StoreResult<()> {
        let mut inner = self.write_inner()?;
        match inner.snapshot_links.get(entry) {
            Some(existing) if existing == snapshot => Ok(()),
            Some(existing) => Err(StoreError::SnapshotConflict {
                entry: *entry,
                existing: *existing,
                proposed: *snapshot,
            }),
            None => {
                inner.snapshot_links.insert(*entry, *snapshot);
                Ok(())
            }
        }
    }

    fn snapshot_for(&self, entry: &EntryHash) -> StoreResult<Option<EntryHash>> {
        Ok(self.read_inner()?.snapshot_links.get(entry).copied())
    }
}

impl std::fmt::Debug for InMemoryEntryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEntryStore")
            .field("object_count", &self.len())
            .field("snapshot_count", &self.snapshot_count())
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

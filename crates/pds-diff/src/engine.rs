//! The diff/commit engine.

use pds_store::{DiffEntry, EntryStore};
use pds_types::{EntryHash, PerspectiveDiff, TemporalAnchor};
use tracing::{debug, info};

use crate::compactor::SnapshotCompactor;
use crate::error::{DiffError, DiffResult};

/// Appends diff entries to the store.
///
/// The engine owns the shape of the DAG: a commit names the caller's
/// current revision as its single parent (or none, for the first commit),
/// and every stored entry, merge entries included, is followed by a
/// compaction check. It never touches revision pointers.
pub struct DiffEngine<'a> {
    store: &'a dyn EntryStore,
    compactor: SnapshotCompactor,
}

impl<'a> DiffEngine<'a> {
    pub fn new(store: &'a dyn EntryStore, compactor: SnapshotCompactor) -> Self {
        Self { store, compactor }
    }

    /// Create an entry carrying `diff` on top of `parent`.
    ///
    /// Fails with [`DiffError::InvalidParent`] if `parent` does not resolve
    /// to a stored diff entry.
    pub fn commit(
        &self,
        parent: Option<EntryHash>,
        diff: PerspectiveDiff,
        timestamp: TemporalAnchor,
    ) -> DiffResult<EntryHash> {
        if let Some(parent) = parent {
            if self.store.get_entry(&parent)?.is_none() {
                return Err(DiffError::InvalidParent(parent));
            }
        }

        let entry = DiffEntry::new(
            diff.additions,
            diff.removals,
            parent.into_iter().collect(),
            timestamp,
        );
        let id = self.store_entry(&entry)?;
        info!(
            entry = %id.short_hex(),
            additions = entry.additions.len(),
            removals = entry.removals.len(),
            root = entry.is_root(),
            "committed diff"
        );
        Ok(id)
    }

    /// Store a fully formed entry and run compaction for it.
    pub fn store_entry(&self, entry: &DiffEntry) -> DiffResult<EntryHash> {
        let id = self.store.put_entry(entry)?;
        debug!(entry = %id.short_hex(), parents = entry.parents.len(), "stored entry");
        self.compactor.maybe_snapshot(self.store, &id)?;
        Ok(id)
    }

    pub fn compactor(&self) -> SnapshotCompactor {
        self.compactor
    }
}

//! Snapshot compaction.
//!
//! After every stored entry the compactor counts the non-merge entries
//! between it and the nearest snapshotted ancestors (exclusive). Once that
//! count reaches the interval, the entry's full materialized state is
//! written as a snapshot and linked to it.
//!
//! The snapshot content is a function of the entry's ancestry alone, so
//! peers that snapshot the same entry independently write byte-identical
//! snapshots and the store absorbs the duplicate.

use pds_store::{EntryStore, SnapshotObject};
use pds_types::EntryHash;
use tracing::{debug, info};

use crate::error::DiffResult;
use crate::window::ReplayWindow;

/// Default number of non-merge entries between snapshots.
pub const DEFAULT_SNAPSHOT_INTERVAL: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapshotCompactor {
    interval: usize,
}

impl SnapshotCompactor {
    /// A compactor that snapshots every `interval` non-merge entries.
    /// An interval of 0 disables snapshots.
    pub fn new(interval: usize) -> Self {
        Self { interval }
    }

    pub fn disabled() -> Self {
        Self::new(0)
    }

    pub fn interval(&self) -> usize {
        self.interval
    }

    pub fn is_enabled(&self) -> bool {
        self.interval > 0
    }

    /// Snapshot `entry` if enough history has accumulated since the nearest
    /// snapshot. Returns the snapshot's hash when one was written.
    pub fn maybe_snapshot(
        &self,
        store: &dyn EntryStore,
        entry: &EntryHash,
    ) -> DiffResult<Option<EntryHash>> {
        if !self.is_enabled() {
            return Ok(None);
        }

        let window = ReplayWindow::load(store, *entry)?;
        if window.head_is_snapshotted() {
            return Ok(None);
        }

        let pending = window.pending_entries();
        if pending < self.interval {
            debug!(
                entry = %entry.short_hex(),
                pending,
                interval = self.interval,
                "no snapshot yet"
            );
            return Ok(None);
        }

        let snapshot = Self::build(&window);
        let id = store.put_snapshot(&snapshot)?;
        info!(
            entry = %entry.short_hex(),
            snapshot = %id.short_hex(),
            links = snapshot.materialized_additions.len(),
            depth = snapshot.depth_since_root,
            "wrote snapshot"
        );
        Ok(Some(id))
    }

    /// Materialize the window's head into a snapshot.
    pub fn build(window: &ReplayWindow) -> SnapshotObject {
        let state = window.materialize();
        SnapshotObject {
            materialized_additions: state.additions,
            materialized_removals: state.removals,
            since_entry: window.head(),
            depth_since_root: window.head_depth(),
        }
    }
}

impl Default for SnapshotCompactor {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_INTERVAL)
    }
}

//! Rendering: materializing a revision into its link set.

use pds_store::EntryStore;
use pds_types::{EntryHash, Perspective};
use tracing::debug;

use crate::error::DiffResult;
use crate::window::{MaterializedState, ReplayWindow};

/// Materializes revisions from the entry store.
///
/// Rendering walks back from the revision to the nearest snapshotted
/// ancestors, seeds the state from their snapshots, and replays the
/// remaining entries parents-first. It reads the store and nothing else, so
/// the same revision over the same store content always yields the same
/// links.
pub struct RenderEngine<'a> {
    store: &'a dyn EntryStore,
}

impl<'a> RenderEngine<'a> {
    pub fn new(store: &'a dyn EntryStore) -> Self {
        Self { store }
    }

    /// The materialized state at `revision`; empty when there is none.
    pub fn materialize(&self, revision: Option<&EntryHash>) -> DiffResult<MaterializedState> {
        let Some(revision) = revision else {
            return Ok(MaterializedState::new());
        };
        let window = ReplayWindow::load(self.store, *revision)?;
        let state = window.materialize();
        debug!(
            revision = %revision.short_hex(),
            replayed = window.graph().len(),
            snapshots = window.snapshot_count(),
            links = state.additions.len(),
            "materialized revision"
        );
        Ok(state)
    }

    /// The links visible at `revision`, sorted.
    pub fn render(&self, revision: Option<&EntryHash>) -> DiffResult<Perspective> {
        Ok(self.materialize(revision)?.into_perspective())
    }
}

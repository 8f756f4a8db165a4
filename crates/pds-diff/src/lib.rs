//! Diff engine for perspective-diff-sync.
//!
//! Creates diff entries, compacts history into snapshots, and materializes
//! revisions into link sets.
//!
//! # Key Types
//!
//! - [`DiffEngine`] -- stores new diff entries and runs compaction after each
//! - [`SnapshotCompactor`] -- decides when to snapshot and builds the snapshot
//! - [`RenderEngine`] -- materializes a revision into a [`Perspective`](pds_types::Perspective)
//! - [`ReplayWindow`] / [`MaterializedState`] -- the entries back to the
//!   nearest snapshots, and the state folded from them
//! - [`diff_perspectives`] -- set difference between two materialized states
//!
//! Materialization uses set semantics: a link is visible at a revision iff
//! some entry in its ancestry adds it and no entry in its ancestry removes
//! it. Union and difference commute, so the result does not depend on the
//! order entries are folded in, and snapshots never change it.

pub mod compactor;
pub mod engine;
pub mod error;
pub mod perspective_diff;
pub mod render;
pub mod window;

pub use compactor::SnapshotCompactor;
pub use engine::DiffEngine;
pub use error::{DiffError, DiffResult};
pub use perspective_diff::diff_perspectives;
pub use render::RenderEngine;
pub use window::{MaterializedState, ReplayWindow};

#[cfg(test)]
mod test_support;

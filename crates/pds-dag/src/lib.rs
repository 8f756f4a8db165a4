//! Revision DAG for perspective-diff-sync.
//!
//! A [`RevisionGraph`] is an arena of diff entries loaded from an
//! [`EntryStore`](pds_store::EntryStore), indexed by hash with a forward
//! (parent to child) edge index. It is a *derived* structure: it is rebuilt
//! from the store for every commit, pull, and render, and every traversal
//! is iterative so deep histories never grow the stack.
//!
//! Loading can be bounded: entries matching a stop predicate (in practice,
//! entries that already carry a snapshot) are loaded but their parents are
//! not, which caps the cost of render and compaction. Deciding which pull
//! candidates are maximal goes through [`AncestryIndex`] instead, which
//! reads entries on demand and stops once it is below every candidate.

pub mod error;
pub mod frontier;
pub mod graph;

pub use error::{DagError, DagResult};
pub use frontier::AncestryIndex;
pub use graph::RevisionGraph;

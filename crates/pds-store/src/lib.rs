//! Content-addressed entry storage for perspective-diff-sync.
//!
//! Every diff entry and snapshot is stored as an immutable object identified
//! by its BLAKE3 hash (domain-separated by object kind). The store is
//! append-only: nothing is ever mutated or deleted, so concurrent writers
//! never conflict. Two writers storing the same content produce the same
//! [`EntryHash`](pds_types::EntryHash) and one write is absorbed.
//!
//! # Object Types
//!
//! - [`DiffEntry`] -- link additions/removals plus causal parents
//! - [`SnapshotObject`] -- materialized state folded up to an entry
//!
//! Besides objects, the store keeps one index: the link from a diff entry
//! to the snapshot taken at it.
//!
//! # Storage Backends
//!
//! All backends implement the [`EntryStore`] trait:
//!
//! - [`InMemoryEntryStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsEntryStore`] -- fan-out directory of object files with atomic writes

pub mod error;
pub mod fs;
pub mod hasher;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsEntryStore;
pub use hasher::ContentHasher;
pub use memory::InMemoryEntryStore;
pub use object::{DiffEntry, ObjectKind, SnapshotObject, StoredObject};
pub use traits::EntryStore;

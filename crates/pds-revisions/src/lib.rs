//! Revision pointers for perspective-diff-sync.
//!
//! Each peer owns two named, mutable pointers into the revision DAG:
//!
//! - **latest** is the head this peer publishes. Other peers read it during
//!   `pull` to discover divergence.
//! - **current** is the head this peer has adopted locally. It is the parent
//!   of the next commit and the revision that `render` materializes.
//!
//! Pointers are the only mutable state in the system. Every pointer has a
//! single writer (its owner), so writes are last-write-wins per
//! `(owner, name)` and need no cross-peer arbitration.
//!
//! # Modules
//!
//! - [`error`] -- Error types for pointer operations
//! - [`types`] -- [`RevisionPointer`] and [`PointerName`]
//! - [`traits`] -- The [`RevisionStore`] trait
//! - [`memory`] -- In-memory [`InMemoryRevisionStore`]
//! - [`fs`] -- JSON-file [`FsRevisionStore`]

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::{RevisionError, Result};
pub use fs::FsRevisionStore;
pub use memory::InMemoryRevisionStore;
pub use traits::RevisionStore;
pub use types::{PointerName, RevisionPointer};

//! High-level SDK for perspective-diff-sync.
//!
//! [`Peer`] is the entry point for applications embedding the diff-sync
//! core. It binds one agent to its collaborators (an entry store, a
//! revision pointer store and a gossip channel) and exposes the core
//! operations:
//!
//! - [`Peer::commit`] -- append a diff on top of `current_revision`
//! - [`Peer::update_latest_revision`] / [`Peer::update_current_revision`]
//! - [`Peer::latest_revision`] / [`Peer::current_revision`]
//! - [`Peer::pull`] -- merge what other peers published
//! - [`Peer::render`] -- the materialized link set at `current_revision`
//!
//! Commit and pointer updates are separate steps: a caller commits, and
//! only once that succeeds publishes the new head.

pub mod config;
pub mod error;
pub mod peer;

#[cfg(test)]
mod scenarios;

pub use config::PeerConfig;
pub use error::{PeerError, PeerResult};
pub use peer::{Peer, PullReport};

// Re-export the types callers need to drive a peer.
pub use pds_revisions::{FsRevisionStore, InMemoryRevisionStore, RevisionStore};
pub use pds_store::{EntryStore, FsEntryStore, InMemoryEntryStore};
pub use pds_sync::{LocalNetwork, MergeStatus, RevisionGossip};
pub use pds_types::{
    AgentId, EntryHash, ExpressionProof, LinkExpression, Perspective, PerspectiveDiff, Triple,
};

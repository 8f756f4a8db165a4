//! Revision gossip for perspective-diff-sync.
//!
//! Peers publish their `latest` revision pointer and, during `pull`, ask
//! which revisions other peers have published. The core only depends on
//! the [`RevisionGossip`] trait; [`LocalNetwork`] is an in-process
//! implementation with controllable partitions and outages, used by the
//! test suite and the `pds simulate` command.

pub mod error;
pub mod gossip;
pub mod network;
pub mod types;

pub use error::{SyncError, SyncResult};
pub use gossip::RevisionGossip;
pub use network::LocalNetwork;
pub use types::MergeStatus;

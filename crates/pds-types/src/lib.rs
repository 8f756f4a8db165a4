//! Foundation types for perspective-diff-sync.
//!
//! This crate provides the identity, temporal, and link types shared by every
//! other crate in the workspace.
//!
//! # Key Types
//!
//! - [`EntryHash`] -- Content-addressed identifier (BLAKE3 hash) of a stored entry
//! - [`AgentId`] -- Identity of a peer (its DID or public key string)
//! - [`LinkExpression`] -- An immutable, signed link fact
//! - [`PerspectiveDiff`] -- A batch of link additions and removals
//! - [`Perspective`] -- A materialized link set
//! - [`TemporalAnchor`] / [`HybridLogicalClock`] -- Causal timestamps

pub mod agent;
pub mod error;
pub mod hash;
pub mod link;
pub mod temporal;

pub use agent::AgentId;
pub use error::TypeError;
pub use hash::EntryHash;
pub use link::{ExpressionProof, LinkExpression, Perspective, PerspectiveDiff, Triple};
pub use temporal::{HybridLogicalClock, TemporalAnchor};

//! Merge resolver for perspective-diff-sync.
//!
//! Given the local head and the heads other peers advertise, the resolver
//! decides whether anything needs to happen ([`MergePlan`]) and, for a
//! genuine fork, builds the merge entry that joins every divergent head.
//!
//! Merge entries carry no content of their own. Their parents are sorted by
//! hash and their timestamp is the latest of their parents', so any two
//! peers merging the same heads produce byte-identical entries that the
//! content-addressed store deduplicates.

pub mod error;
pub mod plan;
pub mod resolver;

pub use error::{MergeError, MergeResult};
pub use plan::MergePlan;
pub use resolver::MergeResolver;

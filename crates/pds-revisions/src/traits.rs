//! The [`RevisionStore`] trait defining the pointer storage interface.

use pds_types::{AgentId, EntryHash};

use crate::error::Result;
use crate::types::{PointerName, RevisionPointer};

/// Storage backend for per-peer revision pointers, keyed by
/// `(owner, name)`.
///
/// Implementations must be thread-safe. A write replaces whatever the slot
/// held before (last-write-wins); there is no compare-and-swap because each
/// slot has exactly one writer.
pub trait RevisionStore: Send + Sync {
    /// Read a pointer. Returns `Ok(None)` if it has never been written.
    fn read_pointer(&self, owner: &AgentId, name: PointerName) -> Result<Option<RevisionPointer>>;

    /// Create or overwrite a pointer.
    fn write_pointer(&self, pointer: &RevisionPointer) -> Result<()>;

    /// Every pointer owned by `owner`, ordered by name.
    fn list_pointers(&self, owner: &AgentId) -> Result<Vec<RevisionPointer>>;

    /// The revision `owner` publishes, if any.
    fn latest(&self, owner: &AgentId) -> Result<Option<EntryHash>> {
        Ok(self
            .read_pointer(owner, PointerName::Latest)?
            .map(|p| p.revision))
    }

    /// The revision `owner` has adopted locally, if any.
    fn current(&self, owner: &AgentId) -> Result<Option<EntryHash>> {
        Ok(self
            .read_pointer(owner, PointerName::Current)?
            .map(|p| p.revision))
    }
}

use async_trait::async_trait;
use pds_revisions::RevisionPointer;
use pds_types::AgentId;

use crate::error::SyncResult;

/// Broadcast channel for published revision pointers.
///
/// Delivery is eventual: an announcement may not be visible to every peer
/// immediately, and a peer that cannot reach anyone gets
/// [`SyncError::NetworkUnavailable`](crate::SyncError::NetworkUnavailable).
#[async_trait]
pub trait RevisionGossip: Send + Sync {
    /// Publish `pointer` (a `latest` pointer) to other peers.
    async fn announce(&self, pointer: &RevisionPointer) -> SyncResult<()>;

    /// The `latest` pointers of every peer `local` can currently see,
    /// excluding its own.
    async fn peer_revisions(&self, local: &AgentId) -> SyncResult<Vec<RevisionPointer>>;
}

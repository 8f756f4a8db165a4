use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// No peers can be reached right now. `pull` treats this as "no peers".
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The gossip layer refused an announcement.
    #[error("announcement rejected: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    TransportError(String),
}

pub type SyncResult<T> = Result<T, SyncError>;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identity of a peer participating in a shared perspective.
///
/// An `AgentId` is the agent's DID (or any other stable public key string).
/// It scopes the revision pointers a peer owns and is the `author` recorded
/// on the link expressions it creates.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Create an agent id, rejecting empty strings and path separators.
    ///
    /// Path separators are rejected because agent ids name directories in the
    /// filesystem pointer store.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TypeError::InvalidAgent("empty agent id".into()));
        }
        if id.contains('/') || id.contains('\\') {
            return Err(TypeError::InvalidAgent(format!(
                "agent id contains a path separator: {id}"
            )));
        }
        Ok(Self(id))
    }

    /// The agent id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Stable 16-bit node identifier derived from the agent id.
    ///
    /// Used as the tie-breaking component of this agent's hybrid logical clock.
    pub fn node_id(&self) -> u16 {
        let hash = blake3::hash(self.0.as_bytes());
        let bytes = hash.as_bytes();
        u16::from_le_bytes([bytes[0], bytes[1]])
    }

    /// Filesystem-safe key for this agent (hex of the BLAKE3 hash).
    pub fn storage_key(&self) -> String {
        hex::encode(&blake3::hash(self.0.as_bytes()).as_bytes()[..16])
    }
}

impl fmt::Debug for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgentId({})", self.0)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//! Core pointer types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use pds_types::{AgentId, EntryHash};
use serde::{Deserialize, Serialize};

use crate::error::RevisionError;

/// The two pointer slots every peer owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerName {
    /// The head this peer publishes to others.
    Latest,
    /// The head this peer has adopted locally.
    Current,
}

impl PointerName {
    pub const ALL: [PointerName; 2] = [PointerName::Latest, PointerName::Current];

    pub fn as_str(&self) -> &'static str {
        match self {
            PointerName::Latest => "latest",
            PointerName::Current => "current",
        }
    }
}

impl fmt::Display for PointerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PointerName {
    type Err = RevisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(PointerName::Latest),
            "current" => Ok(PointerName::Current),
            other => Err(RevisionError::InvalidPointer {
                name: other.to_string(),
                reason: "expected \"latest\" or \"current\"".into(),
            }),
        }
    }
}

/// A named pointer from a peer into the revision DAG.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionPointer {
    /// The peer that owns (and is the only writer of) this pointer.
    pub owner: AgentId,
    pub name: PointerName,
    /// The diff entry this pointer names.
    pub revision: EntryHash,
    /// Wall-clock time of the write, informational only.
    pub updated_at: DateTime<Utc>,
}

impl RevisionPointer {
    /// A pointer written now.
    pub fn new(owner: AgentId, name: PointerName, revision: EntryHash) -> Self {
        Self {
            owner,
            name,
            revision,
            updated_at: Utc::now(),
        }
    }

    pub fn latest(owner: AgentId, revision: EntryHash) -> Self {
        Self::new(owner, PointerName::Latest, revision)
    }

    pub fn current(owner: AgentId, revision: EntryHash) -> Self {
        Self::new(owner, PointerName::Current, revision)
    }
}

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use pds_types::{EntryHash, LinkExpression, PerspectiveDiff, TemporalAnchor};

use crate::error::{StoreError, StoreResult};
use crate::hasher::ContentHasher;

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// A diff entry: additions, removals, and causal parents.
    Diff,
    /// A snapshot of materialized state at a diff entry.
    Snapshot,
}

impl ObjectKind {
    /// Single-byte tag used by on-disk backends.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Diff => b'd',
            Self::Snapshot => b's',
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'd' => Some(Self::Diff),
            b's' => Some(Self::Snapshot),
            _ => None,
        }
    }

    fn hasher(&self) -> &'static ContentHasher {
        match self {
            Self::Diff => &ContentHasher::DIFF,
            Self::Snapshot => &ContentHasher::SNAPSHOT,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Diff => write!(f, "diff"),
            Self::Snapshot => write!(f, "snapshot"),
        }
    }
}

/// A stored object: kind tag + serialized data + cached size.
///
/// The store never interprets `data`; it is a pure key-value store keyed by
/// content hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub data: Vec<u8>,
    pub size: u64,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Compute the content-addressed hash for this object.
    pub fn compute_id(&self) -> EntryHash {
        self.kind.hasher().hash(&self.data)
    }
}

// ---------------------------------------------------------------------------
// DiffEntry
// ---------------------------------------------------------------------------

/// One node of the revision DAG.
///
/// A root entry has no parents, a linear commit has one, and a merge entry
/// has one parent per joined head. Parents are kept sorted ascending and
/// deduplicated so two peers building an entry from the same inputs produce
/// byte-identical objects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub additions: Vec<LinkExpression>,
    pub removals: Vec<LinkExpression>,
    pub parents: Vec<EntryHash>,
    pub timestamp: TemporalAnchor,
}

impl DiffEntry {
    pub fn new(
        additions: Vec<LinkExpression>,
        removals: Vec<LinkExpression>,
        mut parents: Vec<EntryHash>,
        timestamp: TemporalAnchor,
    ) -> Self {
        parents.sort();
        parents.dedup();
        Self {
            additions,
            removals,
            parents,
            timestamp,
        }
    }

    /// A content-free entry joining `parents`.
    pub fn merge(parents: Vec<EntryHash>, timestamp: TemporalAnchor) -> Self {
        Self::new(Vec::new(), Vec::new(), parents, timestamp)
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// The additions and removals carried by this entry.
    pub fn diff(&self) -> PerspectiveDiff {
        PerspectiveDiff::new(self.additions.clone(), self.removals.clone())
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        let data =
            serde_json::to_vec(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoredObject::new(ObjectKind::Diff, data))
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        if obj.kind != ObjectKind::Diff {
            return Err(StoreError::CorruptObject {
                id: obj.compute_id(),
                reason: format!("expected diff, got {}", obj.kind),
            });
        }
        serde_json::from_slice(&obj.data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// The hash this entry will be stored under.
    pub fn compute_id(&self) -> StoreResult<EntryHash> {
        Ok(self.to_stored_object()?.compute_id())
    }
}

// ---------------------------------------------------------------------------
// SnapshotObject
// ---------------------------------------------------------------------------

/// Materialized state of every entry reachable from `since_entry`
/// (inclusive).
///
/// `materialized_additions` is already reduced by `materialized_removals`;
/// the removals are retained so that later diffs folded on top still see
/// every link that was ever removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotObject {
    pub materialized_additions: BTreeSet<LinkExpression>,
    pub materialized_removals: BTreeSet<LinkExpression>,
    pub since_entry: EntryHash,
    /// Longest path length from a root entry to `since_entry`.
    pub depth_since_root: u64,
}

impl SnapshotObject {
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        let data =
            serde_json::to_vec(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoredObject::new(ObjectKind::Snapshot, data))
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        if obj.kind != ObjectKind::Snapshot {
            return Err(StoreError::CorruptObject {
                id: obj.compute_id(),
                reason: format!("expected snapshot, got {}", obj.kind),
            });
        }
        serde_json::from_slice(&obj.data).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

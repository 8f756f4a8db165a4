//! The replay window: entries back to the nearest snapshots.

use std::collections::{BTreeSet, HashMap};

use pds_dag::RevisionGraph;
use pds_store::{DiffEntry, EntryStore, SnapshotObject};
use pds_types::{EntryHash, LinkExpression, Perspective};

use crate::error::DiffResult;

/// Materialized link state: every link added and every link removed over
/// some ancestry.
///
/// `additions` never contains a member of `removals`; once removed, a link
/// stays removed for every descendant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaterializedState {
    pub additions: BTreeSet<LinkExpression>,
    pub removals: BTreeSet<LinkExpression>,
}

impl MaterializedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one entry's diff into the state.
    pub fn apply(&mut self, entry: &DiffEntry) {
        for link in &entry.removals {
            self.additions.remove(link);
            self.removals.insert(link.clone());
        }
        for link in &entry.additions {
            if !self.removals.contains(link) {
                self.additions.insert(link.clone());
            }
        }
    }

    /// Union a snapshot's state into this one.
    pub fn absorb(&mut self, snapshot: &SnapshotObject) {
        self.removals
            .extend(snapshot.materialized_removals.iter().cloned());
        self.additions
            .extend(snapshot.materialized_additions.iter().cloned());
        let removals = &self.removals;
        self.additions.retain(|link| !removals.contains(link));
    }

    /// The visible links.
    pub fn links(&self) -> &BTreeSet<LinkExpression> {
        &self.additions
    }

    pub fn into_perspective(self) -> Perspective {
        Perspective::new(self.additions.into_iter().collect())
    }
}

/// The part of the DAG that must be replayed to materialize `head`: the
/// graph loaded back to (and including) the nearest entries that carry a
/// snapshot, together with those snapshots.
#[derive(Debug)]
pub struct ReplayWindow {
    head: EntryHash,
    graph: RevisionGraph,
    snapshots: HashMap<EntryHash, SnapshotObject>,
}

impl ReplayWindow {
    /// Load the window ending at `head`.
    pub fn load(store: &dyn EntryStore, head: EntryHash) -> DiffResult<Self> {
        let mut snapshots = HashMap::new();
        let graph = RevisionGraph::load_bounded(store, &[head], |id| {
            match store.get_snapshot(id)? {
                Some(snapshot) => {
                    snapshots.insert(*id, snapshot);
                    Ok(true)
                }
                None => Ok(false),
            }
        })?;
        Ok(Self {
            head,
            graph,
            snapshots,
        })
    }

    pub fn head(&self) -> EntryHash {
        self.head
    }

    pub fn graph(&self) -> &RevisionGraph {
        &self.graph
    }

    /// Snapshots at the window's boundary.
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether `head` itself already carries a snapshot.
    pub fn head_is_snapshotted(&self) -> bool {
        self.snapshots.contains_key(&self.head)
    }

    /// Non-merge entries in the window not covered by a snapshot.
    pub fn pending_entries(&self) -> usize {
        self.graph
            .topological_order()
            .iter()
            .filter(|id| !self.snapshots.contains_key(id))
            .filter_map(|id| self.graph.get(id))
            .filter(|entry| !entry.is_merge())
            .count()
    }

    /// Longest path length from a root to `head`.
    pub fn head_depth(&self) -> u64 {
        let depths = self
            .graph
            .depths(|id| self.snapshots.get(id).map(|s| s.depth_since_root));
        depths.get(&self.head).copied().unwrap_or(0)
    }

    /// Fold the window into a materialized state: boundary snapshots first,
    /// then every other entry in topological order.
    pub fn materialize(&self) -> MaterializedState {
        let mut state = MaterializedState::new();
        for id in self.graph.topological_order() {
            if let Some(snapshot) = self.snapshots.get(&id) {
                state.absorb(snapshot);
            } else if let Some(entry) = self.graph.get(&id) {
                state.apply(entry);
            }
        }
        state
    }
}

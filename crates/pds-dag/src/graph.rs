//! The arena revision graph and its traversal algorithms.
//!
//! # Invariants
//!
//! - The graph is acyclic. Entries are content-addressed, so an entry can
//!   only name parents that existed before it.
//! - Every parent of a non-boundary entry is loaded.
//! - Boundary entries are loaded, their parents only if reachable some
//!   other way.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use pds_store::{DiffEntry, EntryStore, StoreResult};
use pds_types::EntryHash;
use tracing::debug;

use crate::error::{DagError, DagResult};

/// Diff entries reachable from a set of heads, indexed by hash.
#[derive(Clone, Debug, Default)]
pub struct RevisionGraph {
    /// All loaded entries, keyed by hash.
    nodes: HashMap<EntryHash, DiffEntry>,
    /// Forward-edge index: parent -> children, restricted to loaded nodes.
    children: HashMap<EntryHash, Vec<EntryHash>>,
    /// Entries at which loading stopped.
    boundary: HashSet<EntryHash>,
    /// The heads the graph was loaded from, sorted.
    heads: Vec<EntryHash>,
}

impl RevisionGraph {
    /// Load every entry reachable from `heads`, all the way to the roots.
    pub fn load<S>(store: &S, heads: &[EntryHash]) -> DagResult<Self>
    where
        S: EntryStore + ?Sized,
    {
        Self::load_bounded(store, heads, |_| Ok(false))
    }

    /// Load entries reachable from `heads`, not walking past entries for
    /// which `stop_at` returns `true`.
    ///
    /// A head that is missing from the store fails with
    /// [`DagError::MissingEntry`]; a missing parent fails with
    /// [`DagError::DanglingParent`].
    pub fn load_bounded<S, F>(store: &S, heads: &[EntryHash], mut stop_at: F) -> DagResult<Self>
    where
        S: EntryStore + ?Sized,
        F: FnMut(&EntryHash) -> StoreResult<bool>,
    {
        let mut graph = Self::default();
        let mut seen = HashSet::new();
        let mut queue: VecDeque<(EntryHash, Option<EntryHash>)> = VecDeque::new();

        for head in heads {
            if seen.insert(*head) {
                queue.push_back((*head, None));
            }
        }

        while let Some((id, referenced_by)) = queue.pop_front() {
            let entry = store.get_entry(&id)?.ok_or(match referenced_by {
                Some(node) => DagError::DanglingParent { node, parent: id },
                None => DagError::MissingEntry(id),
            })?;

            if stop_at(&id)? {
                graph.boundary.insert(id);
            } else {
                for parent in &entry.parents {
                    if seen.insert(*parent) {
                        queue.push_back((*parent, Some(id)));
                    }
                }
            }
            graph.nodes.insert(id, entry);
        }

        for (id, entry) in &graph.nodes {
            for parent in &entry.parents {
                if graph.nodes.contains_key(parent) {
                    graph.children.entry(*parent).or_default().push(*id);
                }
            }
        }
        for children in graph.children.values_mut() {
            children.sort();
        }

        graph.heads = heads.to_vec();
        graph.heads.sort();
        graph.heads.dedup();

        debug!(
            nodes = graph.nodes.len(),
            boundary = graph.boundary.len(),
            heads = graph.heads.len(),
            "loaded revision graph"
        );
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &EntryHash) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &EntryHash) -> Option<&DiffEntry> {
        self.nodes.get(id)
    }

    pub fn heads(&self) -> &[EntryHash] {
        &self.heads
    }

    /// Whether loading stopped at `id`.
    pub fn is_boundary(&self, id: &EntryHash) -> bool {
        self.boundary.contains(id)
    }

    /// Entries at which loading stopped, sorted.
    pub fn boundary(&self) -> Vec<EntryHash> {
        let mut ids: Vec<EntryHash> = self.boundary.iter().copied().collect();
        ids.sort();
        ids
    }

    /// Loaded entries with no parents, sorted.
    pub fn roots(&self) -> Vec<EntryHash> {
        let mut ids: Vec<EntryHash> = self
            .nodes
            .iter()
            .filter(|(_, e)| e.is_root())
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Loaded children of `id`, sorted.
    pub fn children(&self, id: &EntryHash) -> &[EntryHash] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    // ---------------------------------------------------------------
    // Ancestry
    // ---------------------------------------------------------------

    /// `id` and every loaded entry it descends from.
    pub fn ancestry(&self, id: &EntryHash) -> HashSet<EntryHash> {
        let mut visited = HashSet::new();
        if !self.nodes.contains_key(id) {
            return visited;
        }
        let mut queue = VecDeque::new();
        visited.insert(*id);
        queue.push_back(*id);

        while let Some(current) = queue.pop_front() {
            if let Some(entry) = self.nodes.get(&current) {
                for parent in &entry.parents {
                    if self.nodes.contains_key(parent) && visited.insert(*parent) {
                        queue.push_back(*parent);
                    }
                }
            }
        }
        visited
    }

    /// Every loaded entry `id` descends from, excluding `id` itself.
    pub fn ancestors(&self, id: &EntryHash) -> HashSet<EntryHash> {
        let mut set = self.ancestry(id);
        set.remove(id);
        set
    }

    /// Whether `descendant` is `ancestor` or descends from it.
    pub fn is_ancestor(&self, ancestor: &EntryHash, descendant: &EntryHash) -> bool {
        if ancestor == descendant {
            return self.nodes.contains_key(ancestor);
        }
        if !self.nodes.contains_key(ancestor) || !self.nodes.contains_key(descendant) {
            return false;
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(*descendant);
        queue.push_back(*descendant);

        while let Some(current) = queue.pop_front() {
            let Some(entry) = self.nodes.get(&current) else {
                continue;
            };
            for parent in &entry.parents {
                if parent == ancestor {
                    return true;
                }
                if visited.insert(*parent) {
                    queue.push_back(*parent);
                }
            }
        }
        false
    }

    /// The lowest common ancestor of `a` and `b`.
    ///
    /// Computes both ancestries, intersects them, and picks the deepest
    /// shared entry (longest path from a root), breaking ties by timestamp
    /// and then hash.
    pub fn common_ancestor(&self, a: &EntryHash, b: &EntryHash) -> Option<EntryHash> {
        if !self.nodes.contains_key(a) || !self.nodes.contains_key(b) {
            return None;
        }
        if a == b {
            return Some(*a);
        }

        let ancestry_a = self.ancestry(a);
        let ancestry_b = self.ancestry(b);
        let depths = self.depths(|_| None);

        ancestry_a
            .intersection(&ancestry_b)
            .filter_map(|id| {
                let entry = self.nodes.get(id)?;
                Some((depths.get(id).copied().unwrap_or(0), entry.timestamp, *id))
            })
            .max()
            .map(|(_, _, id)| id)
    }

    /// The maximal antichain of `candidates`: those not ancestors of another
    /// candidate. Candidates absent from the graph are dropped. Sorted
    /// ascending by hash.
    pub fn maximal_heads(&self, candidates: &[EntryHash]) -> Vec<EntryHash> {
        let mut unique: Vec<EntryHash> = candidates
            .iter()
            .copied()
            .filter(|c| self.nodes.contains_key(c))
            .collect();
        unique.sort();
        unique.dedup();

        let ancestries: Vec<HashSet<EntryHash>> =
            unique.iter().map(|c| self.ancestors(c)).collect();

        unique
            .iter()
            .filter(|c| !ancestries.iter().any(|set| set.contains(c)))
            .copied()
            .collect()
    }

    // ---------------------------------------------------------------
    // Ordering
    // ---------------------------------------------------------------

    /// All loaded entries, parents before children.
    ///
    /// Kahn's algorithm over loaded edges; among entries that are ready at
    /// the same time the smallest hash goes first, so the order is a pure
    /// function of the graph.
    pub fn topological_order(&self) -> Vec<EntryHash> {
        let mut in_degree: HashMap<EntryHash, usize> = self
            .nodes
            .iter()
            .map(|(id, entry)| {
                let loaded = entry
                    .parents
                    .iter()
                    .filter(|p| self.nodes.contains_key(p))
                    .count();
                (*id, loaded)
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<EntryHash>> = in_degree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(id, _)| Reverse(*id))
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(Reverse(current)) = ready.pop() {
            order.push(current);
            for child in self.children(&current) {
                if let Some(deg) = in_degree.get_mut(child) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push(Reverse(*child));
                    }
                }
            }
        }
        order
    }

    /// Entries reachable from `descendant` but not from `ancestor`, in
    /// topological order.
    pub fn entries_between(&self, ancestor: &EntryHash, descendant: &EntryHash) -> Vec<EntryHash> {
        let newer = self.ancestry(descendant);
        let older = self.ancestry(ancestor);
        self.topological_order()
            .into_iter()
            .filter(|id| newer.contains(id) && !older.contains(id))
            .collect()
    }

    /// Longest path length from a root to every loaded entry.
    ///
    /// `base` supplies known depths (typically from snapshots at boundary
    /// entries); an entry with a known depth takes it as-is. Otherwise a
    /// root, or an entry whose parents were not loaded, has depth 0.
    pub fn depths<F>(&self, base: F) -> HashMap<EntryHash, u64>
    where
        F: Fn(&EntryHash) -> Option<u64>,
    {
        let mut depths: HashMap<EntryHash, u64> = HashMap::with_capacity(self.nodes.len());
        for id in self.topological_order() {
            let depth = match base(&id) {
                Some(depth) => depth,
                None => self
                    .nodes
                    .get(&id)
                    .into_iter()
                    .flat_map(|e| e.parents.iter())
                    .filter_map(|p| depths.get(p))
                    .map(|d| d + 1)
                    .max()
                    .unwrap_or(0),
            };
            depths.insert(id, depth);
        }
        depths
    }
}

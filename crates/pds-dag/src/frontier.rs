//! Head classification that reads only the part of the DAG it needs.
//!
//! [`RevisionGraph::maximal_heads`](crate::RevisionGraph::maximal_heads)
//! needs every ancestor of every head loaded. [`AncestryIndex`] instead
//! reads entries lazily and uses depths (longest path from a root) to cut
//! the walk short: an ancestor is always strictly shallower than its
//! descendant, so nothing shallower than the shallowest head can be one.
//! Depths come from snapshots where they exist, so with compaction enabled
//! the number of reads depends on how far apart the heads are, not on how
//! long the history is.

use std::collections::{HashMap, HashSet, VecDeque};

use pds_store::EntryStore;
use pds_types::EntryHash;
use tracing::debug;

use crate::error::{DagError, DagResult};

/// Lazily loaded parent links and depths over an entry store.
pub struct AncestryIndex<'a, S: ?Sized> {
    store: &'a S,
    parents: HashMap<EntryHash, Vec<EntryHash>>,
    depths: HashMap<EntryHash, u64>,
}

impl<'a, S> AncestryIndex<'a, S>
where
    S: EntryStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            parents: HashMap::new(),
            depths: HashMap::new(),
        }
    }

    /// Number of entries whose parents have been read.
    pub fn loaded(&self) -> usize {
        self.parents.len()
    }

    fn parents_of(
        &mut self,
        id: &EntryHash,
        referenced_by: Option<EntryHash>,
    ) -> DagResult<Vec<EntryHash>> {
        if let Some(parents) = self.parents.get(id) {
            return Ok(parents.clone());
        }
        let entry = self.store.get_entry(id)?.ok_or(match referenced_by {
            Some(node) => DagError::DanglingParent { node, parent: *id },
            None => DagError::MissingEntry(*id),
        })?;
        self.parents.insert(*id, entry.parents.clone());
        Ok(entry.parents)
    }

    /// Longest path from a root to `id`.
    ///
    /// Walks parents until every branch ends at a root or at an entry with
    /// a snapshot, whose recorded depth is taken as is.
    pub fn depth(&mut self, id: &EntryHash) -> DagResult<u64> {
        let mut stack: Vec<(EntryHash, Option<EntryHash>)> = vec![(*id, None)];
        while let Some(&(top, referenced_by)) = stack.last() {
            if self.depths.contains_key(&top) {
                stack.pop();
                continue;
            }
            if let Some(snapshot) = self.store.get_snapshot(&top)? {
                self.depths.insert(top, snapshot.depth_since_root);
                stack.pop();
                continue;
            }
            let parents = self.parents_of(&top, referenced_by)?;
            let pending: Vec<EntryHash> = parents
                .iter()
                .filter(|p| !self.depths.contains_key(*p))
                .copied()
                .collect();
            if pending.is_empty() {
                let depth = parents
                    .iter()
                    .filter_map(|p| self.depths.get(p))
                    .map(|d| d + 1)
                    .max()
                    .unwrap_or(0);
                self.depths.insert(top, depth);
                stack.pop();
            } else {
                stack.extend(pending.into_iter().map(|p| (p, Some(top))));
            }
        }
        Ok(self.depths.get(id).copied().unwrap_or(0))
    }

    /// The candidates that are not ancestors of another candidate, sorted
    /// and deduplicated.
    ///
    /// Every candidate must be in the store.
    pub fn maximal_heads(&mut self, candidates: &[EntryHash]) -> DagResult<Vec<EntryHash>> {
        let mut heads = candidates.to_vec();
        heads.sort();
        heads.dedup();
        if heads.len() < 2 {
            for head in &heads {
                self.parents_of(head, None)?;
            }
            return Ok(heads);
        }

        let mut floor = u64::MAX;
        for head in &heads {
            floor = floor.min(self.depth(head)?);
        }
        let head_set: HashSet<EntryHash> = heads.iter().copied().collect();

        // Parents of an entry at the floor are below it and cannot be heads.
        let mut covered = HashSet::new();
        let mut seen = head_set.clone();
        let mut queue: VecDeque<EntryHash> = heads.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            if self.depth(&id)? <= floor {
                continue;
            }
            for parent in self.parents_of(&id, None)? {
                if head_set.contains(&parent) {
                    covered.insert(parent);
                }
                if seen.insert(parent) && self.depth(&parent)? >= floor {
                    queue.push_back(parent);
                }
            }
        }

        debug!(
            heads = heads.len(),
            floor,
            walked = seen.len(),
            "classified heads"
        );
        Ok(heads.into_iter().filter(|h| !covered.contains(h)).collect())
    }
}

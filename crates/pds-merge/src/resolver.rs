//! Fork detection and merge-entry construction.

use pds_dag::AncestryIndex;
use pds_diff::DiffEngine;
use pds_store::{DiffEntry, EntryStore};
use pds_types::{EntryHash, TemporalAnchor};
use tracing::{debug, info, warn};

use crate::error::{MergeError, MergeResult};
use crate::plan::MergePlan;

/// Plans and applies merges against an entry store.
pub struct MergeResolver<'a> {
    store: &'a dyn EntryStore,
}

impl<'a> MergeResolver<'a> {
    pub fn new(store: &'a dyn EntryStore) -> Self {
        Self { store }
    }

    /// Decide how to incorporate `candidates` into `local`.
    ///
    /// Candidates whose entries are not in the store yet are skipped, so a
    /// pull never acts on partially replicated data. The remaining
    /// candidates plus the local head are reduced to their maximal
    /// antichain:
    ///
    /// - only the local head survives: [`MergePlan::UpToDate`]
    /// - a single other head survives: it descends from the local head (or
    ///   there is none), so [`MergePlan::FastForward`]
    /// - several heads survive: a genuine fork, so [`MergePlan::Merge`]
    ///
    /// Only the history between the shallowest and deepest head is read,
    /// so a pull that finds nothing new costs the same however long the
    /// history is (given snapshots).
    pub fn plan(
        &self,
        local: Option<EntryHash>,
        candidates: &[EntryHash],
    ) -> MergeResult<MergePlan> {
        let mut heads = Vec::with_capacity(candidates.len() + 1);
        for candidate in candidates {
            if Some(*candidate) == local || heads.contains(candidate) {
                continue;
            }
            if self.store.get_entry(candidate)?.is_some() {
                heads.push(*candidate);
            } else {
                warn!(head = %candidate.short_hex(), "skipping head missing from store");
            }
        }
        if heads.is_empty() {
            return Ok(MergePlan::UpToDate);
        }
        heads.extend(local);

        let mut index = AncestryIndex::new(self.store);
        let maximal = index.maximal_heads(&heads)?;
        debug!(
            candidates = heads.len(),
            maximal = maximal.len(),
            loaded = index.loaded(),
            "computed maximal heads"
        );

        let plan = match maximal.as_slice() {
            [] => MergePlan::UpToDate,
            [only] if Some(*only) == local => MergePlan::UpToDate,
            [only] => MergePlan::FastForward { to: *only },
            _ => MergePlan::Merge { parents: maximal },
        };
        Ok(plan)
    }

    /// The merge entry joining `parents`.
    ///
    /// Its timestamp is the latest parent timestamp, which keeps the entry a
    /// pure function of its parents.
    pub fn merge_entry(&self, parents: &[EntryHash]) -> MergeResult<DiffEntry> {
        if parents.len() < 2 {
            return Err(MergeError::TooFewParents(parents.len()));
        }
        let mut timestamp = TemporalAnchor::zero();
        for parent in parents {
            let entry = self
                .store
                .get_entry(parent)?
                .ok_or(pds_dag::DagError::MissingEntry(*parent))?;
            timestamp = timestamp.max(entry.timestamp);
        }
        Ok(DiffEntry::merge(parents.to_vec(), timestamp))
    }

    /// Carry out `plan` and return the resulting head, or `None` if nothing
    /// changes. Merge entries are written through `engine` so they are
    /// compacted like any other entry.
    pub fn apply(
        &self,
        plan: &MergePlan,
        engine: &DiffEngine<'_>,
    ) -> MergeResult<Option<EntryHash>> {
        match plan {
            MergePlan::UpToDate => Ok(None),
            MergePlan::FastForward { to } => {
                info!(to = %to.short_hex(), "fast-forward");
                Ok(Some(*to))
            }
            MergePlan::Merge { parents } => {
                let entry = self.merge_entry(parents)?;
                let id = engine.store_entry(&entry)?;
                info!(entry = %id.short_hex(), parents = parents.len(), "created merge entry");
                Ok(Some(id))
            }
        }
    }
}

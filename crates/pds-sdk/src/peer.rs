//! The [`Peer`] facade.

use std::sync::Arc;

use pds_diff::{diff_perspectives, DiffEngine, RenderEngine, SnapshotCompactor};
use pds_merge::{MergePlan, MergeResolver};
use pds_revisions::{RevisionPointer, RevisionStore};
use pds_store::EntryStore;
use pds_sync::{MergeStatus, RevisionGossip, SyncError};
use pds_types::{AgentId, EntryHash, HybridLogicalClock, Perspective, PerspectiveDiff};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::PeerConfig;
use crate::error::{PeerError, PeerResult};

/// Outcome of a [`Peer::pull_report`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullReport {
    /// Links that became visible or invisible at `current_revision`.
    pub diff: PerspectiveDiff,
    pub status: MergeStatus,
    /// `current_revision` after the pull.
    pub current: Option<EntryHash>,
}

impl PullReport {
    fn up_to_date(current: Option<EntryHash>) -> Self {
        Self {
            diff: PerspectiveDiff::default(),
            status: MergeStatus::UpToDate,
            current,
        }
    }
}

/// One agent's view of a shared perspective.
///
/// The entry store is content-addressed and may be shared with other
/// peers. The revision store holds this agent's two pointers. Other
/// peers' heads are only ever learned through the gossip channel.
pub struct Peer {
    agent: AgentId,
    entries: Arc<dyn EntryStore>,
    revisions: Arc<dyn RevisionStore>,
    gossip: Arc<dyn RevisionGossip>,
    clock: HybridLogicalClock,
    config: PeerConfig,
}

impl Peer {
    pub fn new(
        agent: AgentId,
        entries: Arc<dyn EntryStore>,
        revisions: Arc<dyn RevisionStore>,
        gossip: Arc<dyn RevisionGossip>,
        config: PeerConfig,
    ) -> Self {
        let node_id = config.node_id.unwrap_or_else(|| agent.node_id());
        Self {
            agent,
            entries,
            revisions,
            gossip,
            clock: HybridLogicalClock::new(node_id),
            config,
        }
    }

    pub fn agent(&self) -> &AgentId {
        &self.agent
    }

    pub fn config(&self) -> &PeerConfig {
        &self.config
    }

    pub fn entry_store(&self) -> &dyn EntryStore {
        &*self.entries
    }

    fn engine(&self) -> DiffEngine<'_> {
        DiffEngine::new(
            &*self.entries,
            SnapshotCompactor::new(self.config.snapshot_interval),
        )
    }

    // ---- Commit ----

    /// Append `diff` on top of `current_revision` and return the new
    /// entry's hash.
    ///
    /// No pointer moves. Publish the entry with
    /// [`update_latest_revision`](Self::update_latest_revision) and adopt
    /// it with [`update_current_revision`](Self::update_current_revision).
    pub fn commit(&self, diff: PerspectiveDiff) -> PeerResult<EntryHash> {
        let parent = self.current_revision()?;
        let id = self.engine().commit(parent, diff, self.clock.now())?;
        debug!(agent = %self.agent, entry = %id.short_hex(), "peer committed");
        Ok(id)
    }

    /// Commit, then adopt and publish the new entry.
    pub async fn commit_and_publish(&self, diff: PerspectiveDiff) -> PeerResult<EntryHash> {
        let id = self.commit(diff)?;
        self.update_current_revision(id)?;
        self.update_latest_revision(id).await?;
        Ok(id)
    }

    // ---- Revision pointers ----

    fn ensure_stored(&self, revision: &EntryHash) -> PeerResult<()> {
        if self.entries.get_entry(revision)?.is_none() {
            return Err(PeerError::UnknownRevision(*revision));
        }
        Ok(())
    }

    /// Announce `revision` to other peers and point `latest_revision` at it.
    ///
    /// The announcement goes out before the pointer is written, so a
    /// rejected or failed announcement leaves `latest_revision` untouched.
    /// An unreachable network is not an error: the pointer is still written
    /// and the revision goes out with the next announcement.
    pub async fn update_latest_revision(&self, revision: EntryHash) -> PeerResult<()> {
        self.ensure_stored(&revision)?;
        let pointer = RevisionPointer::latest(self.agent.clone(), revision);
        match self.gossip.announce(&pointer).await {
            Ok(()) => {}
            Err(SyncError::NetworkUnavailable(reason)) => {
                warn!(agent = %self.agent, %reason, "could not announce latest revision");
            }
            Err(e) => return Err(e.into()),
        }
        self.revisions.write_pointer(&pointer)?;
        info!(agent = %self.agent, revision = %revision.short_hex(), "published latest revision");
        Ok(())
    }

    /// Point `current_revision` at `revision`.
    pub fn update_current_revision(&self, revision: EntryHash) -> PeerResult<()> {
        self.ensure_stored(&revision)?;
        self.revisions
            .write_pointer(&RevisionPointer::current(self.agent.clone(), revision))?;
        debug!(agent = %self.agent, revision = %revision.short_hex(), "adopted current revision");
        Ok(())
    }

    pub fn latest_revision(&self) -> PeerResult<Option<EntryHash>> {
        Ok(self.revisions.latest(&self.agent)?)
    }

    pub fn current_revision(&self) -> PeerResult<Option<EntryHash>> {
        Ok(self.revisions.current(&self.agent)?)
    }

    // ---- Pull ----

    /// Merge what other peers have published and return the links that
    /// changed at `current_revision`.
    pub async fn pull(&self) -> PeerResult<PerspectiveDiff> {
        Ok(self.pull_report().await?.diff)
    }

    /// Like [`pull`](Self::pull), also reporting what kind of merge happened.
    ///
    /// Candidates are the `latest_revision`s other peers announced plus this
    /// peer's own. If no peer can be reached the pull is a no-op.
    /// `current_revision` moves only after everything else succeeded
    /// (storing the merge entry and publishing it), so a failed pull leaves
    /// it where it was and a retry reports the same diff.
    pub async fn pull_report(&self) -> PeerResult<PullReport> {
        let local = self.current_revision()?;
        let mut candidates: Vec<EntryHash> = match self.gossip.peer_revisions(&self.agent).await {
            Ok(pointers) => pointers.into_iter().map(|p| p.revision).collect(),
            Err(SyncError::NetworkUnavailable(reason)) => {
                warn!(agent = %self.agent, %reason, "no peers reachable, skipping pull");
                return Ok(PullReport::up_to_date(local));
            }
            Err(e) => return Err(e.into()),
        };
        candidates.extend(self.latest_revision()?);

        for candidate in &candidates {
            if let Some(entry) = self.entries.get_entry(candidate)? {
                self.clock.observe(&entry.timestamp);
            }
        }

        let resolver = MergeResolver::new(&*self.entries);
        let plan = resolver.plan(local, &candidates)?;
        if plan.is_up_to_date() {
            debug!(agent = %self.agent, "pull: up to date");
            return Ok(PullReport::up_to_date(local));
        }

        let render = RenderEngine::new(&*self.entries);
        let before = render.materialize(local.as_ref())?;
        let Some(head) = resolver.apply(&plan, &self.engine())? else {
            return Ok(PullReport::up_to_date(local));
        };
        let after = render.materialize(Some(&head))?;
        let diff = diff_perspectives(&before.additions, &after.additions);

        let status = match plan {
            MergePlan::Merge { .. } => MergeStatus::Merged,
            _ => MergeStatus::FastForward,
        };
        if status == MergeStatus::Merged && self.config.publish_merges {
            self.update_latest_revision(head).await?;
        }
        self.update_current_revision(head)?;
        info!(
            agent = %self.agent,
            %status,
            head = %head.short_hex(),
            additions = diff.additions.len(),
            removals = diff.removals.len(),
            "pulled"
        );
        Ok(PullReport {
            diff,
            status,
            current: Some(head),
        })
    }

    // ---- Render ----

    /// The links visible at `current_revision`.
    pub fn render(&self) -> PeerResult<Perspective> {
        let current = self.current_revision()?;
        Ok(RenderEngine::new(&*self.entries).render(current.as_ref())?)
    }
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("agent", &self.agent)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

//! In-process gossip hub.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use pds_revisions::{PointerName, RevisionPointer};
use pds_types::AgentId;
use tracing::debug;

use crate::error::{SyncError, SyncResult};
use crate::gossip::RevisionGossip;

const DEFAULT_PARTITION: u64 = 0;

#[derive(Default)]
struct NetworkState {
    announced: BTreeMap<AgentId, RevisionPointer>,
    partition_of: HashMap<AgentId, u64>,
    next_partition: u64,
    offline: HashSet<AgentId>,
}

impl NetworkState {
    fn partition(&self, agent: &AgentId) -> u64 {
        self.partition_of
            .get(agent)
            .copied()
            .unwrap_or(DEFAULT_PARTITION)
    }

    fn fresh_partition(&mut self) -> u64 {
        self.next_partition += 1;
        self.next_partition
    }
}

/// Shared in-process gossip network.
///
/// Every announcement is recorded. Which announcements a peer sees depends
/// on partitions: agents join the shared default partition, can be moved to
/// a partition of their own with [`isolate`](Self::isolate), and are
/// brought back together with [`connect`](Self::connect) or
/// [`connect_all`](Self::connect_all). An agent taken offline gets
/// [`SyncError::NetworkUnavailable`] from `peer_revisions`.
///
/// Cloning yields another handle to the same network.
#[derive(Clone)]
pub struct LocalNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl LocalNetwork {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(NetworkState::default())),
        }
    }

    // The state is plain maps; a poisoned lock still holds a usable value.
    fn state(&self) -> MutexGuard<'_, NetworkState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register `agent` in the default partition if it is not known yet.
    pub fn join(&self, agent: &AgentId) {
        self.state()
            .partition_of
            .entry(agent.clone())
            .or_insert(DEFAULT_PARTITION);
    }

    /// Move `agent` into a partition of its own.
    pub fn isolate(&self, agent: &AgentId) {
        let mut state = self.state();
        let partition = state.fresh_partition();
        state.partition_of.insert(agent.clone(), partition);
        debug!(%agent, partition, "isolated agent");
    }

    /// Merge `b`'s partition into `a`'s.
    pub fn connect(&self, a: &AgentId, b: &AgentId) {
        let mut state = self.state();
        let target = state.partition(a);
        let source = state.partition(b);
        state.partition_of.entry(a.clone()).or_insert(target);
        state.partition_of.insert(b.clone(), target);
        for partition in state.partition_of.values_mut() {
            if *partition == source {
                *partition = target;
            }
        }
        debug!(%a, %b, partition = target, "connected agents");
    }

    /// Put every known agent in the default partition.
    pub fn connect_all(&self) {
        let mut state = self.state();
        for partition in state.partition_of.values_mut() {
            *partition = DEFAULT_PARTITION;
        }
        debug!("connected all agents");
    }

    pub fn take_offline(&self, agent: &AgentId) {
        self.state().offline.insert(agent.clone());
    }

    pub fn bring_online(&self, agent: &AgentId) {
        self.state().offline.remove(agent);
    }

    pub fn is_online(&self, agent: &AgentId) -> bool {
        !self.state().offline.contains(agent)
    }

    /// Whether `a` and `b` currently see each other's announcements.
    pub fn are_connected(&self, a: &AgentId, b: &AgentId) -> bool {
        let state = self.state();
        state.partition(a) == state.partition(b)
    }

    /// The last pointer `agent` announced, regardless of partitions.
    pub fn announced(&self, agent: &AgentId) -> Option<RevisionPointer> {
        self.state().announced.get(agent).cloned()
    }
}

impl Default for LocalNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocalNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("LocalNetwork")
            .field("agents", &state.partition_of.len())
            .field("announced", &state.announced.len())
            .field("offline", &state.offline.len())
            .finish()
    }
}

#[async_trait]
impl RevisionGossip for LocalNetwork {
    async fn announce(&self, pointer: &RevisionPointer) -> SyncResult<()> {
        if pointer.name != PointerName::Latest {
            return Err(SyncError::Rejected(format!(
                "only latest pointers are gossiped, got {}",
                pointer.name
            )));
        }
        {
            let mut state = self.state();
            state
                .partition_of
                .entry(pointer.owner.clone())
                .or_insert(DEFAULT_PARTITION);
            state
                .announced
                .insert(pointer.owner.clone(), pointer.clone());
        }
        debug!(
            owner = %pointer.owner,
            revision = %pointer.revision.short_hex(),
            "announced revision"
        );
        Ok(())
    }

    async fn peer_revisions(&self, local: &AgentId) -> SyncResult<Vec<RevisionPointer>> {
        let state = self.state();
        if state.offline.contains(local) {
            return Err(SyncError::NetworkUnavailable(format!("{local} is offline")));
        }
        let partition = state.partition(local);
        Ok(state
            .announced
            .iter()
            .filter(|(owner, _)| *owner != local && state.partition(owner) == partition)
            .map(|(_, pointer)| pointer.clone())
            .collect())
    }
}

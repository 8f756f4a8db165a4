//! Multi-peer scenarios: several peers sharing one entry store and one
//! gossip network, driven through the public `Peer` API.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pds_revisions::{InMemoryRevisionStore, RevisionPointer, RevisionStore};
use pds_store::{EntryStore, FsEntryStore, InMemoryEntryStore};
use pds_sync::{LocalNetwork, MergeStatus, RevisionGossip, SyncError, SyncResult};
use pds_types::{AgentId, EntryHash, ExpressionProof, LinkExpression, PerspectiveDiff, Triple};

use crate::config::PeerConfig;
use crate::error::PeerError;
use crate::peer::Peer;

fn link(source: &str) -> LinkExpression {
    let timestamp = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    LinkExpression::with_timestamp(
        Triple::new(source, "perspective://root", Some("sioc://has_child".into())),
        "did:key:scenario",
        timestamp,
        ExpressionProof {
            signature: "sig".into(),
            key: "key".into(),
        },
    )
}

fn additions(sources: &[&str]) -> PerspectiveDiff {
    PerspectiveDiff::new(sources.iter().map(|s| link(s)).collect(), vec![])
}

fn agent(name: &str) -> AgentId {
    AgentId::new(format!("did:key:{name}")).unwrap()
}

fn sources(peer: &Peer) -> BTreeSet<String> {
    peer.render()
        .unwrap()
        .links
        .into_iter()
        .map(|l| l.data.source)
        .collect()
}

fn set(sources: &[&str]) -> BTreeSet<String> {
    sources.iter().map(|s| s.to_string()).collect()
}

/// Peers sharing a store, a pointer store and a network.
struct Swarm {
    entries: Arc<InMemoryEntryStore>,
    revisions: Arc<InMemoryRevisionStore>,
    network: LocalNetwork,
    config: PeerConfig,
}

impl Swarm {
    fn new() -> Self {
        Self::with_config(PeerConfig::default())
    }

    fn with_config(config: PeerConfig) -> Self {
        Self {
            entries: Arc::new(InMemoryEntryStore::new()),
            revisions: Arc::new(InMemoryRevisionStore::new()),
            network: LocalNetwork::new(),
            config,
        }
    }

    fn peer(&self, name: &str) -> Peer {
        self.peer_via(name, Arc::new(self.network.clone()))
    }

    /// A peer that reaches the network through `gossip`.
    fn peer_via(&self, name: &str, gossip: Arc<dyn RevisionGossip>) -> Peer {
        let id = agent(name);
        self.network.join(&id);
        Peer::new(
            id,
            self.entries.clone(),
            self.revisions.clone(),
            gossip,
            self.config.clone(),
        )
    }

    fn isolated_peer(&self, name: &str) -> Peer {
        let peer = self.peer(name);
        self.network.isolate(peer.agent());
        peer
    }
}

/// The swarm network, with announcements that can be made to fail.
struct FlakyGossip {
    network: LocalNetwork,
    failing: AtomicBool,
}

impl FlakyGossip {
    fn new(network: LocalNetwork) -> Self {
        Self {
            network,
            failing: AtomicBool::new(false),
        }
    }

    fn fail_announces(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl RevisionGossip for FlakyGossip {
    async fn announce(&self, pointer: &RevisionPointer) -> SyncResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SyncError::TransportError("link dropped".into()));
        }
        self.network.announce(pointer).await
    }

    async fn peer_revisions(&self, local: &AgentId) -> SyncResult<Vec<RevisionPointer>> {
        self.network.peer_revisions(local).await
    }
}

/// Pull on every peer until a full round changes nothing.
async fn settle(peers: &[&Peer]) {
    for _ in 0..8 {
        let mut changed = false;
        for peer in peers {
            if peer.pull_report().await.unwrap().status != MergeStatus::UpToDate {
                changed = true;
            }
        }
        if !changed {
            return;
        }
    }
    panic!("peers did not settle");
}

// ----------------------------------------------------------
// Pull
// ----------------------------------------------------------

#[tokio::test]
async fn pull_is_idempotent() {
    let swarm = Swarm::new();
    let a = swarm.peer("a");
    let b = swarm.peer("b");
    a.commit_and_publish(additions(&["a1"])).await.unwrap();
    b.commit_and_publish(additions(&["b1"])).await.unwrap();

    let first = a.pull().await.unwrap();
    assert_eq!(first.additions, vec![link("b1")]);
    assert!(a.pull().await.unwrap().is_empty());

    let first = b.pull().await.unwrap();
    assert_eq!(first.additions, vec![link("a1")]);
    assert!(b.pull().await.unwrap().is_empty());
}

#[tokio::test]
async fn merge_converges_regardless_of_pull_order() {
    let mut rendered = Vec::new();
    for a_first in [true, false] {
        let swarm = Swarm::new();
        let a = swarm.peer("a");
        let b = swarm.peer("b");
        a.commit_and_publish(additions(&["a1", "a2"])).await.unwrap();
        b.commit_and_publish(additions(&["b1"])).await.unwrap();

        let (first, second) = if a_first { (&a, &b) } else { (&b, &a) };
        assert_eq!(first.pull_report().await.unwrap().status, MergeStatus::Merged);
        assert_eq!(
            second.pull_report().await.unwrap().status,
            MergeStatus::FastForward
        );

        assert_eq!(a.render().unwrap(), b.render().unwrap());
        assert_eq!(a.current_revision().unwrap(), b.current_revision().unwrap());
        rendered.push(sources(&a));
    }
    assert_eq!(rendered[0], set(&["a1", "a2", "b1"]));
    assert_eq!(rendered[0], rendered[1]);
}

#[tokio::test]
async fn independent_merges_are_identical() {
    let swarm = Swarm::with_config(PeerConfig {
        publish_merges: false,
        ..PeerConfig::default()
    });
    let a = swarm.peer("a");
    let b = swarm.peer("b");
    a.commit_and_publish(additions(&["a1"])).await.unwrap();
    b.commit_and_publish(additions(&["b1"])).await.unwrap();

    // Neither sees the other's merge, so both build one.
    assert_eq!(a.pull_report().await.unwrap().status, MergeStatus::Merged);
    assert_eq!(b.pull_report().await.unwrap().status, MergeStatus::Merged);

    let head_a = a.current_revision().unwrap().unwrap();
    let head_b = b.current_revision().unwrap().unwrap();
    assert_eq!(head_a, head_b);
    let merge = swarm.entries.get_entry(&head_a).unwrap().unwrap();
    assert!(merge.is_merge());
    assert!(merge.parents.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn offline_pull_is_a_no_op() {
    let swarm = Swarm::new();
    let a = swarm.peer("a");
    let b = swarm.peer("b");
    let a1 = a.commit_and_publish(additions(&["a1"])).await.unwrap();
    b.commit_and_publish(additions(&["b1"])).await.unwrap();

    swarm.network.take_offline(a.agent());
    let report = a.pull_report().await.unwrap();
    assert!(report.diff.is_empty());
    assert_eq!(report.status, MergeStatus::UpToDate);
    assert_eq!(a.current_revision().unwrap(), Some(a1));

    swarm.network.bring_online(a.agent());
    assert_eq!(a.pull().await.unwrap().additions, vec![link("b1")]);
}

#[tokio::test]
async fn heads_missing_from_the_store_are_ignored() {
    let swarm = Swarm::new();
    let a = swarm.peer("a");
    let a1 = a.commit_and_publish(additions(&["a1"])).await.unwrap();

    // b writes to a store a cannot read yet.
    let remote = Arc::new(InMemoryEntryStore::new());
    swarm.network.join(&agent("b"));
    let b = Peer::new(
        agent("b"),
        remote.clone(),
        swarm.revisions.clone(),
        Arc::new(swarm.network.clone()),
        PeerConfig::default(),
    );
    b.commit_and_publish(additions(&["b1"])).await.unwrap();

    let report = a.pull_report().await.unwrap();
    assert_eq!(report.status, MergeStatus::UpToDate);
    assert_eq!(a.current_revision().unwrap(), Some(a1));

    // Replicate b's objects, after which the head becomes usable.
    for id in remote.all_ids() {
        let object = remote.read(&id).unwrap().unwrap();
        swarm.entries.write(&object).unwrap();
    }
    assert_eq!(a.pull().await.unwrap().additions, vec![link("b1")]);
}

// ----------------------------------------------------------
// Render
// ----------------------------------------------------------

#[tokio::test]
async fn render_contains_every_unremoved_commit() {
    let swarm = Swarm::new();
    let a = swarm.peer("a");
    let b = swarm.peer("b");

    a.commit_and_publish(additions(&["x", "y"])).await.unwrap();
    a.commit_and_publish(PerspectiveDiff::new(vec![link("z")], vec![link("x")]))
        .await
        .unwrap();
    assert_eq!(sources(&a), set(&["y", "z"]));

    b.pull().await.unwrap();
    b.commit_and_publish(additions(&["w"])).await.unwrap();
    a.commit_and_publish(additions(&["v"])).await.unwrap();
    settle(&[&a, &b]).await;

    assert_eq!(sources(&a), set(&["v", "w", "y", "z"]));
    assert_eq!(sources(&b), sources(&a));
}

#[tokio::test]
async fn removal_on_one_branch_survives_merge() {
    let swarm = Swarm::new();
    let a = swarm.peer("a");
    let b = swarm.peer("b");
    a.commit_and_publish(additions(&["shared"])).await.unwrap();
    b.pull().await.unwrap();

    b.commit_and_publish(PerspectiveDiff::new(vec![], vec![link("shared")]))
        .await
        .unwrap();
    a.commit_and_publish(additions(&["extra"])).await.unwrap();

    let delta = a.pull().await.unwrap();
    assert_eq!(delta.removals, vec![link("shared")]);
    assert!(delta.additions.is_empty());
    settle(&[&a, &b]).await;
    assert_eq!(sources(&a), set(&["extra"]));
    assert_eq!(sources(&b), set(&["extra"]));
}

#[tokio::test]
async fn snapshots_do_not_change_renders() {
    let mut renders = Vec::new();
    let mut snapshot_counts = Vec::new();
    for interval in [0usize, 1, 2, 3] {
        let swarm = Swarm::with_config(PeerConfig {
            snapshot_interval: interval,
            ..PeerConfig::default()
        });
        let a = swarm.peer("a");
        let b = swarm.peer("b");
        for i in 0..5 {
            a.commit_and_publish(additions(&[format!("a{i}").as_str()])).await.unwrap();
            b.commit_and_publish(additions(&[format!("b{i}").as_str()])).await.unwrap();
        }
        b.commit_and_publish(PerspectiveDiff::new(vec![], vec![link("b0")]))
            .await
            .unwrap();
        settle(&[&a, &b]).await;
        assert_eq!(a.render().unwrap(), b.render().unwrap());
        renders.push(a.render().unwrap());
        snapshot_counts.push(swarm.entries.snapshot_count());
    }
    assert_eq!(snapshot_counts[0], 0);
    assert!(snapshot_counts[1..].iter().all(|&n| n > 0));
    assert_eq!(renders[0].len(), 9);
    assert!(renders.windows(2).all(|w| w[0] == w[1]));
}

// ----------------------------------------------------------
// Observed scenarios
// ----------------------------------------------------------

#[tokio::test]
async fn late_joiner_sees_two_then_four_links() {
    let swarm = Swarm::new();
    let a = swarm.peer("a");
    let b = swarm.isolated_peer("b");

    a.commit_and_publish(additions(&["one"])).await.unwrap();
    a.commit_and_publish(additions(&["two"])).await.unwrap();

    swarm.network.connect(a.agent(), b.agent());
    b.pull().await.unwrap();
    assert_eq!(b.render().unwrap().len(), 2);

    b.commit_and_publish(additions(&["three"])).await.unwrap();
    b.commit_and_publish(additions(&["four"])).await.unwrap();
    a.pull().await.unwrap();
    assert_eq!(a.render().unwrap().len(), 4);
}

#[tokio::test]
async fn fork_is_invisible_until_connected() {
    let swarm = Swarm::new();
    let a = swarm.isolated_peer("a");
    let b = swarm.isolated_peer("b");
    a.commit_and_publish(additions(&["from-a"])).await.unwrap();
    b.commit_and_publish(additions(&["from-b"])).await.unwrap();

    assert!(a.pull().await.unwrap().additions.is_empty());
    assert!(b.pull().await.unwrap().additions.is_empty());

    swarm.network.connect(a.agent(), b.agent());
    assert_eq!(a.pull().await.unwrap().additions, vec![link("from-b")]);
    assert_eq!(b.pull().await.unwrap().additions, vec![link("from-a")]);
}

#[tokio::test]
async fn three_way_fork_merges_in_one_entry() {
    let swarm = Swarm::new();
    let a = swarm.isolated_peer("a");
    let b = swarm.isolated_peer("b");
    let c = swarm.isolated_peer("c");

    a.commit_and_publish(additions(&["a1"])).await.unwrap();
    let b1 = b.commit_and_publish(additions(&["b1"])).await.unwrap();

    // c forks off b's first commit.
    swarm.network.connect(b.agent(), c.agent());
    c.pull().await.unwrap();
    assert_eq!(c.current_revision().unwrap(), Some(b1));
    swarm.network.isolate(c.agent());

    a.commit_and_publish(additions(&["a2"])).await.unwrap();
    b.commit_and_publish(additions(&["b2"])).await.unwrap();
    c.commit_and_publish(additions(&["c1"])).await.unwrap();

    swarm.network.connect_all();
    let report = a.pull_report().await.unwrap();
    assert_eq!(report.status, MergeStatus::Merged);
    let merge = swarm
        .entries
        .get_entry(&report.current.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(merge.parents.len(), 3);

    settle(&[&a, &b, &c]).await;
    let expected = set(&["a1", "a2", "b1", "b2", "c1"]);
    for peer in [&a, &b, &c] {
        assert_eq!(sources(peer), expected);
        assert_eq!(peer.render().unwrap().len(), expected.len());
    }
}

#[tokio::test]
async fn six_links_render_on_both_sides_of_a_merge() {
    let swarm = Swarm::new();
    let a = swarm.isolated_peer("a");
    let b = swarm.isolated_peer("b");
    for i in 0..3 {
        a.commit_and_publish(additions(&[format!("a{i}").as_str()])).await.unwrap();
        b.commit_and_publish(additions(&[format!("b{i}").as_str()])).await.unwrap();
    }
    assert_eq!(a.render().unwrap().len(), 3);
    assert_eq!(b.render().unwrap().len(), 3);

    swarm.network.connect_all();
    settle(&[&a, &b]).await;
    assert_eq!(a.render().unwrap().len(), 6);
    assert_eq!(b.render().unwrap().len(), 6);

    // Committing on top of the merge keeps everything.
    a.commit_and_publish(additions(&["after"])).await.unwrap();
    b.pull().await.unwrap();
    assert_eq!(b.render().unwrap().len(), 7);
}

// ----------------------------------------------------------
// Errors
// ----------------------------------------------------------

#[tokio::test]
async fn stale_current_revision_is_an_invalid_parent() {
    let swarm = Swarm::new();
    let a = swarm.peer("a");
    let ghost = EntryHash::from_bytes(b"never stored");
    swarm
        .revisions
        .write_pointer(&RevisionPointer::current(agent("a"), ghost))
        .unwrap();

    let err = a.commit(additions(&["x"])).unwrap_err();
    assert!(matches!(err, PeerError::InvalidParent(id) if id == ghost));
}

#[tokio::test]
async fn rejected_writes_surface_as_storage_errors() {
    let swarm = Swarm::new();
    let a = swarm.peer("a");
    a.commit_and_publish(additions(&["x"])).await.unwrap();
    swarm.entries.set_read_only(true);

    assert!(matches!(
        a.commit(additions(&["y"])),
        Err(PeerError::Storage(_))
    ));
    assert_eq!(a.render().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_merge_publish_keeps_current_revision() {
    let swarm = Swarm::new();
    let gossip = Arc::new(FlakyGossip::new(swarm.network.clone()));
    let a = swarm.peer_via("a", gossip.clone());
    let b = swarm.peer("b");
    let a1 = a.commit_and_publish(additions(&["a1"])).await.unwrap();
    b.commit_and_publish(additions(&["b1"])).await.unwrap();

    gossip.fail_announces(true);
    let err = a.pull().await.unwrap_err();
    assert!(matches!(err, PeerError::Sync(SyncError::TransportError(_))));
    assert_eq!(a.current_revision().unwrap(), Some(a1));
    assert_eq!(a.latest_revision().unwrap(), Some(a1));
    assert_eq!(sources(&a), set(&["a1"]));

    // The retry still reports what the failed pull would have.
    gossip.fail_announces(false);
    let report = a.pull_report().await.unwrap();
    assert_eq!(report.status, MergeStatus::Merged);
    assert_eq!(report.diff.additions, vec![link("b1")]);
    assert_eq!(a.current_revision().unwrap(), report.current);
    assert_eq!(a.latest_revision().unwrap(), report.current);
    assert_eq!(sources(&a), set(&["a1", "b1"]));
}

#[tokio::test]
async fn rejected_announcement_leaves_latest_revision_unwritten() {
    let swarm = Swarm::new();
    let gossip = Arc::new(FlakyGossip::new(swarm.network.clone()));
    let a = swarm.peer_via("a", gossip.clone());
    let a1 = a.commit(additions(&["a1"])).unwrap();

    gossip.fail_announces(true);
    assert!(matches!(
        a.update_latest_revision(a1).await,
        Err(PeerError::Sync(SyncError::TransportError(_)))
    ));
    assert_eq!(a.latest_revision().unwrap(), None);
    assert!(swarm.network.announced(&agent("a")).is_none());

    gossip.fail_announces(false);
    a.update_latest_revision(a1).await.unwrap();
    assert_eq!(a.latest_revision().unwrap(), Some(a1));
    assert_eq!(swarm.network.announced(&agent("a")).unwrap().revision, a1);
}

// ----------------------------------------------------------
// Filesystem backends
// ----------------------------------------------------------

#[tokio::test]
async fn peers_sync_through_filesystem_stores() {
    let dir = tempfile::tempdir().unwrap();
    let entries: Arc<dyn EntryStore> = Arc::new(FsEntryStore::open(dir.path()).unwrap());
    let revisions: Arc<dyn RevisionStore> =
        Arc::new(pds_revisions::FsRevisionStore::open(dir.path()).unwrap());
    let network = LocalNetwork::new();

    let make = |name: &str| {
        Peer::new(
            agent(name),
            entries.clone(),
            revisions.clone(),
            Arc::new(network.clone()),
            PeerConfig::default(),
        )
    };
    let a = make("a");
    let b = make("b");
    a.commit_and_publish(additions(&["a1", "a2"])).await.unwrap();
    b.commit_and_publish(additions(&["b1"])).await.unwrap();
    settle(&[&a, &b]).await;

    assert_eq!(sources(&a), set(&["a1", "a2", "b1"]));
    assert_eq!(a.render().unwrap(), b.render().unwrap());

    // A fresh handle on the same directory sees the same state.
    let reopened = Peer::new(
        agent("a"),
        Arc::new(FsEntryStore::open(dir.path()).unwrap()),
        Arc::new(pds_revisions::FsRevisionStore::open(dir.path()).unwrap()),
        Arc::new(LocalNetwork::new()),
        PeerConfig::default(),
    );
    assert_eq!(reopened.render().unwrap(), a.render().unwrap());
}

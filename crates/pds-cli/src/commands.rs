use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use pds_diff::RenderEngine;
use pds_revisions::{FsRevisionStore, InMemoryRevisionStore, RevisionStore};
use pds_sdk::{Peer, PeerConfig};
use pds_store::{EntryStore, FsEntryStore, InMemoryEntryStore};
use pds_sync::{LocalNetwork, MergeStatus};
use pds_types::{
    AgentId, EntryHash, ExpressionProof, LinkExpression, Perspective, PerspectiveDiff, Triple,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Simulate(args) => cmd_simulate(args, format).await,
        Command::Render(args) => cmd_render(args, format),
        Command::Config(args) => cmd_config(args, format),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PeerConfig> {
    match path {
        Some(path) => PeerConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(PeerConfig::default()),
    }
}

// ---- simulate ----

#[derive(Debug, Serialize)]
pub struct PeerSummary {
    pub agent: String,
    pub links: usize,
    pub current: Option<EntryHash>,
    pub last_pull: MergeStatus,
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub peers: Vec<PeerSummary>,
    pub committed: usize,
    pub rounds: usize,
    pub converged: bool,
}

fn simulated_link(agent: &AgentId, peer: usize, n: usize) -> LinkExpression {
    LinkExpression::new(
        Triple::new(
            format!("peer-{peer}://link-{n}"),
            "perspective://root",
            Some("sioc://has_child".into()),
        ),
        agent.as_str(),
        // Simulated peers do not sign.
        ExpressionProof {
            signature: String::new(),
            key: agent.as_str().to_string(),
        },
    )
}

pub async fn simulate(args: &SimulateArgs) -> anyhow::Result<SimulationReport> {
    if args.peers == 0 {
        bail!("--peers must be at least 1");
    }
    let mut config = load_config(args.config.as_deref())?;
    if let Some(interval) = args.snapshot_interval {
        config.snapshot_interval = interval;
        config.validate()?;
    }

    let (entries, revisions): (Arc<dyn EntryStore>, Arc<dyn RevisionStore>) = match &args.store {
        Some(dir) => (
            Arc::new(FsEntryStore::open(dir)?),
            Arc::new(FsRevisionStore::open(dir)?),
        ),
        None => (
            Arc::new(InMemoryEntryStore::new()),
            Arc::new(InMemoryRevisionStore::new()),
        ),
    };
    let network = LocalNetwork::new();
    let peers = (0..args.peers)
        .map(|i| -> anyhow::Result<Peer> {
            let agent = AgentId::new(format!("did:key:peer-{i}"))?;
            network.isolate(&agent);
            Ok(Peer::new(
                agent,
                entries.clone(),
                revisions.clone(),
                Arc::new(network.clone()),
                config.clone(),
            ))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    // Commit while isolated, in a seeded random interleaving.
    let mut schedule: Vec<usize> = (0..args.peers)
        .flat_map(|p| std::iter::repeat(p).take(args.commits))
        .collect();
    schedule.shuffle(&mut StdRng::seed_from_u64(args.seed));
    let mut counters = vec![0usize; args.peers];
    let mut committed = Vec::with_capacity(schedule.len());
    for p in schedule {
        let link = simulated_link(peers[p].agent(), p, counters[p]);
        counters[p] += 1;
        peers[p]
            .commit_and_publish(PerspectiveDiff::new(vec![link.clone()], vec![]))
            .await?;
        committed.push(link);
    }
    info!(peers = args.peers, commits = committed.len(), "isolated commits done");

    network.connect_all();
    let mut last_pull = vec![MergeStatus::UpToDate; peers.len()];
    let mut rounds = 0;
    let mut stable = false;
    while rounds < args.max_rounds && !stable {
        rounds += 1;
        stable = true;
        for (i, peer) in peers.iter().enumerate() {
            let report = peer.pull_report().await?;
            if report.status != MergeStatus::UpToDate {
                stable = false;
                last_pull[i] = report.status;
            }
        }
        info!(round = rounds, stable, "pull round");
    }

    let mut renders = Vec::with_capacity(peers.len());
    let mut summaries = Vec::with_capacity(peers.len());
    for (peer, status) in peers.iter().zip(last_pull) {
        let perspective = peer.render()?;
        summaries.push(PeerSummary {
            agent: peer.agent().to_string(),
            links: perspective.len(),
            current: peer.current_revision()?,
            last_pull: status,
        });
        renders.push(perspective);
    }
    let converged = stable
        && renders.windows(2).all(|w| w[0] == w[1])
        && committed.iter().all(|link| renders[0].contains(link));

    Ok(SimulationReport {
        peers: summaries,
        committed: committed.len(),
        rounds,
        converged,
    })
}

async fn cmd_simulate(args: SimulateArgs, format: OutputFormat) -> anyhow::Result<()> {
    let report = simulate(&args).await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.converged {
        println!(
            "{} {} peers converged after {} rounds ({} links committed)",
            "✓".green().bold(),
            report.peers.len(),
            report.rounds,
            report.committed
        );
    } else {
        println!(
            "{} peers did not converge after {} rounds",
            "✗".red().bold(),
            report.rounds
        );
    }
    for peer in &report.peers {
        let head = peer
            .current
            .map(|h| h.short_hex())
            .unwrap_or_else(|| "-".into());
        println!(
            "  {}  {} links  head {}  last pull: {}",
            peer.agent.bold(),
            peer.links,
            head.yellow(),
            peer.last_pull.to_string().cyan()
        );
    }
    Ok(())
}

// ---- render ----

pub fn load_perspective(args: &RenderArgs) -> anyhow::Result<(EntryHash, Perspective)> {
    let entries = FsEntryStore::open(&args.store)
        .with_context(|| format!("opening store at {}", args.store.display()))?;
    let revision = match (&args.revision, &args.agent) {
        (Some(hex), _) => EntryHash::from_hex(hex)?,
        (None, Some(agent)) => {
            let agent = AgentId::new(agent.as_str())?;
            FsRevisionStore::open(&args.store)?
                .current(&agent)?
                .with_context(|| format!("{agent} has no current revision"))?
        }
        (None, None) => bail!("either --revision or --agent is required"),
    };
    let perspective = RenderEngine::new(&entries).render(Some(&revision))?;
    Ok((revision, perspective))
}

fn cmd_render(args: RenderArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (revision, perspective) = load_perspective(&args)?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&perspective)?);
        return Ok(());
    }

    println!(
        "Revision {} ({} links)",
        revision.short_hex().yellow().bold(),
        perspective.len()
    );
    for link in &perspective.links {
        let predicate = link.data.predicate.as_deref().unwrap_or("");
        println!(
            "  {} -[{}]-> {}  {}",
            link.data.source,
            predicate.cyan(),
            link.data.target,
            link.author.dimmed()
        );
    }
    Ok(())
}

// ---- config ----

fn cmd_config(args: ConfigArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        OutputFormat::Text => print!("{}", config.to_toml_string()?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(peers: usize, commits: usize) -> SimulateArgs {
        SimulateArgs {
            peers,
            commits,
            snapshot_interval: None,
            config: None,
            store: None,
            seed: 7,
            max_rounds: 16,
        }
    }

    #[tokio::test]
    async fn simulation_converges_in_memory() {
        let report = simulate(&args(3, 4)).await.unwrap();
        assert!(report.converged);
        assert_eq!(report.committed, 12);
        assert!(report.peers.iter().all(|p| p.links == 12));
        let head = report.peers[0].current;
        assert!(report.peers.iter().all(|p| p.current == head));
        assert!(report
            .peers
            .iter()
            .any(|p| p.last_pull == MergeStatus::Merged));
    }

    #[tokio::test]
    async fn simulation_without_snapshots_converges() {
        let mut no_snapshots = args(2, 3);
        no_snapshots.snapshot_interval = Some(0);
        let report = simulate(&no_snapshots).await.unwrap();
        assert!(report.converged);
        assert_eq!(report.peers[0].links, 6);
    }

    #[tokio::test]
    async fn zero_peers_is_rejected() {
        assert!(simulate(&args(0, 1)).await.is_err());
    }

    #[tokio::test]
    async fn rendered_store_matches_simulation() {
        let dir = tempfile::tempdir().unwrap();
        let mut on_disk = args(2, 2);
        on_disk.store = Some(dir.path().to_path_buf());
        let report = simulate(&on_disk).await.unwrap();
        assert!(report.converged);
        let head = report.peers[0].current.unwrap();

        let by_revision = RenderArgs {
            store: dir.path().to_path_buf(),
            revision: Some(head.to_hex()),
            agent: None,
        };
        let (revision, perspective) = load_perspective(&by_revision).unwrap();
        assert_eq!(revision, head);
        assert_eq!(perspective.len(), 4);

        let by_agent = RenderArgs {
            store: dir.path().to_path_buf(),
            revision: None,
            agent: Some("did:key:peer-1".into()),
        };
        assert_eq!(load_perspective(&by_agent).unwrap().1, perspective);
    }

    #[test]
    fn config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pds.toml");
        std::fs::write(&path, "snapshot_interval = 5\n").unwrap();
        assert_eq!(load_config(Some(path.as_path())).unwrap().snapshot_interval, 5);
        assert_eq!(load_config(None).unwrap(), PeerConfig::default());
    }
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pds",
    about = "perspective-diff-sync: peer-replicated link perspectives",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run isolated peers that commit, then connect and pull until stable
    Simulate(SimulateArgs),
    /// Render a revision from a filesystem store
    Render(RenderArgs),
    /// Print the effective peer configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct SimulateArgs {
    #[arg(long, default_value = "3")]
    pub peers: usize,
    /// Links each peer commits while isolated
    #[arg(long, default_value = "4")]
    pub commits: usize,
    /// Overrides the configured snapshot interval
    #[arg(long)]
    pub snapshot_interval: Option<usize>,
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Persist entries and pointers here instead of in memory
    #[arg(long)]
    pub store: Option<PathBuf>,
    /// Seed for the commit interleaving
    #[arg(long, default_value = "0")]
    pub seed: u64,
    #[arg(long, default_value = "16")]
    pub max_rounds: usize,
}

#[derive(Args)]
pub struct RenderArgs {
    #[arg(long)]
    pub store: PathBuf,
    /// Entry hash to render
    #[arg(long, required_unless_present = "agent", conflicts_with = "agent")]
    pub revision: Option<String>,
    /// Render this agent's current revision instead
    #[arg(long)]
    pub agent: Option<String>,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,
}

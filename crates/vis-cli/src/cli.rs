use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "vis",
    about = "vis: version information service with two-phase publishing",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML config file; flags and VIS_* variables override it
    #[arg(long, global = true, env = "VIS_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true, env = "VIS_DATABASE")]
    pub database: Option<PathBuf>,

    /// How long to wait on a locked database, in milliseconds
    #[arg(long, global = true, env = "VIS_BUSY_TIMEOUT_MS")]
    pub busy_timeout_ms: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Stage a version value and print its transaction id
    Prepare(PrepareArgs),
    /// Publish a staged version
    Commit(CommitArgs),
    /// Delete every record of a slot
    Rollback(SlotArgs),
    /// Print the current committed value of a slot
    Resolve(ResolveArgs),
    /// List committed activity per repository
    Repos,
    /// Show one record by transaction id
    Show(ShowArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long, env = "VIS_BIND_ADDR")]
    pub bind: Option<SocketAddr>,
}

#[derive(Args)]
pub struct SlotArgs {
    #[arg(short, long, env = "VIS_NAMESPACE")]
    pub namespace: String,
    #[arg(short, long)]
    pub repo: String,
    /// release, development, nightly or patch
    #[arg(short = 't', long = "type")]
    pub version_type: Option<String>,
}

#[derive(Args)]
pub struct PrepareArgs {
    #[command(flatten)]
    pub slot: SlotArgs,
    pub value: String,
    /// Write the record committed in one step
    #[arg(long)]
    pub auto_commit: bool,
}

#[derive(Args)]
pub struct CommitArgs {
    pub tx_id: String,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[arg(short, long, env = "VIS_NAMESPACE")]
    pub namespace: Option<String>,
    #[arg(short, long)]
    pub repo: String,
    #[arg(short = 't', long = "type")]
    pub version_type: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub tx_id: String,
}

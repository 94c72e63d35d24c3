//! scalegridd: the ScaleGrid daemon.
//!
//! Feeds JSON snapshots of resource metrics, performance readings,
//! capability requirements, and the node roster into the orchestrator.
//! JSON results go to stdout; logs go to stderr.
//!
//! # Usage
//!
//! ```text
//! scalegridd plan --snapshot snapshot.json --config scalegrid.toml
//! scalegridd run --snapshot snapshot.json --interval 30
//! scalegridd --log-format json run --snapshot snapshot.json --once
//! ```

mod commands;
mod control_loop;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "scalegridd", about = "ScaleGrid scalability orchestrator")]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Print the scalability plan and workload distribution for a snapshot.
    Plan {
        /// Snapshot file (JSON).
        #[arg(long)]
        snapshot: PathBuf,

        /// Config file (TOML). Defaults to ./scalegrid.toml when present.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run orchestration cycles until Ctrl-C.
    Run {
        /// Snapshot file (JSON), reloaded every cycle.
        #[arg(long)]
        snapshot: PathBuf,

        /// Config file (TOML). Defaults to ./scalegrid.toml when present.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Seconds between cycles.
        #[arg(long, default_value = "30")]
        interval: u64,

        /// Run a single cycle and exit.
        #[arg(long)]
        once: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Plan { snapshot, config } => commands::plan(&snapshot, config.as_deref()).await,
        Command::Run {
            snapshot,
            config,
            interval,
            once,
        } => commands::run(&snapshot, config.as_deref(), interval, once).await,
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,scalegrid=debug"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

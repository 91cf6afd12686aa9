//! Blobcache CLI - command-line interface to the blobcache library.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;

use commands::config::ConfigAction;
use error::CliError;

#[derive(Parser)]
#[command(name = "blobcache")]
#[command(about = "Disk-backed blob cache with time-based purging", long_about = None)]
struct Cli {
    /// Config file path (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the cache directory
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store a blob under a key, read from a file or stdin
    Add {
        /// Cache key
        key: String,
        /// File to read; stdin when omitted
        file: Option<PathBuf>,
    },
    /// Write a cached blob to stdout or a file
    Get {
        /// Cache key
        key: String,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete every entry whose file name contains the fragment
    Purge {
        /// Substring to match against entry file names
        fragment: String,
    },
    /// Run an expiry sweep now
    Sweep,
    /// Show cache statistics
    Stats,
    /// Remove every entry regardless of age
    Clear,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        e.exit();
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Command::Config { action } = &cli.command {
        return commands::config::run(action, cli.config.as_deref());
    }

    let config = commands::common::load_config(cli.config.as_deref(), cli.dir.as_deref())?;
    let cache = commands::common::open_cache(&config).await?;

    match cli.command {
        Command::Add { key, file } => commands::store::run_add(&cache, &key, file.as_deref()).await,
        Command::Get { key, output } => {
            commands::store::run_get(&cache, &key, output.as_deref()).await
        }
        Command::Purge { fragment } => commands::store::run_purge(&cache, &fragment).await,
        Command::Sweep => commands::store::run_sweep(&cache).await,
        Command::Stats => commands::store::run_stats(&cache).await,
        Command::Clear => commands::store::run_clear(&cache).await,
        Command::Config { .. } => unreachable!("handled above"),
    }
}

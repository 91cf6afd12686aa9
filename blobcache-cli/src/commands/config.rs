//! Configuration management CLI commands.
//!
//! Provides `config show`, `config init`, and `config path` for inspecting
//! and bootstrapping the INI config file.

use std::path::Path;

use blobcache::ConfigFile;
use clap::Subcommand;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(action: &ConfigAction, config_path: Option<&Path>) -> Result<(), CliError> {
    match action {
        ConfigAction::Show => run_show(config_path),
        ConfigAction::Init { force } => run_init(*force),
        ConfigAction::Path => run_path(),
    }
}

fn run_show(config_path: Option<&Path>) -> Result<(), CliError> {
    let config = match config_path {
        Some(path) => ConfigFile::load_from(path)
            .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))?,
        None => ConfigFile::load().unwrap_or_default(),
    };

    println!("[cache]");
    println!("directory = {}", config.cache.directory.display());
    println!("purge_interval_secs = {}", config.cache.purge_interval_secs);
    println!("auto_purge = {}", config.cache.auto_purge);
    println!("lock_strategy = {}", config.cache.lock_strategy);
    Ok(())
}

fn run_init(force: bool) -> Result<(), CliError> {
    let path = ConfigFile::path()
        .ok_or_else(|| CliError::Config("no config directory on this platform".to_string()))?;

    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    ConfigFile::default()
        .save_to(&path)
        .map_err(|e| CliError::Config(e.to_string()))?;

    println!("Wrote default config to {}", path.display());
    Ok(())
}

fn run_path() -> Result<(), CliError> {
    match ConfigFile::path() {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => Err(CliError::Config(
            "no config directory on this platform".to_string(),
        )),
    }
}

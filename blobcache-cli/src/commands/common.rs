//! Shared config loading and cache construction for CLI commands.

use std::path::Path;

use blobcache::{ConfigFile, DiskCache};
use tracing::debug;

use crate::error::CliError;

/// Load the config file, falling back to defaults when none exists, and
/// apply command-line overrides.
///
/// An explicit `--config` path must load cleanly; only the implicit default
/// location is allowed to be absent.
pub fn load_config(
    config_path: Option<&Path>,
    dir_override: Option<&Path>,
) -> Result<ConfigFile, CliError> {
    let mut config = match config_path {
        Some(path) => ConfigFile::load_from(path)
            .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))?,
        None => ConfigFile::load().unwrap_or_default(),
    };

    if let Some(dir) = dir_override {
        config.cache.directory = dir.to_path_buf();
    }

    debug!(dir = %config.cache.directory.display(), "resolved cache configuration");
    Ok(config)
}

/// Open the cache the config describes.
pub async fn open_cache(config: &ConfigFile) -> Result<DiskCache, CliError> {
    let cache = DiskCache::open(config.cache_config()).await?;
    Ok(cache)
}

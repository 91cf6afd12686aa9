//! Process configuration loaded from an INI file.
//!
//! The CLI (and any other host) reads settings once at startup from
//! `{config_dir}/blobcache/config.ini` and builds a
//! [`DiskCacheConfig`](crate::cache::DiskCacheConfig) from them. There is no
//! runtime reconfiguration surface.
//!
//! # File format
//!
//! ```ini
//! [cache]
//! directory = /var/cache/blobcache
//! purge_interval_secs = 300
//! auto_purge = true
//! lock_strategy = coarse
//! ```
//!
//! Missing keys fall back to their defaults; unknown keys are ignored.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::cache::{DiskCacheConfig, LockStrategy, DEFAULT_PURGE_INTERVAL_SECS};

/// Errors from loading or saving the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Could not read or write the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid INI.
    #[error("config parse error: {0}")]
    Parse(String),

    /// A key holds a value that does not parse.
    #[error("invalid value {value:?} for config key {key:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// On-disk configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub cache: CacheSection,
}

/// The `[cache]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSection {
    /// Directory holding cache entry files.
    pub directory: PathBuf,
    /// Expiry threshold / lazy sweep interval in seconds.
    pub purge_interval_secs: u64,
    /// Whether lookups schedule background sweeps.
    pub auto_purge: bool,
    /// Key lock granularity.
    pub lock_strategy: LockStrategy,
}

impl Default for CacheSection {
    fn default() -> Self {
        let base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            directory: base.join("blobcache"),
            purge_interval_secs: DEFAULT_PURGE_INTERVAL_SECS,
            auto_purge: true,
            lock_strategy: LockStrategy::default(),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            cache: CacheSection::default(),
        }
    }
}

impl ConfigFile {
    /// Default location: `{config_dir}/blobcache/config.ini`.
    ///
    /// `None` when the platform has no config directory.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("blobcache").join("config.ini"))
    }

    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()
            .ok_or_else(|| ConfigError::Parse("no config directory on this platform".into()))?;
        Self::load_from(&path)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let file = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(io) => ConfigError::Io(io),
            ini::Error::Parse(parse) => ConfigError::Parse(parse.to_string()),
        })?;

        let mut config = Self::default();

        if let Some(section) = file.section(Some("cache")) {
            if let Some(value) = section.get("directory") {
                config.cache.directory = PathBuf::from(value);
            }
            if let Some(value) = section.get("purge_interval_secs") {
                config.cache.purge_interval_secs =
                    value.parse().map_err(|_| ConfigError::InvalidValue {
                        key: "purge_interval_secs",
                        value: value.to_string(),
                    })?;
            }
            if let Some(value) = section.get("auto_purge") {
                config.cache.auto_purge = parse_bool(value).ok_or(ConfigError::InvalidValue {
                    key: "auto_purge",
                    value: value.to_string(),
                })?;
            }
            if let Some(value) = section.get("lock_strategy") {
                config.cache.lock_strategy =
                    value.parse().map_err(|_| ConfigError::InvalidValue {
                        key: "lock_strategy",
                        value: value.to_string(),
                    })?;
            }
        }

        Ok(config)
    }

    /// Save to the default location, creating parent directories.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::path()
            .ok_or_else(|| ConfigError::Parse("no config directory on this platform".into()))?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = Ini::new();
        file.with_section(Some("cache"))
            .set("directory", self.cache.directory.to_string_lossy().as_ref())
            .set(
                "purge_interval_secs",
                self.cache.purge_interval_secs.to_string(),
            )
            .set("auto_purge", self.cache.auto_purge.to_string())
            .set("lock_strategy", self.cache.lock_strategy.to_string());
        file.write_to_file(path)?;
        Ok(())
    }

    /// Build the cache configuration these settings describe.
    pub fn cache_config(&self) -> DiskCacheConfig {
        DiskCacheConfig::new(&self.cache.directory)
            .with_purge_after(Duration::from_secs(self.cache.purge_interval_secs))
            .with_auto_purge(self.cache.auto_purge)
            .with_lock_strategy(self.cache.lock_strategy)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Human-readable byte size, e.g. `3.2 MB`.
pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.1} GB", bytes / GB)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes / MB)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes / KB)
    } else {
        format!("{} B", bytes as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ConfigFile::default();
        assert_eq!(config.cache.purge_interval_secs, 300);
        assert!(config.cache.auto_purge);
        assert_eq!(config.cache.lock_strategy, LockStrategy::Coarse);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");

        let mut config = ConfigFile::default();
        config.cache.directory = PathBuf::from("/srv/blobs");
        config.cache.purge_interval_secs = 42;
        config.cache.auto_purge = false;
        config.cache.lock_strategy = LockStrategy::PerKey;
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_keys_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[cache]\ndirectory = /srv/blobs\n").unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded.cache.directory, PathBuf::from("/srv/blobs"));
        assert_eq!(loaded.cache.purge_interval_secs, 300);
        assert!(loaded.cache.auto_purge);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = ConfigFile::load_from(&dir.path().join("nope.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_rejects_bad_interval() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[cache]\npurge_interval_secs = soon\n").unwrap();

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "purge_interval_secs",
                ..
            }
        ));
    }

    #[test]
    fn test_cache_config_conversion() {
        let mut config = ConfigFile::default();
        config.cache.purge_interval_secs = 7;
        config.cache.auto_purge = false;

        let cache_config = config.cache_config();
        assert_eq!(cache_config.purge_after, Duration::from_secs(7));
        assert!(!cache_config.auto_purge);
    }

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}

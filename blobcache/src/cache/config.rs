//! Construction-time configuration for the disk cache.
//!
//! All settings are fixed when the cache is opened; there is no per-call
//! configuration surface.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default expiry threshold and lazy sweep interval (5 minutes).
///
/// Entries older than this are removed by the next sweep, and a lookup will
/// not schedule a new sweep until this long has passed since the previous one.
pub const DEFAULT_PURGE_INTERVAL_SECS: u64 = 300;

/// How file access for cache entries is serialized.
///
/// Chosen once at construction. Both strategies serialize read/write/delete
/// against the same key; they differ in whether unrelated keys contend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LockStrategy {
    /// One lock shared by every key. Simple and bounded, but all cache I/O
    /// is serialized through it.
    #[default]
    Coarse,
    /// One lock per key. Unrelated keys proceed concurrently, but the lock
    /// table grows without bound - entries are never reclaimed.
    PerKey,
}

impl FromStr for LockStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coarse" => Ok(LockStrategy::Coarse),
            "per-key" | "per_key" | "perkey" => Ok(LockStrategy::PerKey),
            other => Err(format!(
                "unknown lock strategy {:?} (expected \"coarse\" or \"per-key\")",
                other
            )),
        }
    }
}

impl std::fmt::Display for LockStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockStrategy::Coarse => write!(f, "coarse"),
            LockStrategy::PerKey => write!(f, "per-key"),
        }
    }
}

/// Disk cache configuration.
///
/// Build with [`DiskCacheConfig::new`] and the `with_*` setters, then pass
/// to [`DiskCache::open`](crate::cache::DiskCache::open).
#[derive(Clone, Debug)]
pub struct DiskCacheConfig {
    /// Directory holding the cache entry files. Created if absent.
    pub directory: PathBuf,

    /// Maximum entry age before a sweep removes it; also the minimum time
    /// between lazily scheduled sweeps.
    pub purge_after: Duration,

    /// Whether lookups lazily schedule background sweeps.
    ///
    /// When disabled, entries are only removed by explicit calls
    /// (`purge_expired`, `force_purge`, `clear`).
    pub auto_purge: bool,

    /// Key lock granularity.
    pub lock_strategy: LockStrategy,
}

impl DiskCacheConfig {
    /// Create a config with default expiry (5 minutes), auto-purge enabled,
    /// and coarse locking.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            purge_after: Duration::from_secs(DEFAULT_PURGE_INTERVAL_SECS),
            auto_purge: true,
            lock_strategy: LockStrategy::default(),
        }
    }

    /// Set the expiry threshold / sweep interval.
    pub fn with_purge_after(mut self, purge_after: Duration) -> Self {
        self.purge_after = purge_after;
        self
    }

    /// Enable or disable lazily scheduled sweeps.
    pub fn with_auto_purge(mut self, auto_purge: bool) -> Self {
        self.auto_purge = auto_purge;
        self
    }

    /// Set the key lock granularity.
    pub fn with_lock_strategy(mut self, strategy: LockStrategy) -> Self {
        self.lock_strategy = strategy;
        self
    }
}

//! The disk-backed blob store.
//!
//! Entries live as `{cache_dir}/{key}.tmp`, one file per key. Writes land in
//! a staging file first and are renamed into place under the key lock, so a
//! reader never observes a half-written entry.
//!
//! # Expiry
//!
//! Lookups lazily schedule a background sweep when auto-purge is enabled and
//! the purge interval has elapsed since the last sweep. At most one sweep is
//! in flight per cache instance; the "last purge" clock is advanced when a
//! sweep finishes, even if some files could not be deleted.
//!
//! The sweep deliberately does not hold key locks while it enumerates and
//! deletes, so it can race a concurrent `add` on the same key: a file
//! written while a sweep is mid-pass may be deleted right after creation if
//! the sweep observed a stale timestamp for it. Callers must tolerate an
//! entry disappearing at any time - which they already do, since any entry
//! can expire between a write and the next read.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::cache::config::DiskCacheConfig;
use crate::cache::error::CacheError;
use crate::cache::locks::KeyLocks;
use crate::cache::sweep::{self, CacheStats, PurgeResult};

/// File extension for cache entry files.
const ENTRY_EXTENSION: &str = "tmp";

/// Suffix for staging files while a write is in progress.
const STAGING_SUFFIX: &str = "partial";

/// Scheduler state for the lazy background sweep.
///
/// Held behind its own short-critical-section lock, separate from the key
/// locks, so scheduling decisions never wait on file I/O.
struct PurgeState {
    /// Whether a sweep is currently in flight.
    in_flight: bool,
    /// When the last sweep finished; `None` until the first one runs, so the
    /// first lookup after open schedules a sweep immediately.
    last_purge: Option<Instant>,
}

/// Disk-backed blob cache.
///
/// Open one per cache directory and share it (typically via `Arc`) across
/// tasks; all methods take `&self`.
pub struct DiskCache {
    config: DiskCacheConfig,
    locks: KeyLocks,
    purge_state: Arc<Mutex<PurgeState>>,
}

impl DiskCache {
    /// Open a cache over `config.directory`, creating the directory if it
    /// does not exist.
    pub async fn open(config: DiskCacheConfig) -> Result<Self, CacheError> {
        tokio::fs::create_dir_all(&config.directory).await?;

        info!(
            dir = %config.directory.display(),
            purge_after_secs = config.purge_after.as_secs(),
            auto_purge = config.auto_purge,
            lock_strategy = %config.lock_strategy,
            "disk cache opened"
        );

        Ok(Self {
            locks: KeyLocks::new(config.lock_strategy),
            purge_state: Arc::new(Mutex::new(PurgeState {
                in_flight: false,
                last_purge: None,
            })),
            config,
        })
    }

    /// The directory entries are stored under.
    pub fn directory(&self) -> &std::path::Path {
        &self.config.directory
    }

    /// Store `data` under `key`, replacing any previous content.
    ///
    /// The write goes to a staging file and is renamed into place, all under
    /// the key lock, so concurrent writers leave one full value and readers
    /// never see an interleaving.
    pub async fn add(&self, key: &str, data: &[u8]) -> Result<(), CacheError> {
        let path = self.entry_path(key)?;
        let staging = self.staging_path(key)?;

        let _guard = self.locks.lock(key).await;
        tokio::fs::write(&staging, data).await?;
        tokio::fs::rename(&staging, &path).await?;

        debug!(key, bytes = data.len(), "cache entry written");
        Ok(())
    }

    /// Retrieve the content stored under `key`.
    ///
    /// Returns `Ok(None)` on a miss; I/O failures are reported as errors,
    /// never conflated with a miss. Schedules a background sweep first if
    /// auto-purge is enabled and one is due.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.entry_path(key)?;
        self.maybe_schedule_sweep();

        let _guard = self.locks.lock(key).await;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Io(e)),
        }
    }

    /// Stream the content stored under `key` into `sink`.
    ///
    /// Returns `Ok(true)` and copies the file's bytes on a hit, `Ok(false)`
    /// on a miss. The key lock is held for the duration of the copy.
    pub async fn transmit<W>(&self, key: &str, sink: &mut W) -> Result<bool, CacheError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let path = self.entry_path(key)?;
        self.maybe_schedule_sweep();

        let _guard = self.locks.lock(key).await;
        let mut file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(CacheError::Io(e)),
        };

        tokio::io::copy(&mut file, sink).await?;
        sink.flush().await?;
        Ok(true)
    }

    /// Check whether an entry exists for `key` without reading it.
    pub async fn contains(&self, key: &str) -> Result<bool, CacheError> {
        let path = self.entry_path(key)?;
        self.maybe_schedule_sweep();

        let _guard = self.locks.lock(key).await;
        match tokio::fs::metadata(&path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io(e)),
        }
    }

    /// Delete every entry whose file name contains `fragment`, immediately
    /// and regardless of age. Returns how many files were removed.
    pub async fn force_purge(&self, fragment: &str) -> Result<usize, CacheError> {
        if fragment.is_empty() {
            return Err(CacheError::InvalidKey {
                key: fragment.to_string(),
                reason: "purge fragment is empty",
            });
        }

        // Serialize with reads/writes of the same id. Files matched only by
        // substring are not covered by this lock; like the sweep, their
        // deletion can race concurrent writers.
        let _guard = self.locks.lock(fragment).await;

        let dir = self.config.directory.clone();
        let fragment = fragment.to_string();
        let removed = tokio::task::spawn_blocking(move || sweep::remove_matching(&dir, &fragment))
            .await
            .map_err(|e| CacheError::Sweep(e.to_string()))??;

        debug!(removed, "forced purge complete");
        Ok(removed)
    }

    /// Run an expiry sweep now and wait for it.
    ///
    /// Removes every entry older than the configured purge interval. If a
    /// sweep is already in flight the call is a no-op and reports zero
    /// removals.
    pub async fn purge_expired(&self) -> Result<PurgeResult, CacheError> {
        if !self.try_begin_sweep() {
            debug!("sweep already in flight, skipping");
            return Ok(PurgeResult::default());
        }

        let dir = self.config.directory.clone();
        let max_age = self.config.purge_after;
        let outcome = tokio::task::spawn_blocking(move || sweep::sweep_expired(&dir, max_age)).await;
        self.finish_sweep();

        let result = outcome.map_err(|e| CacheError::Sweep(e.to_string()))??;
        if result.entries_removed > 0 {
            info!(%result, "expiry sweep complete");
        }
        Ok(result)
    }

    /// Remove every entry regardless of age.
    pub async fn clear(&self) -> Result<PurgeResult, CacheError> {
        let dir = self.config.directory.clone();
        let result = tokio::task::spawn_blocking(move || sweep::sweep_all(&dir))
            .await
            .map_err(|e| CacheError::Sweep(e.to_string()))??;

        info!(%result, "cache cleared");
        Ok(result)
    }

    /// Count entries and total bytes currently on disk.
    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        let dir = self.config.directory.clone();
        let stats = tokio::task::spawn_blocking(move || sweep::scan(&dir))
            .await
            .map_err(|e| CacheError::Sweep(e.to_string()))??;
        Ok(stats)
    }

    /// Schedule a background sweep if auto-purge is on and one is due.
    ///
    /// The sweep runs on a spawned task and the blocking pool; the calling
    /// lookup does not wait for it. Once scheduled it runs to completion -
    /// there is no cancellation.
    fn maybe_schedule_sweep(&self) {
        if !self.config.auto_purge {
            return;
        }

        {
            let mut state = self.purge_state.lock();
            if state.in_flight {
                return;
            }
            let due = match state.last_purge {
                None => true,
                Some(last) => last.elapsed() >= self.config.purge_after,
            };
            if !due {
                return;
            }
            state.in_flight = true;
        }

        let state = Arc::clone(&self.purge_state);
        let dir = self.config.directory.clone();
        let max_age = self.config.purge_after;

        tokio::spawn(async move {
            let outcome =
                tokio::task::spawn_blocking(move || sweep::sweep_expired(&dir, max_age)).await;

            match outcome {
                Ok(Ok(result)) if result.entries_removed > 0 => {
                    info!(%result, "background expiry sweep complete");
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!(error = %e, "background expiry sweep failed"),
                Err(e) => warn!(error = %e, "background expiry sweep did not run"),
            }

            // Advance the clock even after a partial failure so a broken
            // directory does not turn every lookup into a sweep attempt.
            let mut state = state.lock();
            state.in_flight = false;
            state.last_purge = Some(Instant::now());
        });
    }

    /// Claim the sweep-in-flight flag. Returns false if already claimed.
    fn try_begin_sweep(&self) -> bool {
        let mut state = self.purge_state.lock();
        if state.in_flight {
            return false;
        }
        state.in_flight = true;
        true
    }

    /// Release the sweep-in-flight flag and advance the last-purge clock.
    fn finish_sweep(&self) {
        let mut state = self.purge_state.lock();
        state.in_flight = false;
        state.last_purge = Some(Instant::now());
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, CacheError> {
        validate_key(key)?;
        Ok(self
            .config
            .directory
            .join(format!("{}.{}", key, ENTRY_EXTENSION)))
    }

    fn staging_path(&self, key: &str) -> Result<PathBuf, CacheError> {
        validate_key(key)?;
        Ok(self
            .config
            .directory
            .join(format!("{}.{}.{}", key, ENTRY_EXTENSION, STAGING_SUFFIX)))
    }
}

/// Keys map 1:1 to file names, so anything that could escape the cache
/// directory is rejected up front.
fn validate_key(key: &str) -> Result<(), CacheError> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey {
            key: key.to_string(),
            reason: "key is empty",
        });
    }
    if key.contains('/') || key.contains('\\') {
        return Err(CacheError::InvalidKey {
            key: key.to_string(),
            reason: "key must not contain path separators",
        });
    }
    if key.contains("..") {
        return Err(CacheError::InvalidKey {
            key: key.to_string(),
            reason: "key must not contain '..'",
        });
    }
    Ok(())
}

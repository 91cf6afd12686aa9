//! Blocking filesystem passes over the cache directory.
//!
//! These run on the blocking thread pool (`spawn_blocking`) since they walk
//! and mutate the directory with synchronous I/O. The cache directory is
//! flat: every entry is a regular file directly under it.
//!
//! A file that fails to delete (e.g. held open elsewhere) is retried once
//! after yielding the thread; if it still fails it is left for the next
//! sweep rather than failing the pass.

use std::fmt;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::debug;

/// Result of one purge pass over the cache directory.
#[derive(Debug, Clone, Default)]
pub struct PurgeResult {
    /// Number of entries removed.
    pub entries_removed: usize,
    /// Total bytes freed.
    pub bytes_freed: u64,
    /// Duration of the pass in milliseconds.
    pub duration_ms: u64,
}

impl fmt::Display for PurgeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "purge: removed {} entries, freed {} bytes in {}ms",
            self.entries_removed, self.bytes_freed, self.duration_ms
        )
    }
}

/// Point-in-time size of the cache directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entry files.
    pub files: u64,
    /// Total size of entry files in bytes.
    pub bytes: u64,
}

/// Remove every file older than `max_age`.
///
/// The comparison is strict: a file whose age is exactly `max_age` survives.
/// Age is taken from the file's modified time, so overwriting an entry
/// resets its age.
pub(crate) fn sweep_expired(dir: &Path, max_age: Duration) -> io::Result<PurgeResult> {
    remove_files(dir, Some(max_age))
}

/// Remove every file regardless of age.
pub(crate) fn sweep_all(dir: &Path) -> io::Result<PurgeResult> {
    remove_files(dir, None)
}

fn remove_files(dir: &Path, older_than: Option<Duration>) -> io::Result<PurgeResult> {
    let start = Instant::now();
    let now = SystemTime::now();

    let mut removed = 0usize;
    let mut freed = 0u64;

    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();
        let metadata = match entry.metadata() {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => continue,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping entry without metadata");
                continue;
            }
        };

        if let Some(max_age) = older_than {
            let mtime = metadata.modified().unwrap_or(UNIX_EPOCH);
            let age = now.duration_since(mtime).unwrap_or_default();
            if age <= max_age {
                continue;
            }
        }

        if remove_with_retry(&path) {
            removed += 1;
            freed += metadata.len();
        }
    }

    Ok(PurgeResult {
        entries_removed: removed,
        bytes_freed: freed,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Remove every file whose name contains `fragment`; returns how many went.
pub(crate) fn remove_matching(dir: &Path, fragment: &str) -> io::Result<usize> {
    let mut removed = 0usize;

    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name();
        if !name.to_string_lossy().contains(fragment) {
            continue;
        }
        if remove_with_retry(&path) {
            removed += 1;
        }
    }

    Ok(removed)
}

/// Count entry files and their total size.
pub(crate) fn scan(dir: &Path) -> io::Result<CacheStats> {
    let mut stats = CacheStats::default();

    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        if let Ok(metadata) = entry.metadata() {
            if metadata.is_file() {
                stats.files += 1;
                stats.bytes += metadata.len();
            }
        }
    }

    Ok(stats)
}

/// Delete a file, retrying once after yielding if the first attempt fails.
///
/// Returns whether the file is gone. A file already removed by a concurrent
/// pass counts as deleted by the other pass, not this one.
fn remove_with_retry(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(first) => {
            std::thread::yield_now();
            match std::fs::remove_file(path) {
                Ok(()) => true,
                Err(e) if e.kind() == io::ErrorKind::NotFound => false,
                Err(second) => {
                    debug!(
                        path = %path.display(),
                        first = %first,
                        second = %second,
                        "leaving undeletable file for the next sweep"
                    );
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use tempfile::TempDir;

    fn write_entry(dir: &Path, name: &str, data: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    fn backdate(path: &Path, secs: u64) {
        let mtime = SystemTime::now() - Duration::from_secs(secs);
        filetime::set_file_mtime(path, FileTime::from_system_time(mtime)).unwrap();
    }

    #[test]
    fn test_sweep_removes_old_retains_young() {
        let dir = TempDir::new().unwrap();
        let old = write_entry(dir.path(), "old.tmp", b"aaaa");
        let young = write_entry(dir.path(), "young.tmp", b"bb");
        backdate(&old, 120);

        let result = sweep_expired(dir.path(), Duration::from_secs(60)).unwrap();

        assert_eq!(result.entries_removed, 1);
        assert_eq!(result.bytes_freed, 4);
        assert!(!old.exists());
        assert!(young.exists());
    }

    #[test]
    fn test_sweep_empty_directory() {
        let dir = TempDir::new().unwrap();
        let result = sweep_expired(dir.path(), Duration::from_secs(1)).unwrap();
        assert_eq!(result.entries_removed, 0);
        assert_eq!(result.bytes_freed, 0);
    }

    #[test]
    fn test_sweep_missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(sweep_expired(&missing, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_sweep_all_ignores_age() {
        let dir = TempDir::new().unwrap();
        write_entry(dir.path(), "a.tmp", b"123");
        write_entry(dir.path(), "b.tmp", b"45678");

        let result = sweep_all(dir.path()).unwrap();

        assert_eq!(result.entries_removed, 2);
        assert_eq!(result.bytes_freed, 8);
    }

    #[test]
    fn test_sweep_skips_subdirectories() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        let old = write_entry(dir.path(), "old.tmp", b"x");
        backdate(&old, 120);

        let result = sweep_expired(dir.path(), Duration::from_secs(60)).unwrap();

        assert_eq!(result.entries_removed, 1);
        assert!(dir.path().join("nested").exists());
    }

    #[test]
    #[cfg(unix)]
    fn test_undeletable_file_left_for_next_sweep() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        let old = write_entry(&locked, "old.tmp", b"data");
        backdate(&old, 120);

        // A read-only parent makes both delete attempts fail with EACCES.
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        let result = sweep_expired(&locked, Duration::from_secs(60)).unwrap();

        // Root bypasses the mode bits; only assert when the delete
        // actually failed.
        if old.exists() {
            assert_eq!(result.entries_removed, 0);
            assert_eq!(result.bytes_freed, 0);
        }

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        // Writable again, so the next sweep picks the file up.
        if old.exists() {
            let retried = sweep_expired(&locked, Duration::from_secs(60)).unwrap();
            assert_eq!(retried.entries_removed, 1);
            assert!(!old.exists());
        }
    }

    #[test]
    fn test_remove_matching_by_fragment() {
        let dir = TempDir::new().unwrap();
        write_entry(dir.path(), "tile-12.tmp", b"a");
        write_entry(dir.path(), "tile-13.tmp", b"b");
        write_entry(dir.path(), "other.tmp", b"c");

        let removed = remove_matching(dir.path(), "tile-1").unwrap();

        assert_eq!(removed, 2);
        assert!(dir.path().join("other.tmp").exists());
    }

    #[test]
    fn test_remove_matching_no_match() {
        let dir = TempDir::new().unwrap();
        write_entry(dir.path(), "a.tmp", b"a");
        assert_eq!(remove_matching(dir.path(), "zzz").unwrap(), 0);
    }

    #[test]
    fn test_scan_counts_files_and_bytes() {
        let dir = TempDir::new().unwrap();
        write_entry(dir.path(), "a.tmp", b"1234");
        write_entry(dir.path(), "b.tmp", b"56");

        let stats = scan(dir.path()).unwrap();

        assert_eq!(stats, CacheStats { files: 2, bytes: 6 });
    }

    #[test]
    fn test_purge_result_display() {
        let result = PurgeResult {
            entries_removed: 3,
            bytes_freed: 1024,
            duration_ms: 7,
        };
        let text = result.to_string();
        assert!(text.contains("3 entries"));
        assert!(text.contains("1024 bytes"));
    }
}

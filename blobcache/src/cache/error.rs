//! Cache error types.
//!
//! Every operation surfaces its failure mode explicitly: a cache miss is
//! `Ok(None)` (or `Ok(false)`), never an error, so callers can always tell
//! "not cached" apart from "cache broken".

use thiserror::Error;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem I/O failure (disk full, permission denied, path missing).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The key cannot be mapped to a file name inside the cache directory.
    #[error("invalid cache key {key:?}: {reason}")]
    InvalidKey {
        key: String,
        reason: &'static str,
    },

    /// A background or blocking sweep task failed to run to completion.
    #[error("sweep task failed: {0}")]
    Sweep(String),
}

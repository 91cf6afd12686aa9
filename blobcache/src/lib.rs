//! Blobcache - disk-backed binary object cache with time-based purging.
//!
//! This library stores opaque binary blobs as files on disk, keyed by an
//! opaque string identifier, and expires them with a lazily scheduled
//! background sweep. It is a single-process cache: there is no cross-instance
//! invalidation and no crash durability beyond what the filesystem provides.
//!
//! # Architecture
//!
//! ```text
//! Callers ────► DiskCache ────► {cache_dir}/{key}.tmp
//!                  │
//!                  └──► expiry sweep (background task, at most one in flight)
//! ```
//!
//! The cache is an explicitly constructed instance owned by the composition
//! root and shared via `Arc` - there is no global singleton.
//!
//! # Example
//!
//! ```ignore
//! use blobcache::{DiskCache, DiskCacheConfig};
//! use std::time::Duration;
//!
//! let cache = DiskCache::open(
//!     DiskCacheConfig::new("/var/cache/blobs").with_purge_after(Duration::from_secs(300)),
//! )
//! .await?;
//!
//! cache.add("report-1138", &bytes).await?;
//! if let Some(data) = cache.get("report-1138").await? {
//!     // cache hit
//! }
//! ```

pub mod cache;
pub mod config;

pub use cache::{
    CacheError, CacheStats, DiskCache, DiskCacheConfig, LockStrategy, PurgeResult,
};
pub use config::{format_size, ConfigError, ConfigFile};

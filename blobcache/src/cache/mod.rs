//! Disk-backed blob cache with time-based expiry.
//!
//! The cache maps string keys to files under a single cache directory and
//! removes entries once they are older than a configured threshold. Expiry
//! runs as a background sweep that is lazily triggered by lookups, with at
//! most one sweep in flight per cache instance.
//!
//! # Components
//!
//! - [`DiskCache`]: the store itself (add / get / transmit / purge)
//! - [`DiskCacheConfig`]: construction-time configuration
//! - [`LockStrategy`]: coarse (one lock for all keys) or per-key locking
//! - [`PurgeResult`] / [`CacheStats`]: sweep and scan reporting
//!
//! # Creating a cache
//!
//! ```ignore
//! use blobcache::cache::{DiskCache, DiskCacheConfig};
//!
//! let cache = DiskCache::open(DiskCacheConfig::new("/var/cache/blobs")).await?;
//! ```

mod config;
mod error;
mod locks;
mod store;
mod sweep;

pub use config::{DiskCacheConfig, LockStrategy, DEFAULT_PURGE_INTERVAL_SECS};
pub use error::CacheError;
pub use store::DiskCache;
pub use sweep::{CacheStats, PurgeResult};

//! Cache operation CLI commands.
//!
//! Thin wrappers over [`DiskCache`]: read input, call the library, print
//! what happened. Blob output goes through `transmit` so large entries are
//! streamed rather than buffered.

use std::path::Path;

use blobcache::{format_size, DiskCache};
use tokio::io::AsyncReadExt;

use crate::error::CliError;

/// Store a blob read from a file, or stdin when no file is given.
pub async fn run_add(cache: &DiskCache, key: &str, file: Option<&Path>) -> Result<(), CliError> {
    let data = match file {
        Some(path) => tokio::fs::read(path).await.map_err(|e| CliError::FileRead {
            path: path.display().to_string(),
            error: e,
        })?,
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .map_err(|e| CliError::FileRead {
                    path: "<stdin>".to_string(),
                    error: e,
                })?;
            buf
        }
    };

    cache.add(key, &data).await?;
    eprintln!("Stored {} under {:?}", format_size(data.len()), key);
    Ok(())
}

/// Stream a cached blob to stdout, or to a file with `--output`.
pub async fn run_get(cache: &DiskCache, key: &str, output: Option<&Path>) -> Result<(), CliError> {
    let found = match output {
        Some(path) => {
            let mut sink =
                tokio::fs::File::create(path)
                    .await
                    .map_err(|e| CliError::FileWrite {
                        path: path.display().to_string(),
                        error: e,
                    })?;
            cache.transmit(key, &mut sink).await?
        }
        None => cache.transmit(key, &mut tokio::io::stdout()).await?,
    };

    if !found {
        return Err(CliError::NotFound(key.to_string()));
    }
    Ok(())
}

/// Delete every entry whose file name contains the fragment.
pub async fn run_purge(cache: &DiskCache, fragment: &str) -> Result<(), CliError> {
    let removed = cache.force_purge(fragment).await?;
    println!("Removed {} entries matching {:?}", removed, fragment);
    Ok(())
}

/// Run an expiry sweep and report what it removed.
pub async fn run_sweep(cache: &DiskCache) -> Result<(), CliError> {
    let result = cache.purge_expired().await?;
    println!(
        "Removed {} expired entries, freed {}",
        result.entries_removed,
        format_size(result.bytes_freed as usize)
    );
    Ok(())
}

/// Print entry count and total size.
pub async fn run_stats(cache: &DiskCache) -> Result<(), CliError> {
    let stats = cache.stats().await?;
    println!("Cache: {}", cache.directory().display());
    println!("  Entries: {}", stats.files);
    println!("  Size:    {}", format_size(stats.bytes as usize));
    Ok(())
}

/// Remove every entry regardless of age.
pub async fn run_clear(cache: &DiskCache) -> Result<(), CliError> {
    let result = cache.clear().await?;
    println!(
        "Deleted {} entries, freed {}",
        result.entries_removed,
        format_size(result.bytes_freed as usize)
    );
    Ok(())
}

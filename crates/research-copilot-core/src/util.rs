//! Utility functions shared across the crate.

use std::path::PathBuf;

use crate::cache::{DiskStore, DocumentCache};
use crate::config::CacheConfig;
use crate::error::Result;

/// Get the user's config directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// Get the user's cache directory following XDG conventions.
///
/// Returns `$XDG_CACHE_HOME` if set, otherwise `$HOME/.cache`.
pub fn cache_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))
}

/// Get the default path of the persisted document list.
pub fn document_cache_path() -> PathBuf {
    cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("research-copilot")
}

/// Forget the persisted document list at the configured (or default) path.
///
/// Returns the number of records that were cached.
pub fn clear_document_cache(config: &CacheConfig) -> Result<usize> {
    let path = config.path.clone().unwrap_or_else(document_cache_path);

    if !path.exists() {
        return Ok(0);
    }

    let cache = DocumentCache::new(std::sync::Arc::new(DiskStore::open(&path)?));
    let count = cache.load().len();
    cache.clear()?;

    Ok(count)
}

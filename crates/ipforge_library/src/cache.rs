//! On-disk catalog cache: one JSON blob stamped with the library tree's
//! maximum mtime.

use crate::error::LibraryError;
use crate::types::Catalog;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Bump when the serialized shape changes; mismatched caches are treated
/// as missing.
const CACHE_FORMAT_VERSION: u32 = 1;

/// The serialized cache blob.
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogCache {
    format_version: u32,
    /// Maximum modification time (integer seconds since the epoch)
    /// observed over the library tree when the catalog was built.
    pub max_mtime_secs: u64,
    /// The catalog itself.
    pub catalog: Catalog,
}

impl CatalogCache {
    /// Wraps a freshly built catalog for saving.
    pub fn new(catalog: Catalog, max_mtime_secs: u64) -> Self {
        Self {
            format_version: CACHE_FORMAT_VERSION,
            max_mtime_secs,
            catalog,
        }
    }

    /// Loads a cache blob. Fail-safe: any read, parse, or version problem
    /// is a cache miss, never an error.
    pub fn load(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        let cache: CatalogCache = serde_json::from_str(&content).ok()?;
        (cache.format_version == CACHE_FORMAT_VERSION).then_some(cache)
    }

    /// Returns `true` when the cache is at least as new as the library
    /// tree's current maximum mtime.
    pub fn is_fresh(&self, current_max_mtime_secs: u64) -> bool {
        self.max_mtime_secs >= current_max_mtime_secs
    }

    /// Saves the blob atomically: writes a sibling temporary file and
    /// renames it into place, so a concurrent reader never sees a torn
    /// cache.
    pub fn save(&self, path: &Path) -> Result<(), LibraryError> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| LibraryError::Serialization {
                reason: e.to_string(),
            })?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json).map_err(|e| LibraryError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, path).map_err(|e| LibraryError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

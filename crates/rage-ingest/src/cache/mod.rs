//! Content-addressed document cache
//!
//! Keys are content hashes of raw source bytes, so the same key always maps
//! to the same value. Concurrent population of one key is therefore benign
//! and implementations need no coordination beyond their own storage.

mod disk;
mod memory;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{CacheBackend, CacheConfig};
use crate::error::Result;
use crate::types::Document;

pub use disk::DiskCache;
pub use memory::MemoryCache;

/// Trait for storing parsed documents by source content hash
///
/// Implementations:
/// - `MemoryCache`: process-local map
/// - `DiskCache`: one JSON file per key
#[async_trait]
pub trait DocumentCache: Send + Sync {
    /// Look up a previously stored document list
    ///
    /// A fault (unreadable or corrupt entry) is reported as an error; callers
    /// treat it as a miss.
    async fn get(&self, key: &str) -> Result<Option<Vec<Document>>>;

    /// Store a document list under `key`
    async fn put(&self, key: &str, documents: &[Document]) -> Result<()>;

    /// Cache name for logging
    fn name(&self) -> &str;
}

/// Build the cache described by the config, if any
pub fn from_config(config: &CacheConfig) -> Option<Arc<dyn DocumentCache>> {
    match config.backend {
        CacheBackend::None => None,
        CacheBackend::Memory => Some(Arc::new(MemoryCache::new())),
        CacheBackend::Disk => Some(Arc::new(DiskCache::new(config.dir.clone()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let mut config = CacheConfig::default();
        assert!(from_config(&config).is_none());

        config.backend = CacheBackend::Memory;
        assert_eq!(from_config(&config).unwrap().name(), "memory");

        config.backend = CacheBackend::Disk;
        assert_eq!(from_config(&config).unwrap().name(), "disk");
    }
}

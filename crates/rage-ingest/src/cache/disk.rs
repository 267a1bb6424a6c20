//! On-disk document cache (one JSON file per key)

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::DocumentCache;
use crate::error::{Error, Result};
use crate::types::Document;

/// Suffix counter keeping concurrent temp files apart
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Document cache persisted as `<dir>/<key>.json`
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Create a cache rooted at `dir` (created lazily on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl DocumentCache for DiskCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<Document>>> {
        let path = self.entry_path(key);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let documents = serde_json::from_slice(&raw)
            .map_err(|e| Error::cache(format!("corrupt entry {}: {}", path.display(), e)))?;
        Ok(Some(documents))
    }

    async fn put(&self, key: &str, documents: &[Document]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write-then-rename so readers never observe a partial entry
        let path = self.entry_path(key);
        let seq = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .dir
            .join(format!("{}.{}.{}.tmp", key, std::process::id(), seq));
        let raw = serde_json::to_vec(documents)?;
        tokio::fs::write(&tmp, raw).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "disk"
    }
}

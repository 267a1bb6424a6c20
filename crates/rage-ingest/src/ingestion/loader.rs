//! Bounded-concurrency, cache-aware document loading

use futures::future::try_join_all;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};

use super::parser::{file_stem, DocumentParser};
use crate::cache::{self, DocumentCache};
use crate::config::{LoadingConfig, RageConfig};
use crate::error::{Error, Result};
use crate::hash::{hash_bytes, hash_content};
use crate::types::{keys, Document};

/// Upper bound of the default concurrency (CPU count, capped)
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Loads source files into stamped documents
///
/// Parsing runs on the blocking thread pool behind a semaphore. With a cache
/// configured, parser output is stored under the hash of the raw source bytes,
/// so byte-identical files share one entry whatever their names. One permit
/// covers the whole load of a source: key read, cache lookup, parse and store.
pub struct Loader {
    parser: Arc<dyn DocumentParser>,
    cache: Option<Arc<dyn DocumentCache>>,
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
}

impl Loader {
    /// Create a loader without cache, with the default concurrency of [`LoadingConfig`]
    pub fn new(parser: Arc<dyn DocumentParser>) -> Self {
        let max_concurrency = LoadingConfig::default().max_concurrency;
        Self {
            parser,
            cache: None,
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        }
    }

    /// Build a loader from configuration
    pub fn from_config(parser: Arc<dyn DocumentParser>, config: &RageConfig) -> Result<Self> {
        let mut loader = Self::new(parser).with_max_concurrency(config.loading.max_concurrency)?;
        loader.cache = cache::from_config(&config.cache);
        Ok(loader)
    }

    /// Attach a document cache
    pub fn with_cache(mut self, cache: Arc<dyn DocumentCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Limit the number of concurrent parser calls
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Result<Self> {
        if max_concurrency == 0 {
            return Err(Error::config("max_concurrency must be at least 1"));
        }
        self.semaphore = Arc::new(Semaphore::new(max_concurrency));
        self.max_concurrency = max_concurrency;
        Ok(self)
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn parser(&self) -> &dyn DocumentParser {
        self.parser.as_ref()
    }

    /// Run the parser on `source_path` under the concurrency bound
    ///
    /// `None` means "no content" and yields no documents. Blank documents are
    /// dropped; the result is not stamped.
    pub async fn get_documents(&self, source_path: Option<&Path>) -> Result<Vec<Document>> {
        let Some(path) = source_path else {
            return Ok(Vec::new());
        };

        let _permit = self.acquire().await?;
        self.parse(path).await
    }

    async fn acquire(&self) -> Result<SemaphorePermit<'_>> {
        self.semaphore
            .acquire()
            .await
            .map_err(|e| Error::internal(format!("Loader semaphore closed: {}", e)))
    }

    /// Parse off the runtime and drop blank documents; the caller holds a permit
    async fn parse(&self, path: &Path) -> Result<Vec<Document>> {
        let parser = self.parser.clone();
        let owned_path = path.to_path_buf();
        let documents = tokio::task::spawn_blocking(move || parser.parse(&owned_path)).await??;

        Ok(documents.into_iter().filter(|d| !d.is_blank()).collect())
    }

    /// Load one source: cache lookup, parse on miss, stamp metadata
    pub async fn load(&self, source_path: Option<&Path>) -> Result<Vec<Document>> {
        let Some(path) = source_path else {
            return Ok(Vec::new());
        };

        let _permit = self.acquire().await?;
        let documents = match &self.cache {
            Some(cache) => self.load_cached(cache.as_ref(), path).await?,
            None => self.parse(path).await?,
        };

        Ok(stamp_metadata(documents, Some(path)))
    }

    async fn load_cached(&self, cache: &dyn DocumentCache, path: &Path) -> Result<Vec<Document>> {
        let cache_key = hash_bytes(&tokio::fs::read(path).await?);

        match cache.get(&cache_key).await {
            Ok(Some(documents)) => {
                tracing::debug!("Cache hit for {} ({})", path.display(), &cache_key[..12]);
                return Ok(documents);
            }
            Ok(None) => {
                tracing::debug!("Cache miss for {} ({})", path.display(), &cache_key[..12]);
            }
            Err(e) => {
                tracing::warn!("Cache {} read failed for {}, reparsing: {}", cache.name(), path.display(), e);
            }
        }

        let documents = self.parse(path).await?;
        if let Err(e) = cache.put(&cache_key, &documents).await {
            tracing::warn!("Cache {} write failed for {}: {}", cache.name(), path.display(), e);
        }

        Ok(documents)
    }

    /// Load every source concurrently, keeping one document list per input path
    ///
    /// Fails as soon as any load fails; no partial results are returned.
    pub async fn load_each<P: AsRef<Path>>(&self, source_paths: &[P]) -> Result<Vec<Vec<Document>>> {
        tracing::info!(
            "Loading {} sources with {} ({} concurrent)",
            source_paths.len(),
            self.parser.name(),
            self.max_concurrency
        );

        let loads = source_paths.iter().map(|p| self.load(Some(p.as_ref())));
        try_join_all(loads).await
    }

    /// Load every source concurrently and concatenate the results in input order
    pub async fn batch_load<P: AsRef<Path>>(&self, source_paths: &[P]) -> Result<Vec<Document>> {
        let documents: Vec<Document> = self.load_each(source_paths).await?.into_iter().flatten().collect();
        tracing::info!("Loaded {} documents from {} sources", documents.len(), source_paths.len());
        Ok(documents)
    }
}

/// Stamp `document_index`, `document_id` and `file_name` onto parser output
pub fn stamp_metadata(documents: Vec<Document>, source_path: Option<&Path>) -> Vec<Document> {
    let file_name = source_path.and_then(file_stem).map(Value::String).unwrap_or(Value::Null);

    documents
        .into_iter()
        .enumerate()
        .map(|(idx, mut document)| {
            document.metadata.insert(keys::DOCUMENT_INDEX.to_string(), Value::from(idx + 1));
            document
                .metadata
                .insert(keys::DOCUMENT_ID.to_string(), Value::String(hash_content(&document.text)));
            document.metadata.insert(keys::FILE_NAME.to_string(), file_name.clone());
            document
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// One document per line; counts calls and peak concurrency
    #[derive(Default)]
    struct LineParser {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        delay: Option<Duration>,
    }

    impl DocumentParser for LineParser {
        fn parse(&self, path: &Path) -> Result<Vec<Document>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let refused = path
                .file_name()
                .map(|n| n.to_string_lossy().starts_with("bad"))
                .unwrap_or(false);
            if refused {
                return Err(Error::file_parse(path.display().to_string(), "refused"));
            }

            let text = std::fs::read_to_string(path)?;
            Ok(text.lines().map(Document::new).collect())
        }

        fn name(&self) -> &str {
            "lines"
        }
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_none_path_is_empty() {
        let loader = Loader::new(Arc::new(LineParser::default()));
        assert!(loader.load(None).await.unwrap().is_empty());
        assert!(loader.get_documents(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_stamps_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "notes.txt", "first\n\n   \nsecond\n");

        let loader = Loader::new(Arc::new(LineParser::default()));
        let documents = loader.load(Some(path.as_path())).await.unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].text, "first");
        assert_eq!(documents[0].metadata[keys::DOCUMENT_INDEX], 1);
        assert_eq!(documents[1].metadata[keys::DOCUMENT_INDEX], 2);
        assert_eq!(documents[1].metadata[keys::DOCUMENT_ID], hash_content("second"));
        assert_eq!(documents[1].metadata[keys::FILE_NAME], "notes");
    }

    #[test]
    fn test_stamp_without_path() {
        let documents = stamp_metadata(vec![Document::new("x")], None);
        assert_eq!(documents[0].metadata[keys::FILE_NAME], Value::Null);
        assert_eq!(documents[0].metadata[keys::DOCUMENT_INDEX], 1);
    }

    #[tokio::test]
    async fn test_batch_load_keeps_input_order_with_repeats() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.txt", "a1\na2");
        let b = write(dir.path(), "b.txt", "b1");

        let parser = Arc::new(LineParser::default());
        let loader = Loader::new(parser.clone());
        let documents = loader.batch_load(&[&a, &b, &a]).await.unwrap();

        let texts: Vec<_> = documents.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["a1", "a2", "b1", "a1", "a2"]);

        let indexes: Vec<_> = documents.iter().map(|d| d.metadata[keys::DOCUMENT_INDEX].clone()).collect();
        assert_eq!(indexes, vec![1, 2, 1, 1, 2]);

        // No cache: every occurrence is parsed on its own
        assert_eq!(parser.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_batch_load_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(dir.path(), "good.txt", "ok");
        let bad = write(dir.path(), "bad.txt", "never read");

        let loader = Loader::new(Arc::new(LineParser::default()));
        let result = loader.batch_load(&[&good, &bad, &good]).await;
        assert!(matches!(result, Err(Error::FileParse { .. })));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_parser_across_names() {
        let dir = tempfile::tempdir().unwrap();
        let original = write(dir.path(), "original.txt", "same\nbytes");
        let copy = write(dir.path(), "copy.txt", "same\nbytes");

        let parser = Arc::new(LineParser::default());
        let cache = Arc::new(MemoryCache::new());
        let loader = Loader::new(parser.clone()).with_cache(cache.clone());

        let first = loader.load(Some(original.as_path())).await.unwrap();
        let second = loader.load(Some(copy.as_path())).await.unwrap();

        assert_eq!(parser.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(first[0].text, second[0].text);
        assert_eq!(first[0].metadata[keys::DOCUMENT_ID], second[0].metadata[keys::DOCUMENT_ID]);
        // Stamping follows the requested path, not the cached one
        assert_eq!(first[0].metadata[keys::FILE_NAME], "original");
        assert_eq!(second[0].metadata[keys::FILE_NAME], "copy");
    }

    /// Cache whose reads always fail
    struct BrokenCache {
        puts: AtomicUsize,
    }

    #[async_trait]
    impl DocumentCache for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<Vec<Document>>> {
            Err(Error::cache("corrupt"))
        }

        async fn put(&self, _key: &str, _documents: &[Document]) -> Result<()> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            Err(Error::cache("read-only"))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_cache_faults_are_misses() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "doc.txt", "text");

        let parser = Arc::new(LineParser::default());
        let cache = Arc::new(BrokenCache { puts: AtomicUsize::new(0) });
        let loader = Loader::new(parser.clone()).with_cache(cache.clone());

        let documents = loader.load(Some(path.as_path())).await.unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(parser.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.puts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_file_with_cache_is_io_error() {
        let loader = Loader::new(Arc::new(LineParser::default())).with_cache(Arc::new(MemoryCache::new()));
        let result = loader.load(Some(Path::new("/definitely/not/here.txt"))).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<_> = (0..6)
            .map(|i| write(dir.path(), &format!("f{}.txt", i), "line"))
            .collect();

        let parser = Arc::new(LineParser {
            delay: Some(Duration::from_millis(30)),
            ..Default::default()
        });
        let loader = Loader::new(parser.clone()).with_max_concurrency(2).unwrap();

        let documents = loader.batch_load(&paths).await.unwrap();
        assert_eq!(documents.len(), 6);
        // Bounded, yet parses do overlap
        assert_eq!(parser.peak.load(Ordering::SeqCst), 2);
        assert_eq!(parser.calls.load(Ordering::SeqCst), 6);
    }

    /// Cache that never hits; tracks how many lookups run at once
    #[derive(Default)]
    struct SlowCache {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl DocumentCache for SlowCache {
        async fn get(&self, _key: &str) -> Result<Option<Vec<Document>>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(None)
        }

        async fn put(&self, _key: &str, _documents: &[Document]) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cached_loads_are_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<_> = (0..6)
            .map(|i| write(dir.path(), &format!("f{}.txt", i), &format!("line {}", i)))
            .collect();

        let parser = Arc::new(LineParser::default());
        let cache = Arc::new(SlowCache::default());
        let loader = Loader::new(parser.clone())
            .with_cache(cache.clone())
            .with_max_concurrency(2)
            .unwrap();

        let documents = loader.batch_load(&paths).await.unwrap();
        assert_eq!(documents.len(), 6);
        // Key read and lookup happen under the same permit as the parse
        assert_eq!(cache.peak.load(Ordering::SeqCst), 2);
        assert!(parser.peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_default_concurrency_matches_config() {
        let loader = Loader::new(Arc::new(LineParser::default()));
        assert_eq!(loader.max_concurrency(), LoadingConfig::default().max_concurrency);
        assert!(loader.max_concurrency() <= DEFAULT_MAX_CONCURRENCY);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = Loader::new(Arc::new(LineParser::default())).with_max_concurrency(0);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}

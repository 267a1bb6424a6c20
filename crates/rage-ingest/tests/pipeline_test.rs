//! End-to-end loading and chunking over files on disk

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rage_ingest::config::{CacheBackend, RageConfig, StrategyKind};
use rage_ingest::ingestion::{AutoDetect, SourceFormat};
use rage_ingest::tokenizer::{WhitespaceCounter, WHITESPACE_MODEL};
use rage_ingest::types::keys;
use rage_ingest::{DiskCache, Loader, Pipeline, TextChunk, TextSplitter};

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn numbered_words(prefix: &str, n: usize) -> String {
    (0..n).map(|i| format!("{}{}", prefix, i)).collect::<Vec<_>>().join(" ")
}

fn assert_linked(chunks: &[TextChunk]) {
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_index(), Some(i as u64 + 1));
        let previous = i.checked_sub(1).and_then(|p| chunks[p].chunk_id());
        let next = chunks.get(i + 1).and_then(|n| n.chunk_id());
        assert_eq!(chunk.previous_chunk_id(), previous);
        assert_eq!(chunk.next_chunk_id(), next);
    }
}

#[tokio::test]
async fn test_word_windows_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let long = write(dir.path(), "long.md", &numbered_words("a", 17));
    let short = write(dir.path(), "short.txt", &numbered_words("b", 15));

    let mut config = RageConfig::default();
    config.splitting.word.chunk_size = 10;
    config.splitting.word.chunk_overlap = 3;
    config.splitting.tokenizer.model = WHITESPACE_MODEL.to_string();

    let pipeline = Pipeline::from_config(Arc::new(AutoDetect), &config).unwrap();
    let per_source = pipeline.run_each(&[&long, &short]).await.unwrap();

    let long_chunks = &per_source[0];
    assert_eq!(long_chunks.len(), 2);
    assert_eq!(long_chunks[0].text, numbered_words("a", 10));
    assert!(long_chunks[1].text.starts_with("a7 "));
    assert!(long_chunks[1].text.ends_with(" a16"));
    assert_linked(long_chunks);

    let short_chunks = &per_source[1];
    assert_eq!(short_chunks.len(), 1);
    assert_eq!(short_chunks[0].text, numbered_words("b", 15));
    assert_eq!(short_chunks[0].num_tokens, 15);
    assert_eq!(short_chunks[0].metadata[keys::FILE_NAME], "short");
    assert_eq!(short_chunks[0].metadata[keys::DOCUMENT_INDEX], 1);
    assert!(short_chunks[0].document_id().is_some());
}

#[tokio::test]
async fn test_disk_cache_shared_by_identical_files() {
    let dir = tempfile::tempdir().unwrap();
    let cache_dir = dir.path().join("cache");
    let original = write(dir.path(), "original.md", "# Notes\n\nSame bytes in two files.");
    let copy = write(dir.path(), "copy.md", "# Notes\n\nSame bytes in two files.");

    let loader = Loader::new(Arc::new(SourceFormat::Markdown)).with_cache(Arc::new(DiskCache::new(&cache_dir)));
    let documents = loader.batch_load(&[&original, &copy]).await.unwrap();

    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].text, documents[1].text);
    assert_eq!(documents[0].metadata[keys::FILE_NAME], "original");
    assert_eq!(documents[1].metadata[keys::FILE_NAME], "copy");

    let entries: Vec<_> = std::fs::read_dir(&cache_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].ends_with(".json"));
}

#[tokio::test]
async fn test_disk_cache_survives_new_loader() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "doc.md", &numbered_words("w", 40));

    let mut config = RageConfig::default();
    config.cache.backend = CacheBackend::Disk;
    config.cache.dir = dir.path().join("cache");
    config.splitting.strategy = StrategyKind::Token;
    config.splitting.token.chunk_size = 12;
    config.splitting.token.chunk_overlap = 2;
    config.splitting.tokenizer.model = WHITESPACE_MODEL.to_string();

    let first = Pipeline::from_config(Arc::new(AutoDetect), &config)
        .unwrap()
        .run(&[&source])
        .await
        .unwrap();

    let entries = std::fs::read_dir(&config.cache.dir).unwrap().count();
    assert_eq!(entries, 1);

    let second = Pipeline::from_config(Arc::new(AutoDetect), &config)
        .unwrap()
        .run(&[&source])
        .await
        .unwrap();

    assert_eq!(first, second);
    assert!(first.len() > 1);
    assert!(first.iter().all(|c| c.num_tokens <= 12));
    assert_linked(&first);
}

#[tokio::test]
async fn test_unsupported_file_fails_batch() {
    let dir = tempfile::tempdir().unwrap();
    let good = write(dir.path(), "good.md", "fine");
    let odd = write(dir.path(), "data.bin", "???");

    let loader = Loader::new(Arc::new(AutoDetect));
    let err = loader.batch_load(&[&good, &odd]).await.unwrap_err();
    assert!(matches!(err, rage_ingest::Error::UnsupportedFileType(_)));
}

#[test]
fn test_html_split_along_headings() {
    let dir = tempfile::tempdir().unwrap();
    let page = write(
        dir.path(),
        "page.html",
        "<html><body><p>Preface</p><h1>One</h1><p>first</p><h1>Two</h1><p>second</p></body></html>",
    );

    let splitter = TextSplitter::markdown(
        rage_ingest::config::WindowConfig {
            chunk_size: 3,
            chunk_overlap: 0,
        },
        Arc::new(WhitespaceCounter),
    )
    .unwrap();
    let pipeline = Pipeline::new(Loader::new(Arc::new(AutoDetect)), splitter);

    let chunks = tokio_test::block_on(pipeline.run(&[&page])).unwrap();
    let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["Preface", "# One\n\nfirst", "# Two\n\nsecond"]);
    assert_linked(&chunks);
}

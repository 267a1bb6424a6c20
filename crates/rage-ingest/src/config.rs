//! Configuration for the ingestion pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::ingestion::DEFAULT_MAX_CONCURRENCY;

/// Main pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RageConfig {
    /// Loading configuration
    #[serde(default)]
    pub loading: LoadingConfig,
    /// Document cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Splitting configuration
    #[serde(default)]
    pub splitting: SplittingConfig,
}

impl RageConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject invalid combinations up front
    pub fn validate(&self) -> Result<()> {
        self.loading.validate()?;
        self.splitting.validate()
    }
}

/// Loading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadingConfig {
    /// Maximum number of parser calls in flight at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_max_concurrency() -> usize {
    num_cpus::get().clamp(1, DEFAULT_MAX_CONCURRENCY)
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl LoadingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(Error::config("loading.max_concurrency must be at least 1"));
        }
        Ok(())
    }
}

/// Cache backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// No caching
    #[default]
    None,
    /// Process-local in-memory cache
    Memory,
    /// JSON files on disk
    Disk,
}

/// Document cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Backend to use
    #[serde(default)]
    pub backend: CacheBackend,
    /// Directory for the disk backend
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rage-ingest")
        .join("documents")
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::None,
            dir: default_cache_dir(),
        }
    }
}

/// Splitting strategy selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Fixed-size word windows
    #[default]
    Word,
    /// Token-bounded segments
    Token,
    /// Token-bounded segments along Markdown structure
    Markdown,
    /// One chunk per title run
    Title,
    /// One chunk per document
    Document,
}

/// Chunk size and overlap, in words or tokens depending on the strategy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowConfig {
    /// Maximum units per chunk
    pub chunk_size: usize,
    /// Units shared by consecutive chunks
    pub chunk_overlap: usize,
}

impl WindowConfig {
    /// Enforce `0 <= chunk_overlap < chunk_size`
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::config("chunk_size must be at least 1"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

fn default_word_window() -> WindowConfig {
    WindowConfig {
        chunk_size: 128,
        chunk_overlap: 16,
    }
}

fn default_token_window() -> WindowConfig {
    WindowConfig {
        chunk_size: 256,
        chunk_overlap: 25,
    }
}

/// Title grouping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleConfig {
    /// Element type that starts a new run (compared case-insensitively)
    #[serde(default = "default_title_tag")]
    pub tag: String,
}

fn default_title_tag() -> String {
    "title".to_string()
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            tag: default_title_tag(),
        }
    }
}

/// Tokenizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// OpenAI model name for tiktoken, or "whitespace"
    #[serde(default = "default_tokenizer_model")]
    pub model: String,
    /// Hugging Face `tokenizer.json`; overrides `model` when set
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_tokenizer_model() -> String {
    "gpt-4o".to_string()
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            model: default_tokenizer_model(),
            path: None,
        }
    }
}

/// Splitting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplittingConfig {
    /// Strategy to use
    #[serde(default)]
    pub strategy: StrategyKind,
    /// Word window sizes (word strategy)
    #[serde(default = "default_word_window")]
    pub word: WindowConfig,
    /// Token window sizes (token and markdown strategies)
    #[serde(default = "default_token_window")]
    pub token: WindowConfig,
    /// Title grouping (title strategy)
    #[serde(default)]
    pub title: TitleConfig,
    /// Tokenizer used for sizing and `num_tokens`
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
}

impl Default for SplittingConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            word: default_word_window(),
            token: default_token_window(),
            title: TitleConfig::default(),
            tokenizer: TokenizerConfig::default(),
        }
    }
}

impl SplittingConfig {
    /// Validate the window of the selected strategy
    pub fn validate(&self) -> Result<()> {
        match self.strategy {
            StrategyKind::Word => self.word.validate(),
            StrategyKind::Token | StrategyKind::Markdown => self.token.validate(),
            StrategyKind::Title | StrategyKind::Document => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RageConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.splitting.strategy, StrategyKind::Word);
        assert_eq!(config.splitting.word.chunk_size, 128);
        assert_eq!(config.splitting.word.chunk_overlap, 16);
        assert_eq!(config.splitting.token.chunk_size, 256);
        assert_eq!(config.splitting.title.tag, "title");
        assert_eq!(config.cache.backend, CacheBackend::None);
        assert!(config.loading.max_concurrency >= 1);
    }

    #[test]
    fn test_parse_partial_toml() {
        let raw = r#"
            [loading]
            max_concurrency = 3

            [cache]
            backend = "memory"

            [splitting]
            strategy = "token"
            token = { chunk_size = 64, chunk_overlap = 8 }
        "#;

        let config: RageConfig = toml::from_str(raw).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.loading.max_concurrency, 3);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.splitting.strategy, StrategyKind::Token);
        assert_eq!(config.splitting.token.chunk_size, 64);
        // Untouched sections keep their defaults
        assert_eq!(config.splitting.word.chunk_size, 128);
        assert_eq!(config.splitting.tokenizer.model, "gpt-4o");
    }

    #[test]
    fn test_invalid_window_rejected() {
        let window = WindowConfig {
            chunk_size: 10,
            chunk_overlap: 10,
        };
        assert!(matches!(window.validate(), Err(Error::Config(_))));

        let window = WindowConfig {
            chunk_size: 0,
            chunk_overlap: 0,
        };
        assert!(window.validate().is_err());

        let window = WindowConfig {
            chunk_size: 10,
            chunk_overlap: 0,
        };
        assert!(window.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = RageConfig::default();
        config.cache.backend = CacheBackend::Disk;
        config.splitting.strategy = StrategyKind::Markdown;
        config.splitting.title.tag = "header".to_string();

        let raw = toml::to_string(&config).unwrap();
        let parsed: RageConfig = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.cache.backend, CacheBackend::Disk);
        assert_eq!(parsed.cache.dir, config.cache.dir);
        assert_eq!(parsed.splitting.strategy, StrategyKind::Markdown);
        assert_eq!(parsed.splitting.title.tag, "header");
        assert_eq!(parsed.splitting.word, config.splitting.word);
        assert_eq!(parsed.loading.max_concurrency, config.loading.max_concurrency);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = RageConfig::default();
        config.loading.max_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rage.toml");
        std::fs::write(
            &path,
            "[splitting]\nstrategy = \"word\"\nword = { chunk_size = 4, chunk_overlap = 4 }\n",
        )
        .unwrap();

        assert!(matches!(RageConfig::from_file(&path), Err(Error::Config(_))));
    }
}

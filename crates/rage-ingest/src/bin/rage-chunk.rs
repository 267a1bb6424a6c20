//! Chunking CLI
//!
//! Loads files (or every supported file under a directory), splits them with
//! the configured strategy and prints one JSON chunk per line.
//!
//! Run with: cargo run -p rage-ingest --features cli --bin rage-chunk -- docs/

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

use rage_ingest::config::{CacheBackend, RageConfig, StrategyKind};
use rage_ingest::ingestion::{AutoDetect, SourceFormat};
use rage_ingest::Pipeline;

#[derive(Parser)]
#[command(name = "rage-chunk")]
#[command(about = "Split documents into linked chunks for indexing")]
#[command(version)]
struct Cli {
    /// Files or directories to load
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Splitting strategy (overrides the config file)
    #[arg(short, long)]
    strategy: Option<Strategy>,

    /// Chunk size in words or tokens, depending on the strategy
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Chunk overlap in words or tokens, depending on the strategy
    #[arg(long)]
    chunk_overlap: Option<usize>,

    /// Tokenizer model name ("whitespace" counts words)
    #[arg(long)]
    tokenizer: Option<String>,

    /// Document cache backend
    #[arg(long)]
    cache: Option<Cache>,

    /// Maximum number of files parsed at once
    #[arg(short = 'j', long)]
    max_concurrency: Option<usize>,

    /// Write chunks here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Strategy {
    Word,
    Token,
    Markdown,
    Title,
    Document,
}

impl From<Strategy> for StrategyKind {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Word => StrategyKind::Word,
            Strategy::Token => StrategyKind::Token,
            Strategy::Markdown => StrategyKind::Markdown,
            Strategy::Title => StrategyKind::Title,
            Strategy::Document => StrategyKind::Document,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Cache {
    None,
    Memory,
    Disk,
}

impl From<Cache> for CacheBackend {
    fn from(cache: Cache) -> Self {
        match cache {
            Cache::None => CacheBackend::None,
            Cache::Memory => CacheBackend::Memory,
            Cache::Disk => CacheBackend::Disk,
        }
    }
}

impl Cli {
    fn config(&self) -> Result<RageConfig> {
        let mut config = match &self.config {
            Some(path) => RageConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => RageConfig::default(),
        };

        if let Some(strategy) = self.strategy {
            config.splitting.strategy = strategy.into();
        }

        let window = match config.splitting.strategy {
            StrategyKind::Token | StrategyKind::Markdown => &mut config.splitting.token,
            _ => &mut config.splitting.word,
        };
        if let Some(size) = self.chunk_size {
            window.chunk_size = size;
        }
        if let Some(overlap) = self.chunk_overlap {
            window.chunk_overlap = overlap;
        }

        if let Some(model) = &self.tokenizer {
            config.splitting.tokenizer.model = model.clone();
        }
        if let Some(cache) = self.cache {
            config.cache.backend = cache.into();
        }
        if let Some(n) = self.max_concurrency {
            config.loading.max_concurrency = n;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Expand directories into their supported files, sorted for stable output
fn collect_sources(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut sources = Vec::new();
    for path in paths {
        if !path.is_dir() {
            sources.push(path.clone());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| is_supported(p))
            .collect();
        found.sort();
        sources.extend(found);
    }
    sources
}

fn is_supported(path: &Path) -> bool {
    SourceFormat::from_path(path).is_ok()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rage_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;

    let sources = collect_sources(&cli.paths);
    if sources.is_empty() {
        anyhow::bail!("No supported files found");
    }

    let pipeline = Pipeline::from_config(Arc::new(AutoDetect), &config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg} [{elapsed}]")?);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(format!("Chunking {} files", sources.len()));

    let chunks = pipeline.run(&sources).await;
    spinner.finish_and_clear();
    let chunks = chunks?;

    let out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(
            std::fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut out = BufWriter::new(out);
    for chunk in &chunks {
        serde_json::to_writer(&mut out, chunk)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    tracing::info!("Wrote {} chunks from {} files", chunks.len(), sources.len());
    Ok(())
}

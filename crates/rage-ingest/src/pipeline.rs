//! Loader and splitter wired together per source

use std::path::Path;
use std::sync::Arc;

use crate::config::RageConfig;
use crate::error::Result;
use crate::ingestion::{DocumentParser, Loader};
use crate::splitting::TextSplitter;
use crate::types::TextChunk;

/// Turns source paths into identified, linked chunks
///
/// Each source is split on its own, so `chunk_index` and the neighbor links
/// never cross from one source into the next.
pub struct Pipeline {
    loader: Loader,
    splitter: Arc<TextSplitter>,
}

impl Pipeline {
    pub fn new(loader: Loader, splitter: TextSplitter) -> Self {
        Self {
            loader,
            splitter: Arc::new(splitter),
        }
    }

    /// Build loader, cache and splitter from configuration
    pub fn from_config(parser: Arc<dyn DocumentParser>, config: &RageConfig) -> Result<Self> {
        config.validate()?;
        let loader = Loader::from_config(parser, config)?;
        let splitter = TextSplitter::from_config(&config.splitting)?;
        Ok(Self::new(loader, splitter))
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    pub fn splitter(&self) -> &TextSplitter {
        &self.splitter
    }

    /// Load and split every source, one chunk list per input path
    ///
    /// Loading is fail-fast over the whole batch.
    pub async fn run_each<P: AsRef<Path>>(&self, source_paths: &[P]) -> Result<Vec<Vec<TextChunk>>> {
        let loaded = self.loader.load_each(source_paths).await?;

        let mut results = Vec::with_capacity(loaded.len());
        for documents in loaded {
            let splitter = self.splitter.clone();
            let chunks = tokio::task::spawn_blocking(move || splitter.split_documents(&documents)).await?;
            results.push(chunks);
        }

        Ok(results)
    }

    /// Load and split every source, concatenated in input order
    pub async fn run<P: AsRef<Path>>(&self, source_paths: &[P]) -> Result<Vec<TextChunk>> {
        let chunks: Vec<TextChunk> = self.run_each(source_paths).await?.into_iter().flatten().collect();
        tracing::info!("Produced {} chunks from {} sources", chunks.len(), source_paths.len());
        Ok(chunks)
    }
}

//! Chunking engine
//!
//! A [`TextSplitter`] runs one [`SplitStrategy`] over an ordered list of
//! documents, drops blank results, then stamps every chunk with its identity
//! (`chunk_id`, `chunk_index`) and links it to its neighbors
//! (`previous_chunk_id`, `next_chunk_id`). Identity and links span the whole
//! output of one `split_documents` call.

mod title;
mod token;
mod word;

pub use title::TitleSplitter;
pub use token::TokenSplitter;
pub use word::WordSplitter;

use serde_json::Value;
use std::sync::Arc;

use crate::config::{SplittingConfig, StrategyKind, WindowConfig};
use crate::error::Result;
use crate::hash::hash_content;
use crate::tokenizer::{self, TokenCounter};
use crate::types::{keys, Document, TextChunk};

/// Closed set of splitting strategies
#[derive(Debug)]
pub enum SplitStrategy {
    /// Fixed-size word windows with overlap
    Word(WordSplitter),
    /// Token-bounded segments, plain or Markdown-aware
    Token(TokenSplitter),
    /// One chunk per title run
    Title(TitleSplitter),
    /// One chunk per document
    Document,
}

impl SplitStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            SplitStrategy::Word(_) => "word",
            SplitStrategy::Token(_) => "token",
            SplitStrategy::Title(_) => "title",
            SplitStrategy::Document => "document",
        }
    }
}

/// Strategy plus tokenizer, with the identity and linking passes
pub struct TextSplitter {
    strategy: SplitStrategy,
    tokenizer: Arc<dyn TokenCounter>,
}

impl std::fmt::Debug for TextSplitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextSplitter")
            .field("strategy", &self.strategy)
            .field("tokenizer", &self.tokenizer.name())
            .finish()
    }
}

impl TextSplitter {
    pub fn new(strategy: SplitStrategy, tokenizer: Arc<dyn TokenCounter>) -> Self {
        Self { strategy, tokenizer }
    }

    /// Word-window splitter
    pub fn words(chunk_size: usize, chunk_overlap: usize, tokenizer: Arc<dyn TokenCounter>) -> Result<Self> {
        let splitter = WordSplitter::new(chunk_size, chunk_overlap)?;
        Ok(Self::new(SplitStrategy::Word(splitter), tokenizer))
    }

    /// Token-bounded splitter
    pub fn tokens(window: WindowConfig, tokenizer: Arc<dyn TokenCounter>) -> Result<Self> {
        let splitter = TokenSplitter::new(window, tokenizer.clone())?;
        Ok(Self::new(SplitStrategy::Token(splitter), tokenizer))
    }

    /// Token-bounded splitter along Markdown structure
    pub fn markdown(window: WindowConfig, tokenizer: Arc<dyn TokenCounter>) -> Result<Self> {
        let splitter = TokenSplitter::markdown(window, tokenizer.clone())?;
        Ok(Self::new(SplitStrategy::Token(splitter), tokenizer))
    }

    /// Title-run grouping
    pub fn titles(title_tag: impl Into<String>, tokenizer: Arc<dyn TokenCounter>) -> Self {
        Self::new(SplitStrategy::Title(TitleSplitter::new(title_tag)), tokenizer)
    }

    /// One chunk per document
    pub fn documents(tokenizer: Arc<dyn TokenCounter>) -> Self {
        Self::new(SplitStrategy::Document, tokenizer)
    }

    /// Build the splitter selected by the config
    pub fn from_config(config: &SplittingConfig) -> Result<Self> {
        config.validate()?;
        let tokenizer = tokenizer::from_config(&config.tokenizer)?;

        let splitter = match config.strategy {
            StrategyKind::Word => Self::words(config.word.chunk_size, config.word.chunk_overlap, tokenizer)?,
            StrategyKind::Token => Self::tokens(config.token, tokenizer)?,
            StrategyKind::Markdown => Self::markdown(config.token, tokenizer)?,
            StrategyKind::Title => Self::titles(config.title.tag.clone(), tokenizer),
            StrategyKind::Document => Self::documents(tokenizer),
        };

        tracing::info!(
            "Text splitter ready: strategy={}, tokenizer={}",
            splitter.strategy.name(),
            splitter.tokenizer.name()
        );
        Ok(splitter)
    }

    pub fn strategy(&self) -> &SplitStrategy {
        &self.strategy
    }

    pub fn tokenizer(&self) -> &Arc<dyn TokenCounter> {
        &self.tokenizer
    }

    /// Split documents into identified, linked chunks
    pub fn split_documents(&self, documents: &[Document]) -> Vec<TextChunk> {
        let tokenizer = self.tokenizer.as_ref();
        let mut chunks = match &self.strategy {
            SplitStrategy::Word(splitter) => splitter.split(documents, tokenizer),
            SplitStrategy::Token(splitter) => splitter.split(documents, tokenizer),
            SplitStrategy::Title(splitter) => splitter.split(documents, tokenizer),
            SplitStrategy::Document => documents
                .iter()
                .map(|d| TextChunk::from_document(d, tokenizer.count_tokens(&d.text)))
                .collect(),
        };

        chunks.retain(|c| !c.text.trim().is_empty());
        assign_identity(&mut chunks);
        link_chunks(&mut chunks);

        tracing::debug!(
            "Split {} documents into {} chunks ({})",
            documents.len(),
            chunks.len(),
            self.strategy.name()
        );
        chunks
    }
}

/// Set `chunk_id` to the text hash and `chunk_index` to the 1-based position
pub fn assign_identity(chunks: &mut [TextChunk]) {
    for (i, chunk) in chunks.iter_mut().enumerate() {
        let id = hash_content(&chunk.text);
        chunk.metadata.insert(keys::CHUNK_ID.to_string(), Value::String(id));
        chunk.metadata.insert(keys::CHUNK_INDEX.to_string(), Value::from(i as u64 + 1));
    }
}

/// Point each chunk at its neighbors' ids, null at both ends
pub fn link_chunks(chunks: &mut [TextChunk]) {
    let ids: Vec<Value> = chunks
        .iter()
        .map(|c| c.metadata.get(keys::CHUNK_ID).cloned().unwrap_or(Value::Null))
        .collect();

    for (i, chunk) in chunks.iter_mut().enumerate() {
        let previous = if i > 0 { ids[i - 1].clone() } else { Value::Null };
        let next = ids.get(i + 1).cloned().unwrap_or(Value::Null);
        chunk.metadata.insert(keys::PREVIOUS_CHUNK_ID.to_string(), previous);
        chunk.metadata.insert(keys::NEXT_CHUNK_ID.to_string(), next);
    }
}

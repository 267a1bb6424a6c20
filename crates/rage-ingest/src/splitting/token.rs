//! Token-bounded splitting on top of `text-splitter`

use rayon::prelude::*;
use std::sync::Arc;
use text_splitter::{ChunkConfig, MarkdownSplitter, TextSplitter as PlainSplitter};

use crate::config::WindowConfig;
use crate::error::{Error, Result};
use crate::tokenizer::{TokenCounter, TokenizerSizer};
use crate::types::{Document, TextChunk};

enum Engine {
    Plain(PlainSplitter<TokenizerSizer>),
    Markdown(MarkdownSplitter<TokenizerSizer>),
}

impl Engine {
    fn segments<'t>(&self, text: &'t str) -> Vec<&'t str> {
        match self {
            Engine::Plain(splitter) => splitter.chunks(text).collect(),
            Engine::Markdown(splitter) => splitter.chunks(text).collect(),
        }
    }
}

/// Splits documents into segments of at most `chunk_size` tokens
///
/// Consecutive segments share up to `chunk_overlap` tokens. Sizes are measured
/// with the same counter that fills `num_tokens`.
pub struct TokenSplitter {
    engine: Engine,
    window: WindowConfig,
}

impl std::fmt::Debug for TokenSplitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.engine {
            Engine::Plain(_) => "plain",
            Engine::Markdown(_) => "markdown",
        };
        f.debug_struct("TokenSplitter")
            .field("kind", &kind)
            .field("chunk_size", &self.window.chunk_size)
            .field("chunk_overlap", &self.window.chunk_overlap)
            .finish()
    }
}

impl TokenSplitter {
    /// Splitter that breaks at sentence and word boundaries
    pub fn new(window: WindowConfig, tokenizer: Arc<dyn TokenCounter>) -> Result<Self> {
        let config = chunk_config(window, tokenizer)?;
        Ok(Self {
            engine: Engine::Plain(PlainSplitter::new(config)),
            window,
        })
    }

    /// Splitter that prefers Markdown structure (headings, blocks, lists) as boundaries
    pub fn markdown(window: WindowConfig, tokenizer: Arc<dyn TokenCounter>) -> Result<Self> {
        let config = chunk_config(window, tokenizer)?;
        Ok(Self {
            engine: Engine::Markdown(MarkdownSplitter::new(config)),
            window,
        })
    }

    pub fn window(&self) -> WindowConfig {
        self.window
    }

    /// Trimmed, non-empty segments of `text`
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.engine
            .segments(text)
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn split_document(&self, document: &Document, tokenizer: &dyn TokenCounter) -> Vec<TextChunk> {
        self.split_text(&document.text)
            .into_iter()
            .map(|text| {
                let num_tokens = tokenizer.count_tokens(&text);
                let mut chunk = TextChunk::new(text, document.metadata.clone(), num_tokens);
                chunk.is_table = document.is_table;
                chunk
            })
            .collect()
    }

    pub(crate) fn split(&self, documents: &[Document], tokenizer: &dyn TokenCounter) -> Vec<TextChunk> {
        documents
            .par_iter()
            .map(|document| self.split_document(document, tokenizer))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect()
    }
}

fn chunk_config(window: WindowConfig, tokenizer: Arc<dyn TokenCounter>) -> Result<ChunkConfig<TokenizerSizer>> {
    window.validate()?;
    ChunkConfig::new(window.chunk_size)
        .with_sizer(TokenizerSizer::new(tokenizer))
        .with_trim(true)
        .with_overlap(window.chunk_overlap)
        .map_err(|e| Error::config(format!("invalid token window: {}", e)))
}

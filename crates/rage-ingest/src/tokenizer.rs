//! Pluggable token counting
//!
//! Implementations:
//! - `TiktokenCounter`: OpenAI BPE encodings selected by model name (default `gpt-4o`)
//! - `HuggingFaceCounter`: any `tokenizer.json` loaded with the `tokenizers` crate
//! - `WhitespaceCounter`: counts whitespace-separated words

use std::path::Path;
use std::sync::Arc;

use text_splitter::ChunkSizer;
use tiktoken_rs::CoreBPE;
use tokenizers::Tokenizer;

use crate::config::TokenizerConfig;
use crate::error::{Error, Result};

/// Model name accepted by [`from_config`] to select [`WhitespaceCounter`]
pub const WHITESPACE_MODEL: &str = "whitespace";

/// Trait for counting tokens in text
pub trait TokenCounter: Send + Sync {
    /// Number of tokens `text` encodes to
    fn count_tokens(&self, text: &str) -> usize;

    /// Tokenizer name for logging
    fn name(&self) -> &str;
}

/// OpenAI BPE token counter
pub struct TiktokenCounter {
    model: String,
    bpe: CoreBPE,
}

impl TiktokenCounter {
    /// Load the encoding used by an OpenAI model (e.g. "gpt-4o")
    pub fn for_model(model: &str) -> Result<Self> {
        let bpe = tiktoken_rs::get_bpe_from_model(model)
            .map_err(|e| Error::tokenizer(format!("unknown model '{}': {}", model, e)))?;

        Ok(Self {
            model: model.to_string(),
            bpe,
        })
    }
}

impl TokenCounter for TiktokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Hugging Face tokenizer counter
pub struct HuggingFaceCounter {
    name: String,
    tokenizer: Tokenizer,
}

impl HuggingFaceCounter {
    /// Load a tokenizer from a `tokenizer.json` file
    pub fn from_file(path: &Path) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| Error::tokenizer(format!("{}: {}", path.display(), e)))?;

        Ok(Self {
            name: path.display().to_string(),
            tokenizer,
        })
    }
}

impl TokenCounter for HuggingFaceCounter {
    fn count_tokens(&self, text: &str) -> usize {
        match self.tokenizer.encode(text, false) {
            Ok(encoding) => encoding.len(),
            Err(e) => {
                tracing::warn!("Tokenizer {} failed to encode text: {}", self.name, e);
                0
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Counts whitespace-separated words
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceCounter;

impl TokenCounter for WhitespaceCounter {
    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }

    fn name(&self) -> &str {
        WHITESPACE_MODEL
    }
}

/// Build the token counter described by the config
///
/// A tokenizer file path takes precedence over the model name.
pub fn from_config(config: &TokenizerConfig) -> Result<Arc<dyn TokenCounter>> {
    if let Some(path) = &config.path {
        return Ok(Arc::new(HuggingFaceCounter::from_file(path)?));
    }

    if config.model == WHITESPACE_MODEL {
        return Ok(Arc::new(WhitespaceCounter));
    }

    Ok(Arc::new(TiktokenCounter::for_model(&config.model)?))
}

/// Sizes `text-splitter` chunks with a [`TokenCounter`]
///
/// The same counter must be used for chunk sizing and for `num_tokens`,
/// otherwise chunk sizes and reported counts disagree.
pub struct TokenizerSizer {
    counter: Arc<dyn TokenCounter>,
}

impl TokenizerSizer {
    pub fn new(counter: Arc<dyn TokenCounter>) -> Self {
        Self { counter }
    }
}

impl ChunkSizer for TokenizerSizer {
    fn size(&self, chunk: &str) -> usize {
        self.counter.count_tokens(chunk)
    }
}

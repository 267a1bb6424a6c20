//! Text chunk type emitted by splitters

use serde::{Deserialize, Serialize};

use super::document::{keys, Document, Metadata};

/// A bounded text segment destined for indexing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Chunk text
    pub text: String,
    /// Inherited document metadata plus identity and link fields
    #[serde(default)]
    pub metadata: Metadata,
    /// Whether the chunk is an unsplit table
    #[serde(default)]
    pub is_table: bool,
    /// Token count of `text` under the splitter's tokenizer
    pub num_tokens: usize,
}

impl TextChunk {
    /// Create a chunk with the given metadata
    pub fn new(text: impl Into<String>, metadata: Metadata, num_tokens: usize) -> Self {
        Self {
            text: text.into(),
            metadata,
            is_table: false,
            num_tokens,
        }
    }

    /// Create a chunk that carries a whole document unchanged
    pub fn from_document(document: &Document, num_tokens: usize) -> Self {
        Self {
            text: document.text.clone(),
            metadata: document.metadata.clone(),
            is_table: document.is_table,
            num_tokens,
        }
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    /// Content hash of the chunk text, once assigned
    pub fn chunk_id(&self) -> Option<&str> {
        self.str_field(keys::CHUNK_ID)
    }

    /// 1-based position of the chunk, once assigned
    pub fn chunk_index(&self) -> Option<u64> {
        self.metadata.get(keys::CHUNK_INDEX).and_then(|v| v.as_u64())
    }

    /// Id of the preceding chunk
    pub fn previous_chunk_id(&self) -> Option<&str> {
        self.str_field(keys::PREVIOUS_CHUNK_ID)
    }

    /// Id of the following chunk
    pub fn next_chunk_id(&self) -> Option<&str> {
        self.str_field(keys::NEXT_CHUNK_ID)
    }

    /// Id of the source document
    pub fn document_id(&self) -> Option<&str> {
        self.str_field(keys::DOCUMENT_ID)
    }
}

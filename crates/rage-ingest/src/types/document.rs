//! Document type produced by loaders

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata map shared by documents and chunks
pub type Metadata = HashMap<String, serde_json::Value>;

/// Well-known metadata keys
pub mod keys {
    /// Content hash of the chunk text
    pub const CHUNK_ID: &str = "chunk_id";
    /// 1-based position of the chunk in its splitting call
    pub const CHUNK_INDEX: &str = "chunk_index";
    /// Id of the preceding chunk (null for the first)
    pub const PREVIOUS_CHUNK_ID: &str = "previous_chunk_id";
    /// Id of the following chunk (null for the last)
    pub const NEXT_CHUNK_ID: &str = "next_chunk_id";
    /// Content hash of the document text
    pub const DOCUMENT_ID: &str = "document_id";
    /// 1-based position of the document among those loaded from one path
    pub const DOCUMENT_INDEX: &str = "document_index";
    /// Stem of the source path
    pub const FILE_NAME: &str = "file_name";
    /// Structural element type (e.g. "Title", "NarrativeText")
    pub const TYPE: &str = "type";
    /// Title of a page-level or grouped unit
    pub const TITLE: &str = "title";
    /// 1-based page number for paginated formats
    pub const PAGE_NUMBER: &str = "page_number";
}

/// A normalized text unit extracted from one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Extracted text
    pub text: String,
    /// Free-form metadata
    #[serde(default)]
    pub metadata: Metadata,
    /// Whether the text is a rendered table (never windowed)
    #[serde(default)]
    pub is_table: bool,
}

impl Document {
    /// Create a document with empty metadata
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
            is_table: false,
        }
    }

    /// Create a table document
    pub fn table(text: impl Into<String>) -> Self {
        Self {
            is_table: true,
            ..Self::new(text)
        }
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// True when the text has no non-whitespace content
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Element type tag, if the parser set one
    pub fn element_type(&self) -> Option<&str> {
        self.metadata.get(keys::TYPE).and_then(|v| v.as_str())
    }
}

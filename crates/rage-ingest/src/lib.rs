//! rage-ingest: document-to-chunk pipeline for vector indexing
//!
//! This crate turns heterogeneous source files (PDF, DOCX, EPUB, Markdown) into
//! normalized [`Document`]s through a bounded-concurrency, cache-aware loader, and
//! splits those documents into size-bounded [`TextChunk`]s with content-hash
//! identity and bidirectional neighbor links.

pub mod cache;
pub mod config;
pub mod error;
pub mod hash;
pub mod ingestion;
pub mod pipeline;
pub mod splitting;
pub mod text;
pub mod tokenizer;
pub mod types;

pub use cache::{DiskCache, DocumentCache, MemoryCache};
pub use config::RageConfig;
pub use error::{Error, Result};
pub use ingestion::{DocumentParser, Loader, SourceFormat};
pub use pipeline::Pipeline;
pub use splitting::{SplitStrategy, TextSplitter};
pub use tokenizer::TokenCounter;
pub use types::{Document, TextChunk};

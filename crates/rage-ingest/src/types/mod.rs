//! Core value types passed between pipeline stages

pub mod chunk;
pub mod document;

pub use chunk::TextChunk;
pub use document::{keys, Document, Metadata};

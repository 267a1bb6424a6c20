//! Document loading with per-format parsers

pub mod formats;
mod loader;
mod parser;

pub use formats::{DocxParser, EpubParser, MarkdownParser, PdfParser, PdfTextParser};
pub use loader::{stamp_metadata, Loader, DEFAULT_MAX_CONCURRENCY};
pub use parser::{AutoDetect, DocumentParser, SourceFormat};

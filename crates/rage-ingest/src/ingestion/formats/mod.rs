//! Built-in format parsers

mod docx;
mod epub;
mod html;
mod markdown;
mod pdf;

pub use docx::DocxParser;
pub use epub::{EpubParser, BANNED_TYPES};
pub use html::{html_blocks, BlockKind, HtmlBlock};
pub use markdown::MarkdownParser;
pub use pdf::{PdfParser, PdfTextParser};

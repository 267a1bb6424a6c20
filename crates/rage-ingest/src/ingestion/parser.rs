//! Format parser seam and the closed set of built-in formats

use std::path::Path;

use super::formats::{DocxParser, EpubParser, MarkdownParser, PdfParser, PdfTextParser};
use crate::error::{Error, Result};
use crate::types::Document;

/// Trait for extracting documents from one source file
///
/// Parsers run on the blocking thread pool, so they may do synchronous IO and
/// CPU-heavy work. A parser decides for itself whether a bad unit (e.g. one
/// unreadable page) fails the whole file or is skipped.
pub trait DocumentParser: Send + Sync {
    /// Extract the documents contained in `path`
    fn parse(&self, path: &Path) -> Result<Vec<Document>>;

    /// Parser name for logging
    fn name(&self) -> &str;
}

/// Built-in source formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// PDF, one document per page
    Pdf,
    /// PDF, whole text as a single document
    PdfText,
    /// Microsoft Word document (.docx)
    Docx,
    /// EPUB ebook, one document per structural element
    Epub,
    /// Markdown, plain text or HTML converted to Markdown
    Markdown,
}

impl SourceFormat {
    /// Detect format from extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "epub" => Some(Self::Epub),
            "md" | "markdown" | "txt" | "text" | "html" | "htm" | "xhtml" => Some(Self::Markdown),
            _ => None,
        }
    }

    /// Detect format from a file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();

        Self::from_extension(&extension).ok_or_else(|| {
            Error::UnsupportedFileType(format!("{} ({})", extension, path.display()))
        })
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::PdfText => "pdf-text",
            Self::Docx => "docx",
            Self::Epub => "epub",
            Self::Markdown => "markdown",
        }
    }
}

impl DocumentParser for SourceFormat {
    fn parse(&self, path: &Path) -> Result<Vec<Document>> {
        match self {
            Self::Pdf => PdfParser.parse(path),
            Self::PdfText => PdfTextParser.parse(path),
            Self::Docx => DocxParser.parse(path),
            Self::Epub => EpubParser::default().parse(path),
            Self::Markdown => MarkdownParser.parse(path),
        }
    }

    fn name(&self) -> &str {
        self.display_name()
    }
}

/// Picks the built-in format of every path from its extension
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoDetect;

impl DocumentParser for AutoDetect {
    fn parse(&self, path: &Path) -> Result<Vec<Document>> {
        SourceFormat::from_path(path)?.parse(path)
    }

    fn name(&self) -> &str {
        "auto"
    }
}

/// Display name of a path for error messages
pub(crate) fn display_filename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// File stem used as `file_name` metadata
pub(crate) fn file_stem(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(SourceFormat::from_path(Path::new("a/book.PDF")).unwrap(), SourceFormat::Pdf);
        assert_eq!(SourceFormat::from_path(Path::new("r.docx")).unwrap(), SourceFormat::Docx);
        assert_eq!(SourceFormat::from_path(Path::new("n.epub")).unwrap(), SourceFormat::Epub);
        assert_eq!(SourceFormat::from_path(Path::new("x.md")).unwrap(), SourceFormat::Markdown);
        assert_eq!(SourceFormat::from_path(Path::new("x.html")).unwrap(), SourceFormat::Markdown);
    }

    #[test]
    fn test_unsupported_format() {
        assert!(matches!(
            SourceFormat::from_path(Path::new("sheet.xlsx")),
            Err(Error::UnsupportedFileType(_))
        ));
        assert!(SourceFormat::from_path(Path::new("no_extension")).is_err());
    }

    #[test]
    fn test_legacy_word_rejected() {
        // Only the OOXML .docx container is read
        assert!(matches!(
            SourceFormat::from_path(Path::new("minutes.doc")),
            Err(Error::UnsupportedFileType(_))
        ));
        assert!(AutoDetect.parse(Path::new("minutes.doc")).is_err());
    }

    #[test]
    fn test_auto_detect_parses_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# Notes\n\nSome text.").unwrap();

        let documents = AutoDetect.parse(&path).unwrap();
        assert_eq!(documents.len(), 1);
        assert!(documents[0].text.contains("Some text."));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Path::new("/tmp/My Book.pdf")).as_deref(), Some("My Book"));
        assert_eq!(display_filename(Path::new("/tmp/My Book.pdf")), "My Book.pdf");
    }
}

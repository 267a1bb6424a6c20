//! PDF parsers

use std::path::Path;

use crate::error::{Error, Result};
use crate::ingestion::parser::{display_filename, file_stem, DocumentParser};
use crate::text::{cleanup_pdf_text, fix_punctuation};
use crate::types::{keys, Document};

/// One document per page, extracted with lopdf
///
/// Unreadable pages are skipped and logged; the load fails only when the file
/// cannot be opened or no page at all could be read.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfParser;

impl DocumentParser for PdfParser {
    fn parse(&self, path: &Path) -> Result<Vec<Document>> {
        let filename = display_filename(path);
        let pdf = lopdf::Document::load(path)
            .map_err(|e| Error::file_parse(&filename, format!("Failed to load PDF: {}", e)))?;

        let title = file_stem(path);
        let pages = pdf.get_pages();
        let total_pages = pages.len();
        let mut documents = Vec::with_capacity(total_pages);
        let mut skipped = Vec::new();

        for &page_number in pages.keys() {
            match pdf.extract_text(&[page_number]) {
                Ok(text) => {
                    let text = fix_punctuation(&cleanup_pdf_text(&text));
                    documents.push(
                        Document::new(text)
                            .with_metadata(keys::TITLE, title.clone())
                            .with_metadata(keys::PAGE_NUMBER, page_number),
                    );
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable page {} of '{}': {}", page_number, filename, e);
                    skipped.push(page_number);
                }
            }
        }

        if total_pages > 0 && skipped.len() == total_pages {
            return Err(Error::file_parse(filename, "No page could be read"));
        }

        if !skipped.is_empty() {
            tracing::warn!(
                "'{}': {} of {} pages skipped ({:?})",
                filename,
                skipped.len(),
                total_pages,
                skipped
            );
        }

        tracing::debug!("Parsed {} pages from '{}'", documents.len(), filename);
        Ok(documents)
    }

    fn name(&self) -> &str {
        "pdf"
    }
}

/// Whole PDF text as a single document, extracted with pdf-extract
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextParser;

impl DocumentParser for PdfTextParser {
    fn parse(&self, path: &Path) -> Result<Vec<Document>> {
        let filename = display_filename(path);
        let text = pdf_extract::extract_text(path)
            .map_err(|e| Error::file_parse(&filename, e.to_string()))?;

        let text = fix_punctuation(&cleanup_pdf_text(&text));
        if text.is_empty() {
            return Err(Error::file_parse(
                filename,
                "No text content could be extracted from PDF",
            ));
        }

        Ok(vec![Document::new(text).with_metadata(keys::TITLE, file_stem(path))])
    }

    fn name(&self) -> &str {
        "pdf-text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pdf_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        match PdfParser.parse(&path) {
            Err(Error::FileParse { filename, .. }) => assert_eq!(filename, "broken.pdf"),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(PdfTextParser.parse(&path).is_err());
    }
}

//! DOCX parser

use std::path::Path;

use crate::error::{Error, Result};
use crate::ingestion::parser::{display_filename, DocumentParser};
use crate::text::fix_punctuation;
use crate::types::Document;

/// Whole document text as a single document
///
/// Paragraph texts are joined with single spaces. Tables are not extracted.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxParser;

impl DocumentParser for DocxParser {
    fn parse(&self, path: &Path) -> Result<Vec<Document>> {
        let filename = display_filename(path);
        let data = std::fs::read(path)?;
        let docx = docx_rs::read_docx(&data)
            .map_err(|e| Error::file_parse(&filename, e.to_string()))?;

        let mut paragraphs = Vec::new();
        for child in docx.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                let mut paragraph = String::new();
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                paragraph.push_str(&t.text);
                            }
                        }
                    }
                }

                let paragraph = paragraph.trim();
                if !paragraph.is_empty() {
                    paragraphs.push(paragraph.to_string());
                }
            }
        }

        tracing::debug!("Parsed {} paragraphs from '{}'", paragraphs.len(), filename);
        Ok(vec![Document::new(fix_punctuation(&paragraphs.join(" ")))])
    }

    fn name(&self) -> &str {
        "docx"
    }
}

//! Markdown parser
//!
//! Markdown and plain text are taken as-is; HTML is converted to Markdown so
//! the Markdown-aware splitter sees headings and lists.

use std::path::Path;

use super::html::{html_blocks, BlockKind, HtmlBlock};
use crate::error::Result;
use crate::ingestion::parser::DocumentParser;
use crate::types::Document;

/// Whole file as a single Markdown document
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownParser;

impl DocumentParser for MarkdownParser {
    fn parse(&self, path: &Path) -> Result<Vec<Document>> {
        let data = std::fs::read(path)?;
        let raw = String::from_utf8_lossy(&data);

        let is_html = path
            .extension()
            .map(|e| matches!(e.to_string_lossy().to_lowercase().as_str(), "html" | "htm" | "xhtml"))
            .unwrap_or(false);

        let markdown = if is_html {
            html_to_markdown(&html_blocks(&raw)?)
        } else {
            raw.trim().to_string()
        };

        Ok(vec![Document::new(markdown)])
    }

    fn name(&self) -> &str {
        "markdown"
    }
}

/// Render extracted blocks as Markdown, one block per paragraph
fn html_to_markdown(blocks: &[HtmlBlock]) -> String {
    blocks
        .iter()
        .filter(|b| b.kind != BlockKind::Image)
        .map(|b| match b.kind {
            BlockKind::Heading(level) => format!("{} {}", "#".repeat(level.clamp(1, 6) as usize), b.text),
            BlockKind::ListItem => format!("- {}", b.text),
            BlockKind::Quote => format!("> {}", b.text),
            BlockKind::Preformatted => format!("```\n{}\n```", b.text),
            BlockKind::Table => b
                .text
                .lines()
                .map(|row| format!("| {} |", row))
                .collect::<Vec<_>>()
                .join("\n"),
            BlockKind::Paragraph | BlockKind::Image => b.text.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

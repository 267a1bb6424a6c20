//! Structural block extraction from (X)HTML

use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};
use crate::text::collapse_whitespace;

/// Kind of an extracted block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// `h1`..`h6` with its level
    Heading(u8),
    /// `p`, or loose text outside any block element
    Paragraph,
    ListItem,
    Preformatted,
    Quote,
    /// Rows joined by newlines, cells by " | "
    Table,
    /// `img` alt text
    Image,
}

/// One structural block in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlBlock {
    pub kind: BlockKind,
    pub text: String,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::internal(format!("invalid selector '{}': {:?}", css, e)))
}

/// Elements extracted as one block each, children included
fn is_block(name: &str) -> bool {
    matches!(
        name,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "p" | "li" | "pre" | "blockquote" | "table" | "img"
    )
}

/// Elements whose content is never text
fn is_skipped(name: &str) -> bool {
    matches!(name, "head" | "script" | "style" | "noscript" | "template" | "svg")
}

/// Containers that end the current run of loose text
fn breaks_run(name: &str) -> bool {
    matches!(
        name,
        "html"
            | "body"
            | "div"
            | "section"
            | "article"
            | "main"
            | "header"
            | "footer"
            | "nav"
            | "aside"
            | "ul"
            | "ol"
            | "dl"
            | "dt"
            | "dd"
            | "figure"
            | "figcaption"
            | "address"
            | "form"
            | "br"
            | "hr"
    )
}

/// Extract blocks in document order
///
/// Block elements are taken whole. Text outside any block element (in `div`,
/// `span`, `section` or directly in `body`) is gathered into paragraphs that
/// end at every block or container boundary.
pub fn html_blocks(html: &str) -> Result<Vec<HtmlBlock>> {
    let document = Html::parse_document(html);
    let mut walker = BlockWalker {
        rows: selector("tr")?,
        cells: selector("th, td")?,
        blocks: Vec::new(),
        loose: String::new(),
    };

    walker.walk(document.root_element());
    walker.flush();
    Ok(walker.blocks)
}

struct BlockWalker {
    rows: Selector,
    cells: Selector,
    blocks: Vec<HtmlBlock>,
    loose: String,
}

impl BlockWalker {
    fn walk(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                self.loose.push_str(text);
                continue;
            }
            let Some(child) = ElementRef::wrap(child) else {
                continue;
            };

            let name = child.value().name();
            if is_skipped(name) {
                continue;
            }
            if is_block(name) {
                self.flush();
                self.push_block(child);
                continue;
            }

            let breaks = breaks_run(name);
            if breaks {
                self.flush();
            }
            self.walk(child);
            if breaks {
                self.flush();
            }
        }
    }

    /// Emit pending loose text as a paragraph
    fn flush(&mut self) {
        let text = collapse_whitespace(&self.loose);
        self.loose.clear();
        if !text.is_empty() {
            self.blocks.push(HtmlBlock {
                kind: BlockKind::Paragraph,
                text,
            });
        }
    }

    fn push_block(&mut self, element: ElementRef<'_>) {
        let name = element.value().name();
        let (kind, text) = match name {
            "table" => (BlockKind::Table, table_text(element, &self.rows, &self.cells)),
            "img" => (
                BlockKind::Image,
                element.value().attr("alt").unwrap_or_default().trim().to_string(),
            ),
            "pre" => (
                BlockKind::Preformatted,
                element.text().collect::<String>().trim().to_string(),
            ),
            _ => {
                let kind = match name {
                    "li" => BlockKind::ListItem,
                    "blockquote" => BlockKind::Quote,
                    "p" => BlockKind::Paragraph,
                    heading => BlockKind::Heading(heading[1..].parse().unwrap_or(1)),
                };
                (kind, collapse_whitespace(&element.text().collect::<String>()))
            }
        };

        if !text.is_empty() {
            self.blocks.push(HtmlBlock { kind, text });
        }
    }
}

fn table_text(table: ElementRef<'_>, rows: &Selector, cells: &Selector) -> String {
    table
        .select(rows)
        .map(|row| {
            row.select(cells)
                .map(|cell| collapse_whitespace(&cell.text().collect::<String>()))
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .filter(|row| !row.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

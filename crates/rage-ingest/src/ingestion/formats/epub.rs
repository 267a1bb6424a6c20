//! EPUB parser
//!
//! Walks the OPF spine in reading order and turns every top-level block of each
//! XHTML content document into one `Document` tagged with its element type
//! ("Title", "NarrativeText", "ListItem", "Table", "Image"). Tables are flagged
//! with `is_table` so splitters keep them whole.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::html::{html_blocks, BlockKind};
use crate::error::{Error, Result};
use crate::ingestion::parser::{display_filename, DocumentParser};
use crate::text::fix_punctuation;
use crate::types::{keys, Document};

/// Element types dropped by default
pub const BANNED_TYPES: &[&str] = &["Image"];

const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Element-level EPUB parser
#[derive(Debug, Clone)]
pub struct EpubParser {
    banned_types: HashSet<String>,
}

impl Default for EpubParser {
    fn default() -> Self {
        Self::new(BANNED_TYPES.iter().map(|t| t.to_string()))
    }
}

impl EpubParser {
    /// Create a parser that drops the given element types
    pub fn new(banned_types: impl IntoIterator<Item = String>) -> Self {
        Self {
            banned_types: banned_types.into_iter().collect(),
        }
    }
}

/// Manifest entry of the OPF package
#[derive(Debug, Clone, PartialEq, Eq)]
struct ManifestItem {
    href: String,
    media_type: String,
}

/// Reading order and resources of the OPF package
#[derive(Debug, Default)]
struct Package {
    manifest: HashMap<String, ManifestItem>,
    spine: Vec<String>,
}

impl DocumentParser for EpubParser {
    fn parse(&self, path: &Path) -> Result<Vec<Document>> {
        let filename = display_filename(path);
        let file = File::open(path)?;
        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| Error::file_parse(&filename, e.to_string()))?;

        let container = read_entry(&mut archive, CONTAINER_PATH, &filename)?;
        let opf_path = rootfile_path(&container)
            .ok_or_else(|| Error::file_parse(&filename, "container.xml has no rootfile"))?;
        let opf = read_entry(&mut archive, &opf_path, &filename)?;
        let package = parse_package(&opf);

        let base_dir = opf_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        let mut documents = Vec::new();

        for idref in &package.spine {
            let Some(item) = package.manifest.get(idref) else {
                tracing::warn!("'{}': spine item '{}' missing from manifest", filename, idref);
                continue;
            };
            if !item.media_type.contains("html") {
                continue;
            }

            let entry = resolve_href(base_dir, &item.href);
            let xhtml = read_entry(&mut archive, &entry, &filename)?;

            for block in html_blocks(&xhtml)? {
                let element_type = element_type(block.kind);
                if self.banned_types.contains(element_type) {
                    continue;
                }

                let document = match block.kind {
                    BlockKind::Table => Document::table(block.text),
                    BlockKind::Preformatted => Document::new(block.text),
                    _ => Document::new(fix_punctuation(&block.text)),
                };
                documents.push(document.with_metadata(keys::TYPE, element_type));
            }
        }

        tracing::debug!(
            "Parsed {} elements from {} spine items of '{}'",
            documents.len(),
            package.spine.len(),
            filename
        );
        Ok(documents)
    }

    fn name(&self) -> &str {
        "epub"
    }
}

/// Element type tag for a block
fn element_type(kind: BlockKind) -> &'static str {
    match kind {
        BlockKind::Heading(_) => "Title",
        BlockKind::ListItem => "ListItem",
        BlockKind::Table => "Table",
        BlockKind::Image => "Image",
        BlockKind::Paragraph | BlockKind::Preformatted | BlockKind::Quote => "NarrativeText",
    }
}

fn read_entry(archive: &mut zip::ZipArchive<File>, name: &str, filename: &str) -> Result<String> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| Error::file_parse(filename, format!("{}: {}", name, e)))?;
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    Ok(content)
}

/// Join an href relative to the OPF directory, resolving `..` segments
fn resolve_href(base_dir: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href);
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// `full-path` of the first rootfile in container.xml
fn rootfile_path(container: &str) -> Option<String> {
    let mut reader = Reader::from_str(container);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"rootfile" => {
                return attribute(&e, b"full-path");
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

fn parse_package(opf: &str) -> Package {
    let mut reader = Reader::from_str(opf);
    let mut package = Package::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"item" => {
                    if let (Some(id), Some(href)) = (attribute(&e, b"id"), attribute(&e, b"href")) {
                        let media_type = attribute(&e, b"media-type").unwrap_or_default();
                        package.manifest.insert(id, ManifestItem { href, media_type });
                    }
                }
                b"itemref" => {
                    if let Some(idref) = attribute(&e, b"idref") {
                        package.spine.push(idref);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!("Malformed OPF package: {}", e);
                break;
            }
            _ => {}
        }
    }

    package
}

//! Grouping of structural elements into title runs

use crate::tokenizer::TokenCounter;
use crate::types::{keys, Document, TextChunk};

/// Groups consecutive documents into one chunk per title
///
/// A run starts at every document whose `type` matches the tag
/// (case-insensitive) and extends to the next one. Documents before the first
/// title form a run of their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleSplitter {
    title_tag: String,
}

impl Default for TitleSplitter {
    fn default() -> Self {
        Self::new("title")
    }
}

impl TitleSplitter {
    pub fn new(title_tag: impl Into<String>) -> Self {
        Self {
            title_tag: title_tag.into(),
        }
    }

    pub fn title_tag(&self) -> &str {
        &self.title_tag
    }

    fn starts_run(&self, document: &Document) -> bool {
        document
            .element_type()
            .is_some_and(|t| t.eq_ignore_ascii_case(&self.title_tag))
    }

    /// Runs of documents, each beginning at a title (except possibly the first)
    pub fn runs<'d>(&self, documents: &'d [Document]) -> Vec<&'d [Document]> {
        let mut runs = Vec::new();
        let mut start = 0;
        for (i, document) in documents.iter().enumerate() {
            if i > start && self.starts_run(document) {
                runs.push(&documents[start..i]);
                start = i;
            }
        }
        if start < documents.len() {
            runs.push(&documents[start..]);
        }
        runs
    }

    fn group(run: &[Document], tokenizer: &dyn TokenCounter) -> Option<TextChunk> {
        let first = run.first()?;
        let text = run
            .iter()
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let mut metadata = first.metadata.clone();
        metadata.remove(keys::TYPE);
        metadata.insert(keys::TITLE.to_string(), first.text.clone().into());

        let num_tokens = tokenizer.count_tokens(&text);
        Some(TextChunk::new(text, metadata, num_tokens))
    }

    pub(crate) fn split(&self, documents: &[Document], tokenizer: &dyn TokenCounter) -> Vec<TextChunk> {
        self.runs(documents)
            .into_iter()
            .filter_map(|run| Self::group(run, tokenizer))
            .collect()
    }
}

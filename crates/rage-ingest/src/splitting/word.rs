//! Fixed-size word windowing with overlap

use rayon::prelude::*;
use std::ops::Range;

use crate::config::WindowConfig;
use crate::error::Result;
use crate::tokenizer::TokenCounter;
use crate::types::{Document, TextChunk};

/// Splits documents into windows of `chunk_size` words sharing `chunk_overlap` words
///
/// A trailing window shorter than `chunk_size` is never emitted on its own: it
/// is folded into the window before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl WordSplitter {
    /// Create a splitter; requires `0 <= chunk_overlap < chunk_size`
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        WindowConfig {
            chunk_size,
            chunk_overlap,
        }
        .validate()?;

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Word offset between consecutive window starts
    pub fn stride(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    /// Word ranges of the final windows for a sequence of `word_count` words
    ///
    /// Windows start every `stride` words; the last one may run short. When it
    /// does, it and the window before it are replaced by one range spanning the
    /// earlier window's start to the end of the sequence. The short window's
    /// first `chunk_overlap` words are exactly the earlier window's tail, so the
    /// merged range holds every word once.
    ///
    /// A sequence yielding a single short window keeps it as-is.
    pub fn windows(&self, word_count: usize) -> Vec<Range<usize>> {
        if word_count == 0 {
            return Vec::new();
        }

        let mut windows = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(word_count);
            windows.push(start..end);
            if end == word_count {
                break;
            }
            start += self.stride();
        }

        let last_is_short = windows.last().is_some_and(|w| w.len() < self.chunk_size);
        if last_is_short && windows.len() >= 2 {
            let last = windows.pop().unwrap_or_default();
            let second_last = windows.pop().unwrap_or_default();
            debug_assert_eq!(second_last.end, last.start + self.chunk_overlap);
            windows.push(second_last.start..last.end);
        }

        windows
    }

    /// Split raw text into space-joined window texts
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        self.windows(words.len())
            .into_iter()
            .map(|range| words[range].join(" "))
            .collect()
    }

    fn split_document(&self, document: &Document, tokenizer: &dyn TokenCounter) -> Vec<TextChunk> {
        // Tables keep their row/column layout
        if document.is_table {
            return vec![TextChunk::from_document(document, tokenizer.count_tokens(&document.text))];
        }

        let word_count = document.text.split_whitespace().count();
        if word_count <= self.chunk_size {
            return vec![TextChunk::from_document(document, tokenizer.count_tokens(&document.text))];
        }

        self.split_text(&document.text)
            .into_iter()
            .map(|text| {
                let num_tokens = tokenizer.count_tokens(&text);
                TextChunk::new(text, document.metadata.clone(), num_tokens)
            })
            .collect()
    }

    /// Split every document, in parallel, preserving document order
    pub(crate) fn split(&self, documents: &[Document], tokenizer: &dyn TokenCounter) -> Vec<TextChunk> {
        documents
            .par_iter()
            .map(|document| self.split_document(document, tokenizer))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect()
    }
}

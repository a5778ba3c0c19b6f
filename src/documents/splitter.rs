//! Recursive character text splitting.
//!
//! Text is split on the coarsest separator present (paragraphs, then lines,
//! then words, then characters) and the pieces are merged back into chunks
//! of at most `chunk_size` characters, each sharing up to `chunk_overlap`
//! characters with the previous one. Separators stay attached to the start
//! of the piece that follows them.

use super::{SourceDocument, TextChunk};
use crate::error::{ItineraError, Result};
use std::collections::VecDeque;
use tracing::warn;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits documents into overlapping chunks.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ItineraError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(ItineraError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Split every document, numbering chunks per document.
    pub fn split_documents(&self, documents: &[SourceDocument]) -> Vec<TextChunk> {
        let mut chunks = Vec::new();
        for doc in documents {
            for (index, content) in self.split_text(&doc.content).into_iter().enumerate() {
                chunks.push(TextChunk {
                    content,
                    source: doc.source.clone(),
                    page: doc.page,
                    index: index as i32,
                });
            }
        }
        chunks
    }

    /// Split raw text into chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let mut separator = "";
        let mut remaining: &[&str] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                break;
            }
            if text.contains(sep) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut fitting = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(std::mem::take(&mut fitting)));
            }
            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, remaining));
            }
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge(fitting));
        }
        chunks
    }

    /// Greedily join pieces into chunks, carrying the overlap tail forward.
    fn merge(&self, pieces: Vec<String>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: VecDeque<(String, usize)> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = char_len(&piece);
            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total, self.chunk_size
                    );
                }
                if !current.is_empty() {
                    push_joined(&mut chunks, &current);
                    while total > self.chunk_overlap
                        || (total + len > self.chunk_size && total > 0)
                    {
                        match current.pop_front() {
                            Some((_, front_len)) => total -= front_len,
                            None => break,
                        }
                    }
                }
            }
            current.push_back((piece, len));
            total += len;
        }
        push_joined(&mut chunks, &current);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, current: &VecDeque<(String, usize)>) {
    let joined: String = current.iter().map(|(s, _)| s.as_str()).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }
    let mut parts = text.split(separator);
    let mut pieces = Vec::new();
    if let Some(first) = parts.next() {
        pieces.push(first.to_string());
    }
    for part in parts {
        pieces.push(format!("{}{}", separator, part));
    }
    pieces.retain(|p| !p.is_empty());
    pieces
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(TextSplitter::new(100, 100).is_err());
        assert!(TextSplitter::new(0, 0).is_err());
        assert!(TextSplitter::new(1000, 150).is_ok());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let splitter = TextSplitter::new(100, 10).unwrap();
        let chunks = splitter.split_text("para one\n\npara two");
        assert_eq!(chunks, vec!["para one\n\npara two"]);
    }

    #[test]
    fn test_splits_on_words() {
        let splitter = TextSplitter::new(11, 0).unwrap();
        let chunks = splitter.split_text("hello world foo bar");
        assert_eq!(chunks, vec!["hello world", "foo bar"]);
    }

    #[test]
    fn test_overlap_carries_tail() {
        let splitter = TextSplitter::new(8, 3).unwrap();
        let chunks = splitter.split_text("aa bb cc dd ee");
        assert_eq!(chunks, vec!["aa bb cc", "cc dd ee"]);
    }

    #[test]
    fn test_falls_back_to_characters() {
        let splitter = TextSplitter::new(4, 0).unwrap();
        let chunks = splitter.split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let splitter = TextSplitter::new(3, 0).unwrap();
        let chunks = splitter.split_text("éééééé");
        assert_eq!(chunks, vec!["ééé", "ééé"]);
    }

    #[test]
    fn test_split_documents_keeps_provenance() {
        let splitter = TextSplitter::new(11, 0).unwrap();
        let docs = vec![
            SourceDocument {
                content: "hello world foo bar".to_string(),
                source: "guide.pdf".to_string(),
                page: Some(2),
            },
            SourceDocument {
                content: "   ".to_string(),
                source: "empty.txt".to_string(),
                page: None,
            },
        ];

        let chunks = splitter.split_documents(&docs);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].content, "foo bar");
        assert_eq!(chunks[1].source, "guide.pdf");
        assert_eq!(chunks[1].page, Some(2));
        assert_eq!(chunks[1].index, 1);
    }
}

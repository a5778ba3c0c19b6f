//! Document loading and splitting for document chat.
//!
//! Files are read into [`SourceDocument`]s (one per text file, one per PDF
//! page), then cut into overlapping [`TextChunk`]s ready for embedding.

mod loader;
mod splitter;

pub use loader::DocumentLoader;
pub use splitter::TextSplitter;

use serde::{Deserialize, Serialize};

/// Text read from a file, with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Text content.
    pub content: String,
    /// File name the text was read from.
    pub source: String,
    /// 1-based page number, for paginated formats.
    pub page: Option<u32>,
}

/// A piece of a [`SourceDocument`] sized for embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Text content.
    pub content: String,
    /// File name the text was read from.
    pub source: String,
    /// 1-based page number, for paginated formats.
    pub page: Option<u32>,
    /// Position of this chunk within its source document.
    pub index: i32,
}

/// Format a citation such as `guide.pdf:p3` or `notes.txt`.
pub fn citation(source: &str, page: Option<u32>) -> String {
    match page {
        Some(page) => format!("{}:p{}", source, page),
        None => source.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citation() {
        assert_eq!(citation("guide.pdf", Some(3)), "guide.pdf:p3");
        assert_eq!(citation("notes.txt", None), "notes.txt");
    }
}

//! Question answering over indexed documents.
//!
//! Files are indexed into a vector store collection; questions retrieve the
//! closest chunks and a chat model answers from them alone, citing the files
//! (and pages) it was given.

pub mod context;
mod engine;
mod indexer;

pub use context::ContextBuilder;
pub use engine::{AnswerModel, DocChat, OpenAIAnswerModel, RagEngine, RagResponse};
pub use indexer::{IndexReport, Indexer};

use crate::documents::citation;
use crate::vector_store::SearchResult;

/// Answer given when retrieval finds nothing.
pub const NO_ANSWER: &str = "I don't know based on the provided documents.";

/// Opening assistant message of a document chat.
pub const GREETING: &str = "I will answer the question based on your documents.";

/// A retrieved chunk ready to be placed in a prompt.
#[derive(Debug, Clone)]
pub struct ContextChunk {
    /// File name.
    pub source: String,
    /// 1-based page number, for paginated sources.
    pub page: Option<u32>,
    /// Text content.
    pub content: String,
    /// Similarity score.
    pub score: f32,
}

impl ContextChunk {
    /// Citation such as `guide.pdf:p3`.
    pub fn citation(&self) -> String {
        citation(&self.source, self.page)
    }
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            source: result.document.source,
            page: result.document.page,
            content: result.document.content,
            score: result.score,
        }
    }
}

//! Context building for document answers.

use super::ContextChunk;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::VectorStore;
use std::sync::Arc;

/// Chunks retrieved per question unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 4;

/// Retrieves context chunks for a question.
pub struct ContextBuilder {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    collection: String,
    top_k: usize,
}

impl ContextBuilder {
    /// Create a new context builder over a collection.
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            vector_store,
            embedder,
            collection: collection.into(),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Set the number of chunks retrieved per question.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Build context for a query, most similar first.
    pub async fn build(&self, query: &str) -> Result<Vec<ContextChunk>> {
        let query_embedding = self.embedder.embed(query).await?;

        let results = self
            .vector_store
            .search(&self.collection, &query_embedding, self.top_k)
            .await?;

        Ok(results.into_iter().map(ContextChunk::from).collect())
    }
}

/// Join chunk texts with blank lines for the prompt.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Distinct citations in first-seen order, joined by `; `.
pub fn format_sources(chunks: &[ContextChunk]) -> String {
    let mut seen: Vec<String> = Vec::new();
    for chunk in chunks {
        let cite = chunk.citation();
        if !seen.contains(&cite) {
            seen.push(cite);
        }
    }
    seen.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(source: &str, page: Option<u32>, content: &str) -> ContextChunk {
        ContextChunk {
            source: source.to_string(),
            page,
            content: content.to_string(),
            score: 0.5,
        }
    }

    #[test]
    fn test_sources_deduplicated_in_order() {
        let chunks = vec![
            chunk("a.pdf", Some(1), "x"),
            chunk("notes.txt", None, "y"),
            chunk("a.pdf", Some(1), "z"),
            chunk("a.pdf", Some(2), "w"),
        ];
        assert_eq!(format_sources(&chunks), "a.pdf:p1; notes.txt; a.pdf:p2");
    }

    #[test]
    fn test_context_joined_with_blank_lines() {
        let chunks = vec![chunk("a.txt", None, "first"), chunk("b.txt", None, "second")];
        assert_eq!(format_context_for_prompt(&chunks), "first\n\nsecond");
    }
}

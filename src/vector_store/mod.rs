//! Vector store abstraction for document chat.
//!
//! Provides a trait-based interface for different vector database backends.
//! Every operation is scoped to a named collection.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::documents::{citation, TextChunk};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chunk stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID.
    pub id: Uuid,
    /// Collection this document belongs to.
    pub collection: String,
    /// File name the chunk was read from.
    pub source: String,
    /// 1-based page number, for paginated sources.
    pub page: Option<u32>,
    /// Order of this chunk within its source document.
    pub chunk_index: i32,
    /// Text content of this chunk.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// When this document was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl Document {
    /// Create a new document from a chunk and its embedding.
    pub fn new(collection: &str, chunk: TextChunk, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            collection: collection.to_string(),
            source: chunk.source,
            page: chunk.page,
            chunk_index: chunk.index,
            content: chunk.content,
            embedding,
            indexed_at: Utc::now(),
        }
    }

    /// Citation for this chunk, e.g. `guide.pdf:p3`.
    pub fn citation(&self) -> String {
        citation(&self.source, self.page)
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document.
    pub document: Document,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Summary information about an indexed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedSource {
    /// File name.
    pub source: String,
    /// Number of indexed chunks.
    pub chunk_count: u32,
    /// Highest page number seen, for paginated sources.
    pub pages: Option<u32>,
    /// When the file was last indexed.
    pub indexed_at: DateTime<Utc>,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Bulk upsert documents.
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize>;

    /// Most similar documents in a collection, best first.
    async fn search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Delete every chunk of `sources` and insert `docs`, as one operation.
    ///
    /// Either everything is applied or the store is left unchanged.
    async fn replace_sources(
        &self,
        collection: &str,
        sources: &[String],
        docs: &[Document],
    ) -> Result<usize>;

    /// List indexed files, most recently indexed first.
    async fn list_sources(&self, collection: &str) -> Result<Vec<IndexedSource>>;

    /// Number of documents in a collection.
    async fn document_count(&self, collection: &str) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Score documents against a query and keep the best `limit`.
pub(crate) fn rank<I>(docs: I, query_embedding: &[f32], limit: usize) -> Vec<SearchResult>
where
    I: IntoIterator<Item = Document>,
{
    let mut results: Vec<SearchResult> = docs
        .into_iter()
        .map(|document| {
            let score = cosine_similarity(query_embedding, &document.embedding);
            SearchResult { document, score }
        })
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(limit);
    results
}

#[cfg(test)]
pub(crate) fn test_document(source: &str, page: Option<u32>, embedding: Vec<f32>) -> Document {
    Document::new(
        "docs",
        TextChunk {
            content: format!("content of {}", source),
            source: source.to_string(),
            page,
            index: 0,
        },
        embedding,
    )
}

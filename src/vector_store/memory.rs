//! In-memory vector store implementation.
//!
//! Used for one-off document chats that should not touch the database.

use super::{rank, Document, IndexedSource, SearchResult, VectorStore};
use crate::error::{ItineraError, Result};
use async_trait::async_trait;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory vector store. Documents are kept in insertion order.
#[derive(Default)]
pub struct MemoryVectorStore {
    documents: RwLock<Vec<Document>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Document>>> {
        self.documents
            .read()
            .map_err(|e| ItineraError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Document>>> {
        self.documents
            .write()
            .map_err(|e| ItineraError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let mut store = self.write()?;
        for doc in docs {
            match store.iter_mut().find(|d| d.id == doc.id) {
                Some(existing) => *existing = doc.clone(),
                None => store.push(doc.clone()),
            }
        }
        Ok(docs.len())
    }

    async fn replace_sources(
        &self,
        collection: &str,
        sources: &[String],
        docs: &[Document],
    ) -> Result<usize> {
        let mut store = self.write()?;
        store.retain(|doc| !(doc.collection == collection && sources.contains(&doc.source)));
        store.extend(docs.iter().cloned());
        Ok(docs.len())
    }

    async fn search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let docs = self.read()?;
        let candidates = docs.iter().filter(|d| d.collection == collection).cloned();
        Ok(rank(candidates, query_embedding, limit))
    }

    async fn list_sources(&self, collection: &str) -> Result<Vec<IndexedSource>> {
        let docs = self.read()?;
        let mut sources: Vec<IndexedSource> = Vec::new();

        for doc in docs.iter().filter(|d| d.collection == collection) {
            let position = sources.iter().position(|s| s.source == doc.source);
            let entry = match position {
                Some(i) => &mut sources[i],
                None => {
                    sources.push(IndexedSource {
                        source: doc.source.clone(),
                        chunk_count: 0,
                        pages: None,
                        indexed_at: doc.indexed_at,
                    });
                    let last = sources.len() - 1;
                    &mut sources[last]
                }
            };

            entry.chunk_count += 1;
            entry.pages = entry.pages.max(doc.page);
            if doc.indexed_at > entry.indexed_at {
                entry.indexed_at = doc.indexed_at;
            }
        }

        sources.sort_by(|a, b| b.indexed_at.cmp(&a.indexed_at));
        Ok(sources)
    }

    async fn document_count(&self, collection: &str) -> Result<usize> {
        let docs = self.read()?;
        Ok(docs.iter().filter(|d| d.collection == collection).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::test_document;

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        let doc1 = test_document("guide.pdf", Some(1), vec![1.0, 0.0, 0.0]);
        let doc2 = test_document("guide.pdf", Some(2), vec![0.0, 1.0, 0.0]);
        let mut other = test_document("guide.pdf", Some(1), vec![1.0, 0.0, 0.0]);
        other.collection = "archive".to_string();

        store.upsert_batch(&[doc1, doc2, other]).await.unwrap();

        assert_eq!(store.document_count("docs").await.unwrap(), 2);
        assert_eq!(store.document_count("archive").await.unwrap(), 1);

        let results = store.search("docs", &[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score > results[1].score);
        assert_eq!(results[0].document.page, Some(1));

        let sources = store.list_sources("docs").await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].chunk_count, 2);
        assert_eq!(sources[0].pages, Some(2));
    }

    #[tokio::test]
    async fn test_replace_sources_is_collection_scoped() {
        let store = MemoryVectorStore::new();
        let mut archived = test_document("notes.txt", None, vec![1.0]);
        archived.collection = "archive".to_string();
        store
            .upsert_batch(&[test_document("notes.txt", None, vec![1.0]), archived])
            .await
            .unwrap();

        store
            .replace_sources("docs", &["notes.txt".to_string()], &[])
            .await
            .unwrap();
        assert_eq!(store.document_count("docs").await.unwrap(), 0);
        assert_eq!(store.document_count("archive").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_store_returns_nothing() {
        let store = MemoryVectorStore::new();
        let results = store.search("docs", &[1.0, 0.0], 4).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_replace_sources_swaps_chunks() {
        let store = MemoryVectorStore::new();
        store
            .upsert_batch(&[
                test_document("notes.txt", None, vec![1.0]),
                test_document("guide.pdf", Some(1), vec![1.0]),
            ])
            .await
            .unwrap();

        let fresh = test_document("notes.txt", None, vec![0.5]);
        let fresh_id = fresh.id;
        store
            .replace_sources("docs", &["notes.txt".to_string()], &[fresh])
            .await
            .unwrap();

        let results = store.search("docs", &[1.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .any(|r| r.document.source == "notes.txt" && r.document.id == fresh_id));
    }
}

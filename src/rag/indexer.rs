//! Indexing files into the vector store.

use crate::documents::{DocumentLoader, SourceDocument, TextSplitter};
use crate::embedding::Embedder;
use crate::error::{ItineraError, Result};
use crate::vector_store::{Document, VectorStore};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Files read concurrently while indexing.
const MAX_CONCURRENT_LOADS: usize = 4;

/// Counts reported after indexing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub files: usize,
    pub chunks: usize,
}

impl std::fmt::Display for IndexReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Indexed {} files, {} chunks", self.files, self.chunks)
    }
}

/// Loads, splits, embeds and stores files.
pub struct Indexer {
    loader: Arc<DocumentLoader>,
    splitter: TextSplitter,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    collection: String,
}

impl Indexer {
    pub fn new(
        splitter: TextSplitter,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            loader: Arc::new(DocumentLoader::new()),
            splitter,
            embedder,
            vector_store,
            collection: collection.into(),
        }
    }

    /// Index files, replacing any chunks previously stored for the same file names.
    ///
    /// Chunks are keyed by bare file name, so ingesting `b/notes.txt` also
    /// replaces what was indexed from `a/notes.txt`. Earlier chunks are only
    /// removed once every new chunk has been embedded; a failed run leaves the
    /// store as it was.
    #[instrument(skip(self, paths), fields(files = paths.len()))]
    pub async fn index_files(&self, paths: &[PathBuf]) -> Result<IndexReport> {
        let loaded: Vec<Result<Vec<SourceDocument>>> = stream::iter(paths.iter().cloned())
            .map(|path| {
                let loader = Arc::clone(&self.loader);
                async move { load_blocking(loader, path).await }
            })
            .buffered(MAX_CONCURRENT_LOADS)
            .collect()
            .await;

        let mut documents = Vec::new();
        for result in loaded {
            documents.extend(result?);
        }

        let chunks = self.splitter.split_documents(&documents);
        let chunk_count = chunks.len();
        debug!("Split {} documents into {} chunks", documents.len(), chunks.len());

        let embeddings = if chunks.is_empty() {
            Vec::new()
        } else {
            let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
            self.embedder.embed_batch(&texts).await?
        };
        if embeddings.len() != chunks.len() {
            return Err(ItineraError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let docs: Vec<Document> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Document::new(&self.collection, chunk, embedding))
            .collect();

        let sources: Vec<String> = documents
            .iter()
            .map(|d| d.source.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        self.vector_store
            .replace_sources(&self.collection, &sources, &docs)
            .await?;

        let report = IndexReport {
            files: paths.len(),
            chunks: chunk_count,
        };
        info!("{}", report);
        Ok(report)
    }
}

async fn load_blocking(loader: Arc<DocumentLoader>, path: PathBuf) -> Result<Vec<SourceDocument>> {
    tokio::task::spawn_blocking(move || loader.load(&path))
        .await
        .map_err(|e| ItineraError::Document(format!("Loader task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::testing::KeywordEmbedder;
    use crate::vector_store::{MemoryVectorStore, SqliteVectorStore};
    use async_trait::async_trait;

    struct OfflineEmbedder;

    #[async_trait]
    impl Embedder for OfflineEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(ItineraError::Embedding("network down".to_string()))
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(ItineraError::Embedding("network down".to_string()))
        }

        fn model(&self) -> &str {
            "offline"
        }
    }

    fn indexer<S: VectorStore + 'static>(store: Arc<S>) -> Indexer {
        Indexer::new(
            TextSplitter::new(1000, 150).unwrap(),
            Arc::new(KeywordEmbedder),
            store,
            "docs",
        )
    }

    #[tokio::test]
    async fn test_index_text_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("rome.txt");
        let b = dir.path().join("empty.txt");
        std::fs::write(&a, "Rome has the Colosseum.").unwrap();
        std::fs::write(&b, "").unwrap();

        let store = Arc::new(MemoryVectorStore::new());
        let report = indexer(store.clone()).index_files(&[a, b]).await.unwrap();

        assert_eq!(report, IndexReport { files: 2, chunks: 1 });
        assert_eq!(report.to_string(), "Indexed 2 files, 1 chunks");
        assert_eq!(store.document_count("docs").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reindexing_replaces_previous_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "first version").unwrap();

        let store = Arc::new(MemoryVectorStore::new());
        let indexer = indexer(store.clone());
        indexer.index_files(&[path.clone()]).await.unwrap();
        std::fs::write(&path, "second version").unwrap();
        indexer.index_files(&[path]).await.unwrap();

        let results = store.search("docs", &[1.0, 1.0, 1.0, 1.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.content, "second version");
    }

    #[tokio::test]
    async fn test_unsupported_file_fails_before_storing() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("ok.txt");
        let bad = dir.path().join("deck.pptx");
        std::fs::write(&good, "fine").unwrap();
        std::fs::write(&bad, "nope").unwrap();

        let store = Arc::new(MemoryVectorStore::new());
        let err = indexer(store.clone()).index_files(&[good, bad]).await.unwrap_err();

        assert!(matches!(err, ItineraError::InvalidInput(_)));
        assert_eq!(store.document_count("docs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_reindex_keeps_previous_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Rome museums open at nine.").unwrap();

        let store = Arc::new(MemoryVectorStore::new());
        indexer(store.clone()).index_files(&[path.clone()]).await.unwrap();

        std::fs::write(&path, "Rome museums open at ten.").unwrap();
        let offline = Indexer::new(
            TextSplitter::new(1000, 150).unwrap(),
            Arc::new(OfflineEmbedder),
            store.clone(),
            "docs",
        );
        let err = offline.index_files(&[path]).await.unwrap_err();

        assert!(err.to_string().contains("network down"));
        let results = store.search("docs", &[1.0, 1.0, 0.0, 1.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.content, "Rome museums open at nine.");
    }

    #[tokio::test]
    async fn test_reindexing_empty_file_clears_its_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Paris by night").unwrap();

        let store = Arc::new(SqliteVectorStore::in_memory().unwrap());
        let indexer = indexer(store.clone());
        indexer.index_files(&[path.clone()]).await.unwrap();
        std::fs::write(&path, "").unwrap();
        let report = indexer.index_files(&[path]).await.unwrap();

        assert_eq!(report.chunks, 0);
        assert_eq!(store.document_count("docs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_same_file_name_in_other_directory_replaces_chunks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a")).unwrap();
        std::fs::create_dir_all(dir.path().join("b")).unwrap();
        let first = dir.path().join("a").join("notes.txt");
        let second = dir.path().join("b").join("notes.txt");
        std::fs::write(&first, "Rome in spring").unwrap();
        std::fs::write(&second, "Paris in autumn").unwrap();

        let store = Arc::new(MemoryVectorStore::new());
        let indexer = indexer(store.clone());
        indexer.index_files(&[first]).await.unwrap();
        indexer.index_files(&[second]).await.unwrap();

        let results = store.search("docs", &[1.0, 1.0, 1.0, 1.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.content, "Paris in autumn");
    }
}

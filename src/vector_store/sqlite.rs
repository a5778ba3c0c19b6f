//! SQLite-based vector store implementation.
//!
//! Embeddings are stored as little-endian `f32` blobs and cosine similarity
//! is computed in Rust over the rows of one collection.

use super::{rank, Document, IndexedSource, SearchResult, VectorStore};
use crate::error::{ItineraError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row, Transaction};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    collection TEXT NOT NULL,
    source TEXT NOT NULL,
    page INTEGER,
    chunk_index INTEGER NOT NULL,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL,
    indexed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
CREATE INDEX IF NOT EXISTS idx_documents_source ON documents(collection, source);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ItineraError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn insert(tx: &Transaction<'_>, doc: &Document) -> rusqlite::Result<()> {
        tx.execute(
            r#"
            INSERT OR REPLACE INTO documents
            (id, collection, source, page, chunk_index, content, embedding, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                doc.id.to_string(),
                doc.collection,
                doc.source,
                doc.page,
                doc.chunk_index,
                doc.content,
                Self::embedding_to_bytes(&doc.embedding),
                doc.indexed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
        let id_str: String = row.get(0)?;
        let embedding_bytes: Vec<u8> = row.get(6)?;
        let indexed_at_str: String = row.get(7)?;

        Ok(Document {
            id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
            collection: row.get(1)?,
            source: row.get(2)?,
            page: row.get(3)?,
            chunk_index: row.get(4)?,
            content: row.get(5)?,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            indexed_at: Self::parse_timestamp(&indexed_at_str),
        })
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, docs), fields(count = docs.len()))]
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for doc in docs {
            Self::insert(&tx, doc)?;
        }

        tx.commit()?;
        info!("Batch upserted {} documents", docs.len());
        Ok(docs.len())
    }

    #[instrument(skip(self, sources, docs), fields(sources = sources.len(), count = docs.len()))]
    async fn replace_sources(
        &self,
        collection: &str,
        sources: &[String],
        docs: &[Document],
    ) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let mut deleted = 0;
        for source in sources {
            deleted += tx.execute(
                "DELETE FROM documents WHERE collection = ?1 AND source = ?2",
                params![collection, source],
            )?;
        }
        for doc in docs {
            Self::insert(&tx, doc)?;
        }

        tx.commit()?;
        info!("Replaced {} documents with {}", deleted, docs.len());
        Ok(docs.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, collection, source, page, chunk_index, content, embedding, indexed_at
            FROM documents
            WHERE collection = ?1
            ORDER BY rowid
            "#,
        )?;

        let docs: Vec<Document> = stmt
            .query_map(params![collection], Self::row_to_document)?
            .filter_map(|doc| doc.ok())
            .collect();

        let results = rank(docs, query_embedding, limit);
        debug!("Found {} matching documents", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn list_sources(&self, collection: &str) -> Result<Vec<IndexedSource>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT source, COUNT(*) as chunk_count, MAX(page) as pages,
                   MAX(indexed_at) as indexed_at
            FROM documents
            WHERE collection = ?1
            GROUP BY source
            ORDER BY indexed_at DESC
            "#,
        )?;

        let sources = stmt.query_map(params![collection], |row| {
            let indexed_at_str: String = row.get(3)?;
            Ok(IndexedSource {
                source: row.get(0)?,
                chunk_count: row.get(1)?,
                pages: row.get(2)?,
                indexed_at: Self::parse_timestamp(&indexed_at_str),
            })
        })?;

        Ok(sources.filter_map(|s| s.ok()).collect())
    }

    async fn document_count(&self, collection: &str) -> Result<usize> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

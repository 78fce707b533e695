//! SQLite-backed storage for documents, chunks and chat history.

use crate::chunk::ChunkMetadata;
use crate::rag::SearchFilters;
use crate::types::{DocumentRecord, DocumentStatus, HistoryEntry, KnowledgeChunk};
use crate::vector_index::VectorIndex;
use chrono::{DateTime, Utc};
use docqa_core::{AppError, AppResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

const DOCUMENT_COLUMNS: &str = "id, filename, file_type, path, content_hash, size_bytes, status, \
     error_message, chunk_count, strategy, created_at, processed_at";

/// Initialize the SQLite index database.
pub fn init_index(db_path: &Path) -> AppResult<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Knowledge(format!("Failed to create index directory: {}", e)))?;
    }

    let conn = Connection::open(db_path)
        .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            filename TEXT NOT NULL,
            file_type TEXT NOT NULL,
            path TEXT NOT NULL,
            content_hash TEXT NOT NULL,
            size_bytes INTEGER NOT NULL,
            status TEXT NOT NULL,
            error_message TEXT,
            chunk_count INTEGER NOT NULL DEFAULT 0,
            strategy TEXT,
            created_at TEXT NOT NULL,
            processed_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_documents_hash ON documents(content_hash);

        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            document_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL,
            metadata TEXT NOT NULL,
            FOREIGN KEY (document_id) REFERENCES documents(id)
        );

        CREATE INDEX IF NOT EXISTS idx_chunks_document ON chunks(document_id);

        CREATE TABLE IF NOT EXISTS chat_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            document_id TEXT,
            question TEXT NOT NULL,
            answer TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (document_id) REFERENCES documents(id)
        );

        CREATE INDEX IF NOT EXISTS idx_history_document ON chat_history(document_id);
        "#,
    )
    .map_err(|e| AppError::Knowledge(format!("Failed to create tables: {}", e)))?;

    tracing::debug!("Initialized SQLite index at {:?}", db_path);
    Ok(conn)
}

fn sql_error(action: &'static str) -> impl FnOnce(rusqlite::Error) -> AppError {
    move |e| AppError::Knowledge(format!("Failed to {}: {}", action, e))
}

/// One knowledge base's database.
pub struct SqliteIndex {
    conn: Mutex<Connection>,
}

impl SqliteIndex {
    /// Open or create the index at `db_path`.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        Ok(Self {
            conn: Mutex::new(init_index(db_path)?),
        })
    }

    fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Knowledge("Index connection lock poisoned".to_string()))
    }

    /// Register a document.
    pub fn insert_document(&self, document: &DocumentRecord) -> AppResult<()> {
        self.conn()?
            .execute(
                &format!(
                    "INSERT INTO documents ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    DOCUMENT_COLUMNS
                ),
                params![
                    document.id,
                    document.filename,
                    document.file_type.mime(),
                    document.path,
                    document.content_hash,
                    document.size_bytes as i64,
                    document.status.as_str(),
                    document.error_message,
                    document.chunk_count as i64,
                    document.strategy,
                    document.created_at.to_rfc3339(),
                    document.processed_at.map(|t| t.to_rfc3339()),
                ],
            )
            .map_err(sql_error("insert document"))?;
        Ok(())
    }

    /// Mark a document as fully processed.
    pub fn mark_completed(&self, document_id: &str, chunk_count: u32) -> AppResult<()> {
        self.conn()?
            .execute(
                "UPDATE documents SET status = ?2, chunk_count = ?3, error_message = NULL, processed_at = ?4 WHERE id = ?1",
                params![
                    document_id,
                    DocumentStatus::Completed.as_str(),
                    chunk_count as i64,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(sql_error("update document"))?;
        Ok(())
    }

    /// Mark a document as failed and drop any chunks it stored.
    pub fn mark_failed(&self, document_id: &str, message: &str) -> AppResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM chunks WHERE document_id = ?1", params![document_id])
            .map_err(sql_error("delete chunks"))?;
        conn.execute(
            "UPDATE documents SET status = ?2, chunk_count = 0, error_message = ?3, processed_at = ?4 WHERE id = ?1",
            params![
                document_id,
                DocumentStatus::Failed.as_str(),
                message,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(sql_error("update document"))?;
        Ok(())
    }

    /// Look a document up by id.
    pub fn get_document(&self, document_id: &str) -> AppResult<Option<DocumentRecord>> {
        self.conn()?
            .query_row(
                &format!("SELECT {} FROM documents WHERE id = ?1", DOCUMENT_COLUMNS),
                params![document_id],
                document_from_row,
            )
            .optional()
            .map_err(sql_error("query document"))
    }

    /// Most recent document with the given content hash.
    pub fn find_by_hash(&self, content_hash: &str) -> AppResult<Option<DocumentRecord>> {
        self.conn()?
            .query_row(
                &format!(
                    "SELECT {} FROM documents WHERE content_hash = ?1 ORDER BY created_at DESC LIMIT 1",
                    DOCUMENT_COLUMNS
                ),
                params![content_hash],
                document_from_row,
            )
            .optional()
            .map_err(sql_error("query document"))
    }

    /// All documents, oldest first.
    pub fn list_documents(&self) -> AppResult<Vec<DocumentRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM documents ORDER BY created_at, filename",
                DOCUMENT_COLUMNS
            ))
            .map_err(sql_error("prepare query"))?;

        let documents = stmt
            .query_map([], document_from_row)
            .map_err(sql_error("query documents"))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(sql_error("read document"))?;
        Ok(documents)
    }

    /// Delete a document with its chunks and history.
    ///
    /// Returns false when no such document exists.
    pub fn delete_document(&self, document_id: &str) -> AppResult<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(sql_error("begin transaction"))?;

        tx.execute("DELETE FROM chunks WHERE document_id = ?1", params![document_id])
            .map_err(sql_error("delete chunks"))?;
        tx.execute(
            "DELETE FROM chat_history WHERE document_id = ?1",
            params![document_id],
        )
        .map_err(sql_error("delete history"))?;
        let removed = tx
            .execute("DELETE FROM documents WHERE id = ?1", params![document_id])
            .map_err(sql_error("delete document"))?;

        tx.commit().map_err(sql_error("commit"))?;
        Ok(removed > 0)
    }

    /// Record a question and its answer.
    pub fn record_history(
        &self,
        document_id: Option<&str>,
        question: &str,
        answer: &str,
    ) -> AppResult<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO chat_history (document_id, question, answer, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![document_id, question, answer, Utc::now().to_rfc3339()],
        )
        .map_err(sql_error("insert history"))?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent history entries first.
    pub fn list_history(
        &self,
        document_id: Option<&str>,
        limit: usize,
    ) -> AppResult<Vec<HistoryEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, document_id, question, answer, created_at FROM chat_history
                 WHERE (?1 IS NULL OR document_id = ?1)
                 ORDER BY id DESC LIMIT ?2",
            )
            .map_err(sql_error("prepare query"))?;

        let entries = stmt
            .query_map(params![document_id, limit as i64], |row| {
                Ok(HistoryEntry {
                    id: row.get(0)?,
                    document_id: row.get(1)?,
                    question: row.get(2)?,
                    answer: row.get(3)?,
                    created_at: parse_time(4, row.get(4)?)?,
                })
            })
            .map_err(sql_error("query history"))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(sql_error("read history"))?;
        Ok(entries)
    }

    /// Number of documents in the given state.
    pub fn count_with_status(&self, status: DocumentStatus) -> AppResult<u32> {
        self.conn()?
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE status = ?1",
                params![status.as_str()],
                |row| row.get::<_, i64>(0).map(|v| v as u32),
            )
            .map_err(sql_error("count documents"))
    }

    /// When the last document finished processing.
    pub fn last_processed_at(&self) -> AppResult<Option<DateTime<Utc>>> {
        let value: Option<String> = self
            .conn()?
            .query_row(
                "SELECT MAX(processed_at) FROM documents WHERE status = ?1",
                params![DocumentStatus::Completed.as_str()],
                |row| row.get(0),
            )
            .map_err(sql_error("query documents"))?;

        value
            .map(|v| parse_time(0, v))
            .transpose()
            .map_err(sql_error("read timestamp"))
    }

    /// Dimension of the stored embeddings, if any chunk exists.
    pub fn embedding_dimension(&self) -> AppResult<Option<usize>> {
        let bytes: Option<i64> = self
            .conn()?
            .query_row("SELECT length(embedding) FROM chunks LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()
            .map_err(sql_error("query chunks"))?;
        Ok(bytes.map(|b| b as usize / 4))
    }
}

impl VectorIndex for SqliteIndex {
    fn upsert_chunk(&mut self, chunk: &KnowledgeChunk) -> AppResult<()> {
        let conn = self.conn()?;
        insert_chunk(&conn, chunk)
    }

    fn upsert_chunks(&mut self, chunks: &[KnowledgeChunk]) -> AppResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(sql_error("begin transaction"))?;
        for chunk in chunks {
            insert_chunk(&tx, chunk)?;
        }
        tx.commit().map_err(sql_error("commit chunks"))?;
        Ok(())
    }

    fn search(
        &self,
        query_embedding: &[f32],
        filters: &SearchFilters,
    ) -> AppResult<Vec<(KnowledgeChunk, f32)>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, document_id, position, text, embedding, metadata FROM chunks
                 WHERE (?1 IS NULL OR document_id = ?1)",
            )
            .map_err(sql_error("prepare query"))?;

        let scored = stmt
            .query_map(params![filters.document_id], chunk_from_row)
            .map_err(sql_error("query chunks"))?
            .map(|row| {
                row.map(|chunk| {
                    let score = chunk
                        .embedding
                        .as_deref()
                        .map_or(0.0, |e| cosine_similarity(query_embedding, e));
                    (chunk, score)
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(sql_error("read chunk"))?;

        Ok(filters.apply(scored))
    }

    fn stats(&self) -> AppResult<(u32, u32)> {
        let conn = self.conn()?;
        let count = |table: &str| -> AppResult<u32> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get::<_, i64>(0).map(|v| v as u32)
            })
            .map_err(|e| AppError::Knowledge(format!("Failed to count {}: {}", table, e)))
        };

        Ok((count("documents")?, count("chunks")?))
    }

    fn reset(&mut self) -> AppResult<()> {
        self.conn()?
            .execute_batch(
                "DELETE FROM chunks; DELETE FROM chat_history; DELETE FROM documents;",
            )
            .map_err(sql_error("reset index"))?;

        tracing::info!("Reset knowledge base index");
        Ok(())
    }
}

fn insert_chunk(conn: &Connection, chunk: &KnowledgeChunk) -> AppResult<()> {
    let embedding = chunk
        .embedding
        .as_deref()
        .ok_or_else(|| AppError::Knowledge(format!("Chunk {} missing embedding", chunk.id)))?;

    let metadata_json = serde_json::to_string(&chunk.metadata)?;

    conn.execute(
        "INSERT OR REPLACE INTO chunks (id, document_id, position, text, embedding, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            chunk.id,
            chunk.document_id,
            chunk.position as i64,
            chunk.text,
            embedding_to_bytes(embedding),
            metadata_json,
        ],
    )
    .map_err(sql_error("insert chunk"))?;
    Ok(())
}

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<DocumentRecord> {
    Ok(DocumentRecord {
        id: row.get(0)?,
        filename: row.get(1)?,
        file_type: parse_column(2, row.get(2)?)?,
        path: row.get(3)?,
        content_hash: row.get(4)?,
        size_bytes: row.get::<_, i64>(5)? as u64,
        status: parse_column(6, row.get(6)?)?,
        error_message: row.get(7)?,
        chunk_count: row.get::<_, i64>(8)? as u32,
        strategy: row.get(9)?,
        created_at: parse_time(10, row.get(10)?)?,
        processed_at: row
            .get::<_, Option<String>>(11)?
            .map(|v| parse_time(11, v))
            .transpose()?,
    })
}

fn chunk_from_row(row: &Row<'_>) -> rusqlite::Result<KnowledgeChunk> {
    let embedding_bytes: Vec<u8> = row.get(4)?;
    let embedding = bytes_to_embedding(&embedding_bytes)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Blob, Box::new(e)))?;

    let metadata_json: String = row.get(5)?;
    let metadata: ChunkMetadata = serde_json::from_str(&metadata_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(KnowledgeChunk {
        id: row.get(0)?,
        document_id: row.get(1)?,
        position: row.get::<_, i64>(2)? as u32,
        text: row.get(3)?,
        embedding: Some(embedding),
        metadata,
    })
}

fn parse_column<T>(index: usize, value: String) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

fn parse_time(index: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

/// Little-endian f32 encoding used for the embedding column.
pub(crate) fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub(crate) fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(format!(
            "Invalid embedding length: {} bytes",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ContentType;
    use tempfile::TempDir;

    fn open() -> (TempDir, SqliteIndex) {
        let temp = TempDir::new().unwrap();
        let index = SqliteIndex::open(&temp.path().join("kb").join("index.sqlite")).unwrap();
        (temp, index)
    }

    fn document(id: &str, hash: &str) -> DocumentRecord {
        DocumentRecord {
            id: id.to_string(),
            filename: format!("{}.pdf", id),
            file_type: ContentType::Pdf,
            path: format!("/docs/{}.pdf", id),
            content_hash: hash.to_string(),
            size_bytes: 1024,
            status: DocumentStatus::Processing,
            error_message: None,
            chunk_count: 0,
            strategy: Some("default".to_string()),
            created_at: Utc::now(),
            processed_at: None,
        }
    }

    fn chunk(document_id: &str, position: u32, embedding: Vec<f32>) -> KnowledgeChunk {
        KnowledgeChunk {
            id: format!("{}-{}", document_id, position),
            document_id: document_id.to_string(),
            position,
            text: format!("chunk {}", position),
            embedding: Some(embedding),
            metadata: ChunkMetadata {
                heading: Some("Terms".to_string()),
                page_number: Some(position + 1),
                chunk_index: position as usize,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_init_index() {
        let (_temp, index) = open();
        let conn = index.conn().unwrap();
        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('documents', 'chunks', 'chat_history')",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(table_count, 3);
    }

    #[test]
    fn test_document_lifecycle() {
        let (_temp, index) = open();
        index.insert_document(&document("lease", "h1")).unwrap();

        let stored = index.get_document("lease").unwrap().unwrap();
        assert_eq!(stored.status, DocumentStatus::Processing);
        assert_eq!(stored.file_type, ContentType::Pdf);

        index.mark_completed("lease", 4).unwrap();
        let stored = index.get_document("lease").unwrap().unwrap();
        assert_eq!(stored.status, DocumentStatus::Completed);
        assert_eq!(stored.chunk_count, 4);
        assert!(stored.processed_at.is_some());

        assert_eq!(index.find_by_hash("h1").unwrap().unwrap().id, "lease");
        assert!(index.find_by_hash("h2").unwrap().is_none());
        assert_eq!(index.count_with_status(DocumentStatus::Completed).unwrap(), 1);
        assert!(index.last_processed_at().unwrap().is_some());
    }

    #[test]
    fn test_mark_failed_drops_chunks() {
        let (_temp, mut index) = open();
        index.insert_document(&document("bad", "h")).unwrap();
        index.upsert_chunk(&chunk("bad", 0, vec![1.0, 0.0])).unwrap();

        index.mark_failed("bad", "embedding failed").unwrap();

        let stored = index.get_document("bad").unwrap().unwrap();
        assert_eq!(stored.status, DocumentStatus::Failed);
        assert_eq!(stored.error_message.as_deref(), Some("embedding failed"));
        assert_eq!(index.stats().unwrap(), (1, 0));
    }

    #[test]
    fn test_insert_and_search() {
        let (_temp, mut index) = open();
        index.insert_document(&document("a", "ha")).unwrap();
        index
            .upsert_chunks(&[
                chunk("a", 0, vec![1.0, 0.0, 0.0]),
                chunk("a", 1, vec![0.0, 1.0, 0.0]),
            ])
            .unwrap();

        let results = index.search(&[1.0, 0.1, 0.0], &SearchFilters::new()).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.id, "a-0");
        assert!(results[0].1 > results[1].1);
        assert_eq!(results[0].0.metadata.heading.as_deref(), Some("Terms"));
        assert_eq!(results[0].0.metadata.page_number, Some(1));
    }

    #[test]
    fn test_search_document_filter() {
        let (_temp, mut index) = open();
        index.insert_document(&document("a", "ha")).unwrap();
        index.insert_document(&document("b", "hb")).unwrap();
        index.upsert_chunk(&chunk("a", 0, vec![1.0, 0.0])).unwrap();
        index.upsert_chunk(&chunk("b", 0, vec![1.0, 0.0])).unwrap();

        let results = index
            .search(&[1.0, 0.0], &SearchFilters::new().with_document("b"))
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.document_id, "b");
    }

    #[test]
    fn test_delete_document_cascades() {
        let (_temp, mut index) = open();
        index.insert_document(&document("a", "ha")).unwrap();
        index.upsert_chunk(&chunk("a", 0, vec![1.0])).unwrap();
        index.record_history(Some("a"), "q", "a").unwrap();

        assert!(index.delete_document("a").unwrap());
        assert!(!index.delete_document("a").unwrap());
        assert_eq!(index.stats().unwrap(), (0, 0));
        assert!(index.list_history(None, 10).unwrap().is_empty());
    }

    #[test]
    fn test_history_newest_first() {
        let (_temp, index) = open();
        index.insert_document(&document("a", "ha")).unwrap();
        index.record_history(Some("a"), "first?", "one").unwrap();
        index.record_history(Some("a"), "second?", "two").unwrap();
        index.record_history(None, "global?", "three").unwrap();

        let entries = index.list_history(Some("a"), 10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].question, "second?");

        assert_eq!(index.list_history(None, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_reset() {
        let (_temp, mut index) = open();
        index.insert_document(&document("a", "ha")).unwrap();
        index.upsert_chunk(&chunk("a", 0, vec![1.0, 2.0])).unwrap();
        assert_eq!(index.embedding_dimension().unwrap(), Some(2));

        index.reset().unwrap();
        assert_eq!(index.stats().unwrap(), (0, 0));
        assert_eq!(index.embedding_dimension().unwrap(), None);
    }

    #[test]
    fn test_embedding_bytes() {
        let bytes = embedding_to_bytes(&[1.5, -2.0]);
        assert_eq!(bytes.len(), 8);
        assert_eq!(bytes_to_embedding(&bytes).unwrap(), vec![1.5, -2.0]);
        assert!(bytes_to_embedding(&[0, 1, 2]).is_err());
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.001);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}

//! Persistent vector collection backed by SQLite
//!
//! The database file doubles as the initialization marker: it only appears at
//! its final path once every chunk has been written.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkSource};

/// Search result with chunk and similarity
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity (-1.0 to 1.0, higher is better)
    pub similarity: f32,
}

/// Facts recorded about a collection when it is built
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionMeta {
    /// Embedding model the vectors came from
    pub embedding_model: String,
    /// Vector dimensions
    pub dimensions: usize,
    /// SHA-256 of the source file at build time
    pub source_hash: Option<String>,
    /// Build time
    pub created_at: DateTime<Utc>,
}

/// SQLite-backed vector store with exact cosine search
pub struct VectorStore {
    conn: Mutex<Connection>,
    path: PathBuf,
    meta: CollectionMeta,
}

impl VectorStore {
    /// Whether an initialized store exists at `path`
    pub fn exists(path: &Path) -> bool {
        path.is_file()
    }

    /// Open an existing store
    pub fn open(path: &Path) -> Result<Self> {
        if !Self::exists(path) {
            return Err(Error::vector_db(format!("No vector store at {}", path.display())));
        }

        let conn = Connection::open(path)?;
        let meta = read_meta(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
            meta,
        })
    }

    /// Build a new store from chunks and their embeddings, then open it
    ///
    /// Writes go to a sibling `.building` file which is renamed onto `path`
    /// only after the transaction commits.
    pub fn build(
        path: &Path,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
        embedding_model: &str,
        source_hash: Option<String>,
    ) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(Error::vector_db(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let dimensions = embeddings.first().map_or(0, Vec::len);
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimensions) {
            return Err(Error::vector_db(format!(
                "Inconsistent embedding dimensions: {} and {}",
                dimensions,
                bad.len()
            )));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let staging = staging_path(path);
        if staging.exists() {
            std::fs::remove_file(&staging)?;
        }

        let meta = CollectionMeta {
            embedding_model: embedding_model.to_string(),
            dimensions,
            source_hash,
            created_at: Utc::now(),
        };

        {
            let mut conn = Connection::open(&staging)?;
            migrate(&conn)?;

            let tx = conn.transaction()?;
            {
                let mut insert = tx.prepare(
                    "INSERT INTO chunks (id, content, source, page, chunk_index, char_start, embedding)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )?;
                for (chunk, embedding) in chunks.iter().zip(embeddings) {
                    insert.execute(params![
                        chunk.id.to_string(),
                        chunk.content,
                        chunk.source.source,
                        chunk.source.page as i64,
                        chunk.source.chunk_index as i64,
                        chunk.source.char_start as i64,
                        encode_vector(embedding),
                    ])?;
                }
            }
            write_meta(&tx, &meta)?;
            tx.commit()?;
        }

        std::fs::rename(&staging, path)?;
        tracing::info!(
            "Persisted {} chunks ({} dimensions) to {}",
            chunks.len(),
            dimensions,
            path.display()
        );

        Self::open(path)
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Collection metadata
    pub fn meta(&self) -> &CollectionMeta {
        &self.meta
    }

    /// Number of stored chunks
    pub fn len(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Check if the store holds no chunks
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Top `k` chunks by cosine similarity, best first; ties keep insertion order
    pub fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if query_embedding.len() != self.meta.dimensions {
            return Err(Error::vector_db(format!(
                "Query has {} dimensions, collection has {}",
                query_embedding.len(),
                self.meta.dimensions
            )));
        }

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, content, source, page, chunk_index, char_start, embedding
             FROM chunks ORDER BY rowid",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, Vec<u8>>(6)?,
            ))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (id, content, source, page, chunk_index, char_start, blob) = row?;
            let id = Uuid::parse_str(&id)
                .map_err(|e| Error::vector_db(format!("Corrupt chunk id '{}': {}", id, e)))?;
            let vector = decode_vector(&blob)?;

            results.push(SearchResult {
                similarity: cosine_similarity(query_embedding, &vector),
                chunk: Chunk {
                    id,
                    content,
                    source: ChunkSource {
                        source,
                        page: page as u32,
                        chunk_index: chunk_index as u32,
                        char_start: char_start as usize,
                    },
                },
            });
        }

        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        results.truncate(k);
        Ok(results)
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".building");
    path.with_file_name(name)
}

fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            source TEXT NOT NULL,
            page INTEGER NOT NULL,
            chunk_index INTEGER NOT NULL,
            char_start INTEGER NOT NULL,
            embedding BLOB NOT NULL
        );

        CREATE TABLE IF NOT EXISTS collection_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn write_meta(conn: &Connection, meta: &CollectionMeta) -> Result<()> {
    let mut entries = vec![
        ("embedding_model", meta.embedding_model.clone()),
        ("dimensions", meta.dimensions.to_string()),
        ("created_at", meta.created_at.to_rfc3339()),
    ];
    if let Some(hash) = &meta.source_hash {
        entries.push(("source_hash", hash.clone()));
    }

    for (key, value) in entries {
        conn.execute(
            "INSERT OR REPLACE INTO collection_meta (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
    }
    Ok(())
}

fn read_meta(conn: &Connection) -> Result<CollectionMeta> {
    let get = |key: &str| -> Result<Option<String>> {
        Ok(conn
            .query_row(
                "SELECT value FROM collection_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    };
    let require = |key: &str| -> Result<String> {
        get(key)?.ok_or_else(|| Error::vector_db(format!("Collection metadata missing '{}'", key)))
    };

    let dimensions = require("dimensions")?
        .parse::<usize>()
        .map_err(|e| Error::vector_db(format!("Invalid dimensions: {}", e)))?;
    let created_at = DateTime::parse_from_rfc3339(&require("created_at")?)
        .map_err(|e| Error::vector_db(format!("Invalid created_at: {}", e)))?
        .with_timezone(&Utc);

    Ok(CollectionMeta {
        embedding_model: require("embedding_model")?,
        dimensions,
        source_hash: get("source_hash")?,
        created_at,
    })
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_vector(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return Err(Error::vector_db(format!("Corrupt embedding of {} bytes", blob.len())));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Cosine similarity; zero vectors score 0.0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

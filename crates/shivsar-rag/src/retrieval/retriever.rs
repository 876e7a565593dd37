//! Retriever abstraction over the vector store

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::Chunk;

use super::store::VectorStore;

/// Maps a query to an ordered sequence of context chunks, most relevant first
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve context chunks for a query
    async fn retrieve(&self, query: &str) -> Result<Vec<Chunk>>;
}

/// Retriever that embeds the query and searches the persisted collection
pub struct VectorStoreRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<VectorStore>,
    top_k: usize,
}

impl VectorStoreRetriever {
    /// Create a retriever returning up to `top_k` chunks
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<VectorStore>, top_k: usize) -> Self {
        Self {
            embedder,
            store,
            top_k,
        }
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }
}

#[async_trait]
impl Retriever for VectorStoreRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Chunk>> {
        let query_embedding = self.embedder.embed(query).await?;

        // SQLite access is blocking
        let store = self.store.clone();
        let top_k = self.top_k;
        let results = tokio::task::spawn_blocking(move || store.search(&query_embedding, top_k))
            .await
            .map_err(|e| Error::internal(format!("Task join error: {}", e)))??;

        for result in &results {
            tracing::debug!(
                "Retrieved {} (similarity {:.3})",
                result.chunk.source.format_citation(),
                result.similarity
            );
        }

        Ok(results.into_iter().map(|r| r.chunk).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkSource;

    struct AxisEmbedder;

    #[async_trait]
    impl EmbeddingProvider for AxisEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(if text.contains("phone") {
                vec![0.0, 1.0]
            } else {
                vec![1.0, 0.0]
            })
        }

        fn model(&self) -> &str {
            "axis"
        }

        fn name(&self) -> &str {
            "axis"
        }
    }

    #[tokio::test]
    async fn test_retrieves_nearest_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let chunks: Vec<Chunk> = ["We grow onions", "Phone: +91 98765 43210"]
            .iter()
            .enumerate()
            .map(|(i, text)| {
                Chunk::new(
                    text.to_string(),
                    ChunkSource {
                        source: "shivsar_export.pdf".to_string(),
                        page: 0,
                        chunk_index: i as u32,
                        char_start: 0,
                    },
                )
            })
            .collect();
        let store = VectorStore::build(
            &dir.path().join("store.sqlite3"),
            &chunks,
            &[vec![1.0, 0.0], vec![0.0, 1.0]],
            "axis",
            None,
        )
        .unwrap();

        let retriever = VectorStoreRetriever::new(Arc::new(AxisEmbedder), Arc::new(store), 1);
        let retrieved = retriever
            .retrieve("what is your phone number about SHIVSAR EXPORT company")
            .await
            .unwrap();

        assert_eq!(retrieved.len(), 1);
        assert_eq!(retrieved[0].content, "Phone: +91 98765 43210");
    }
}

//! Builds the persistent vector collection, or reuses it when already present

use std::path::PathBuf;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::retrieval::VectorStore;

use super::chunker::TextSplitter;
use super::loader::{hash_file, DocumentLoader};

/// Load, split, embed and persist, once per store
pub struct Indexer {
    store_path: PathBuf,
    splitter: TextSplitter,
}

impl Indexer {
    /// Create an indexer writing to `store_path`
    pub fn new(store_path: impl Into<PathBuf>, splitter: TextSplitter) -> Self {
        Self {
            store_path: store_path.into(),
            splitter,
        }
    }

    /// Create from config
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(
            config.store.marker_path(),
            TextSplitter::from_config(&config.chunking),
        )
    }

    /// Path of the store's marker file
    pub fn store_path(&self) -> &std::path::Path {
        &self.store_path
    }

    /// Open the store if its marker exists, otherwise build it from the loader.
    ///
    /// An existing store is reused as-is: the loader and the embedder are not
    /// touched, and a changed source file is only reported.
    pub async fn ensure_store(
        &self,
        loader: &dyn DocumentLoader,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<VectorStore> {
        if VectorStore::exists(&self.store_path) {
            tracing::info!("Reusing vector store at {}", self.store_path.display());
            let store = VectorStore::open(&self.store_path)?;
            self.report_drift(&store, loader, embedder);
            return Ok(store);
        }

        tracing::info!("No vector store at {}, building", self.store_path.display());

        let pages = loader.load()?;
        let chunks = self.splitter.split_documents(&pages);
        tracing::info!("Split {} pages into {} chunks", pages.len(), chunks.len());

        if chunks.is_empty() {
            return Err(Error::file_parse(
                loader
                    .source_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                "No text to index",
            ));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "{} returned {} embeddings for {} chunks",
                embedder.name(),
                embeddings.len(),
                chunks.len()
            )));
        }

        let source_hash = pages.first().map(|p| p.content_hash.clone());
        let model = embedder.model().to_string();
        let path = self.store_path.clone();

        tokio::task::spawn_blocking(move || {
            VectorStore::build(&path, &chunks, &embeddings, &model, source_hash)
        })
        .await
        .map_err(|e| Error::internal(format!("Task join error: {}", e)))?
    }

    /// Warn when the reused store no longer matches its inputs
    fn report_drift(
        &self,
        store: &VectorStore,
        loader: &dyn DocumentLoader,
        embedder: &dyn EmbeddingProvider,
    ) {
        let meta = store.meta();

        if meta.embedding_model != embedder.model() {
            tracing::warn!(
                "Store was built with embedding model {}, querying with {}",
                meta.embedding_model,
                embedder.model()
            );
        }

        let current = loader.source_path().and_then(hash_file);
        if let (Some(built), Some(current)) = (meta.source_hash.as_deref(), current.as_deref()) {
            if built != current {
                tracing::warn!(
                    "Source has changed since the store was built on {}; delete {} to rebuild",
                    meta.created_at.to_rfc3339(),
                    self.store_path.display()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChunkingStrategy;
    use crate::types::PageDocument;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts texts embedded; vectors encode length and vowel count
    #[derive(Default)]
    struct CountingEmbedder {
        texts: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.texts.fetch_add(1, Ordering::SeqCst);
            let vowels = text.chars().filter(|c| "aeiou".contains(*c)).count();
            Ok(vec![text.len() as f32, vowels as f32 + 1.0])
        }

        fn model(&self) -> &str {
            "counting"
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct MemoryLoader {
        pages: Vec<PageDocument>,
        source: Option<PathBuf>,
        loads: AtomicUsize,
    }

    impl MemoryLoader {
        fn new(pages: Vec<PageDocument>) -> Self {
            Self {
                pages,
                source: None,
                loads: AtomicUsize::new(0),
            }
        }
    }

    impl DocumentLoader for MemoryLoader {
        fn load(&self) -> Result<Vec<PageDocument>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(self.pages.clone())
        }

        fn source_path(&self) -> Option<&Path> {
            self.source.as_deref()
        }
    }

    fn brochure() -> Vec<PageDocument> {
        vec![
            PageDocument::new("a".repeat(2500), "shivsar_export.pdf", 0, "hash-v1"),
            PageDocument::new("Phone: +91 98765 43210", "shivsar_export.pdf", 1, "hash-v1"),
        ]
    }

    fn indexer(dir: &Path) -> Indexer {
        Indexer::new(
            dir.join("db").join("chroma.sqlite3"),
            TextSplitter::new(1000, 200, ChunkingStrategy::FixedWindow),
        )
    }

    #[tokio::test]
    async fn test_builds_when_marker_absent() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = indexer(dir.path());
        let loader = MemoryLoader::new(brochure());
        let embedder = CountingEmbedder::default();

        assert!(!indexer.store_path().exists());
        let store = indexer.ensure_store(&loader, &embedder).await.unwrap();

        // 3 windows for page 0, 1 for page 1
        assert_eq!(store.len().unwrap(), 4);
        assert_eq!(embedder.texts.load(Ordering::SeqCst), 4);
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert!(indexer.store_path().exists());
        assert_eq!(store.meta().source_hash.as_deref(), Some("hash-v1"));
        assert_eq!(store.meta().embedding_model, "counting");
    }

    #[tokio::test]
    async fn test_reuses_when_marker_present() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = indexer(dir.path());
        indexer
            .ensure_store(&MemoryLoader::new(brochure()), &CountingEmbedder::default())
            .await
            .unwrap();

        let loader = MemoryLoader::new(brochure());
        let embedder = CountingEmbedder::default();
        let store = indexer.ensure_store(&loader, &embedder).await.unwrap();

        assert_eq!(store.len().unwrap(), 4);
        assert_eq!(embedder.texts.load(Ordering::SeqCst), 0);
        assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_changed_source_is_not_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = indexer(dir.path());
        indexer
            .ensure_store(&MemoryLoader::new(brochure()), &CountingEmbedder::default())
            .await
            .unwrap();

        let pdf = dir.path().join("shivsar_export.pdf");
        std::fs::write(&pdf, b"new brochure contents").unwrap();
        let mut loader = MemoryLoader::new(vec![PageDocument::new(
            "Completely new text",
            "shivsar_export.pdf",
            0,
            "hash-v2",
        )]);
        loader.source = Some(pdf);
        let embedder = CountingEmbedder::default();

        let store = indexer.ensure_store(&loader, &embedder).await.unwrap();

        assert_eq!(store.len().unwrap(), 4);
        assert_eq!(store.meta().source_hash.as_deref(), Some("hash-v1"));
        assert_eq!(embedder.texts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_source_fails_without_marker() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = indexer(dir.path());
        let loader = MemoryLoader::new(vec![PageDocument::new("   ", "blank.pdf", 0, "h")]);

        let result = indexer.ensure_store(&loader, &CountingEmbedder::default()).await;

        assert!(matches!(result, Err(Error::FileParse { .. })));
        assert!(!indexer.store_path().exists());
    }
}

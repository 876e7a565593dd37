//! Question answering: enrich, retrieve, answer

use std::sync::Arc;
use std::time::Instant;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::{Answerer, LlmAnswerer, PromptTemplate};
use crate::ingestion::{Indexer, PdfLoader};
use crate::providers::{EmbeddingProvider, OpenAiProvider};
use crate::retrieval::{QueryEnricher, Retriever, VectorStoreRetriever};
use crate::types::{Answer, SourceRef};

/// Composes a [`Retriever`] and an [`Answerer`] behind query enrichment
pub struct QaPipeline<R = VectorStoreRetriever, A = LlmAnswerer> {
    enricher: QueryEnricher,
    retriever: R,
    answerer: A,
}

impl<R: Retriever, A: Answerer> QaPipeline<R, A> {
    /// Create a pipeline from its parts
    pub fn new(enricher: QueryEnricher, retriever: R, answerer: A) -> Self {
        Self {
            enricher,
            retriever,
            answerer,
        }
    }

    /// Answer one question
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let start = Instant::now();

        let query = self.enricher.enrich(question);
        tracing::info!("Query: {}", query);

        let context = self.retriever.retrieve(&query).await?;
        tracing::info!("Retrieved {} context chunks", context.len());

        let text = self.answerer.answer(&context, &query).await?;

        Ok(Answer {
            question: question.to_string(),
            query,
            text,
            sources: context.iter().map(SourceRef::from).collect(),
            response_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

impl QaPipeline {
    /// Wire the production pipeline: OpenAI providers, the PDF loader and the
    /// persisted store (built on first use)
    pub async fn from_config(config: &RagConfig) -> Result<Self> {
        config.api_key()?;

        let (embedder, chat) = OpenAiProvider::new(&config.openai)?.split();
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(embedder);

        let loader = PdfLoader::new(&config.source.pdf_path);
        let store = Indexer::from_config(config)
            .ensure_store(&loader, embedder.as_ref())
            .await?;

        let retriever = VectorStoreRetriever::new(embedder, Arc::new(store), config.retrieval.top_k);
        let answerer = LlmAnswerer::new(Arc::new(chat), PromptTemplate::from_config(&config.company));

        Ok(Self::new(
            QueryEnricher::from_config(&config.company),
            retriever,
            answerer,
        ))
    }
}

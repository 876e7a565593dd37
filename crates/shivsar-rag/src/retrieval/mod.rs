//! Query enrichment, persistent vector storage and retrieval

pub mod enrich;
pub mod retriever;
pub mod store;

pub use enrich::{enrich_query, QueryEnricher};
pub use retriever::{Retriever, VectorStoreRetriever};
pub use store::{CollectionMeta, SearchResult, VectorStore};

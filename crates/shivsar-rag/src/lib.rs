//! shivsar-rag: question answering over the Shivsar Export company brochure
//!
//! The pipeline loads the company PDF, splits it into overlapping chunks, embeds
//! and persists them in a SQLite-backed vector collection, then answers questions
//! with a chat model constrained to the retrieved context.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::QaPipeline;
pub use retrieval::enrich_query;
pub use types::{Answer, Chunk, ChunkSource, PageDocument, SourceRef};

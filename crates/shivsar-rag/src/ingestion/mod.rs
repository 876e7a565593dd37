//! Document ingestion: PDF loading, chunking and indexing

mod chunker;
mod indexer;
mod loader;

pub use chunker::TextSplitter;
pub use indexer::Indexer;
pub use loader::{hash_bytes, hash_file, DocumentLoader, PdfLoader};

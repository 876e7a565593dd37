//! Configuration for the RAG pipeline
//!
//! Everything the pipeline touches outside the process (the source PDF, the
//! persisted store, the OpenAI credential) is described here and passed in
//! explicitly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable holding the OpenAI API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Main RAG pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Company the assistant speaks for
    pub company: CompanyConfig,
    /// Source document
    pub source: SourceConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Persistent vector store
    pub store: StoreConfig,
    /// OpenAI embedding and chat configuration
    pub openai: OpenAiConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
}

impl RagConfig {
    /// Load configuration: defaults, optionally overlaid by a TOML file, then
    /// the API key from the environment (after reading a local `.env`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };

        match dotenvy::dotenv() {
            Ok(env_path) => tracing::debug!("Loaded environment from {}", env_path.display()),
            Err(e) if e.not_found() => tracing::debug!("No .env file found"),
            Err(e) => return Err(Error::config(format!("Failed to read .env: {}", e))),
        }

        if config.openai.api_key.is_none() {
            config.openai.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document; missing sections and fields take their defaults
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::config(format!("Invalid config: {}", e)))
    }

    /// Check invariants that would otherwise surface deep inside the pipeline
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::config("chunking.chunk_size must be greater than 0"));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.company.match_term.trim().is_empty() {
            return Err(Error::config("company.match_term must not be empty"));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::config("retrieval.top_k must be greater than 0"));
        }
        if self.openai.embed_batch_size == 0 {
            return Err(Error::config("openai.embed_batch_size must be greater than 0"));
        }
        Ok(())
    }

    /// The API key, or a config error naming the variable to set
    pub fn api_key(&self) -> Result<&str> {
        self.openai
            .api_key
            .as_deref()
            .ok_or_else(|| Error::config(format!("{} is not set", API_KEY_ENV)))
    }
}

/// Company identity used for query enrichment and the prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyConfig {
    /// Display name used in the prompt
    pub name: String,
    /// Lowercase term whose presence marks a query as already company-specific
    pub match_term: String,
    /// Phrase appended to queries that do not mention the company
    pub base_context: String,
    /// Where users are sent when the answer is not in the data
    pub support_url: String,
}

impl Default for CompanyConfig {
    fn default() -> Self {
        Self {
            name: "SHIVSAR EXPORTS ONIONS".to_string(),
            match_term: "shivsar".to_string(),
            base_context: "about SHIVSAR EXPORT company".to_string(),
            support_url: "https://shivsarexport.com".to_string(),
        }
    }
}

/// Source document configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// PDF to index, relative to the working directory
    pub pdf_path: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            pdf_path: PathBuf::from("shivsar_export.pdf"),
        }
    }
}

/// How page text is cut into chunks
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingStrategy {
    /// Fixed character windows with no boundary awareness
    #[default]
    FixedWindow,
    /// Separator-aware splitting (paragraph, line, word, character)
    Recursive,
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Chunk size in characters
    pub chunk_size: usize,
    /// Overlap between neighbouring chunks in characters
    pub chunk_overlap: usize,
    /// Splitting strategy
    pub strategy: ChunkingStrategy,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            strategy: ChunkingStrategy::FixedWindow,
        }
    }
}

/// Persistent vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the store
    pub persist_directory: PathBuf,
    /// Database file inside the directory; its presence marks an initialized store
    pub file_name: String,
}

impl StoreConfig {
    /// Path of the database file (the initialization marker)
    pub fn marker_path(&self) -> PathBuf {
        self.persist_directory.join(&self.file_name)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            persist_directory: PathBuf::from("db"),
            file_name: "chroma.sqlite3".to_string(),
        }
    }
}

/// OpenAI API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key; read from the environment, never written back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Chat model name
    pub chat_model: String,
    /// Sampling temperature for the chat model
    pub temperature: f32,
    /// Texts per embeddings request
    pub embed_batch_size: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for failed requests (0 = fail on first error)
    pub max_retries: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            embed_model: "text-embedding-ada-002".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            embed_batch_size: 1000,
            timeout_secs: 600,
            max_retries: 0,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the chat model
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

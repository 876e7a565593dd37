//! OpenAI client for embeddings and chat completion with optional retry

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::OpenAiConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;

/// OpenAI API client
pub struct OpenAiClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: OpenAiConfig,
    /// Bearer token
    api_key: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a client; fails if no API key is configured
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::config("OpenAI API key is not set"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        retry_with_backoff(self.config.max_retries, operation).await
    }

    /// Embed a batch of texts, returning vectors in input order
    pub async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = self.url("embeddings");
        let url = url.as_str();
        let this = self;
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.config.embed_batch_size.max(1)) {
            tracing::debug!("Embedding batch of {} texts", batch.len());

            let vectors = self
                .retry_request(|| async move {
                    let request = EmbedRequest {
                        model: &this.config.embed_model,
                        input: batch,
                    };

                    let response = this
                        .client
                        .post(url)
                        .bearer_auth(&this.api_key)
                        .json(&request)
                        .send()
                        .await
                        .map_err(|e| Error::embedding(format!("Embedding request failed: {}", e)))?;

                    if !response.status().is_success() {
                        let status = response.status();
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::embedding(format!(
                            "Embedding failed: HTTP {} - {}",
                            status, body
                        )));
                    }

                    let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                        Error::embedding(format!("Failed to parse embedding response: {}", e))
                    })?;

                    order_embeddings(embed_response.data, batch.len())
                })
                .await?;

            embeddings.extend(vectors);
        }

        Ok(embeddings)
    }

    /// Send a single user message and return the reply text
    pub async fn chat(&self, prompt: &str) -> Result<String> {
        let url = self.url("chat/completions");
        let url = url.as_str();
        let this = self;
        tracing::info!("Generating answer with model: {}", self.config.chat_model);

        self.retry_request(|| async move {
            let request = ChatRequest {
                model: &this.config.chat_model,
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt,
                }],
                temperature: this.config.temperature,
            };

            let response = this
                .client
                .post(url)
                .bearer_auth(&this.api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::llm(format!("Generation request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::llm(format!(
                    "Generation failed: HTTP {} - {}",
                    status, body
                )));
            }

            let chat_response: ChatResponse = response
                .json()
                .await
                .map_err(|e| Error::llm(format!("Failed to parse generation response: {}", e)))?;

            first_choice(chat_response)
        })
        .await
    }
}

/// Longest wait between attempts
const MAX_BACKOFF_SECS: u64 = 60;

/// Run `operation`, retrying up to `max_retries` times with 1s, 2s, 4s... delays
/// capped at a minute
async fn retry_with_backoff<F, Fut, T>(max_retries: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_retries => {
                let delay = backoff_delay(attempt);
                tracing::warn!(
                    "Request failed (attempt {}/{}): {}, retrying in {:?}",
                    attempt + 1,
                    max_retries + 1,
                    e,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt).min(MAX_BACKOFF_SECS))
}

/// Put embeddings back in request order and check none are missing
fn order_embeddings(mut data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(Error::embedding(format!(
            "Expected {} embeddings, got {}",
            expected,
            data.len()
        )));
    }
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

fn first_choice(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| Error::llm("Chat response contained no content"))
}

/// OpenAI embedding provider
pub struct OpenAiEmbedder {
    client: Arc<OpenAiClient>,
}

impl OpenAiEmbedder {
    /// Create from existing client
    pub fn from_client(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.client.embed_texts(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::embedding("Empty embedding response"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.client.embed_texts(texts).await
    }

    fn model(&self) -> &str {
        &self.client.config.embed_model
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// OpenAI chat provider for answer generation
pub struct OpenAiChat {
    client: Arc<OpenAiClient>,
}

impl OpenAiChat {
    /// Create from existing client
    pub fn from_client(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LlmProvider for OpenAiChat {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.client.chat(prompt).await
    }

    fn model(&self) -> &str {
        &self.client.config.chat_model
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Embedding and chat providers sharing one HTTP client
pub struct OpenAiProvider {
    embedder: OpenAiEmbedder,
    chat: OpenAiChat,
}

impl OpenAiProvider {
    /// Create a combined provider
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let client = Arc::new(OpenAiClient::new(config)?);
        Ok(Self {
            embedder: OpenAiEmbedder::from_client(Arc::clone(&client)),
            chat: OpenAiChat::from_client(client),
        })
    }

    /// Split into separate providers
    pub fn split(self) -> (OpenAiEmbedder, OpenAiChat) {
        (self.embedder, self.chat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_client_requires_api_key() {
        let config = OpenAiConfig::default();
        assert!(matches!(OpenAiClient::new(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_url_joins_base() {
        let config = OpenAiConfig {
            api_key: Some("sk-test".to_string()),
            base_url: "http://localhost:8080/v1/".to_string(),
            ..OpenAiConfig::default()
        };
        let client = OpenAiClient::new(&config).unwrap();
        assert_eq!(client.url("embeddings"), "http://localhost:8080/v1/embeddings");
    }

    #[test]
    fn test_embeddings_reordered_by_index() {
        let response: EmbedResponse = serde_json::from_str(
            r#"{
                "object": "list",
                "data": [
                    {"object": "embedding", "index": 1, "embedding": [0.0, 1.0]},
                    {"object": "embedding", "index": 0, "embedding": [1.0, 0.0]}
                ],
                "model": "text-embedding-ada-002"
            }"#,
        )
        .unwrap();

        let ordered = order_embeddings(response.data, 2).unwrap();
        assert_eq!(ordered, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_embedding_count_mismatch_fails() {
        let data = vec![EmbeddingData {
            embedding: vec![1.0],
            index: 0,
        }];
        assert!(matches!(order_embeddings(data, 2), Err(Error::Embedding(_))));
    }

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
            temperature: 0.5,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_first_choice_content() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"index": 0, "message": {"role": "assistant", "content": "+91 98765 43210"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_choice(response).unwrap(), "+91 98765 43210");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(first_choice(empty), Err(Error::Llm(_))));
    }

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(3), Duration::from_secs(8));
        assert_eq!(backoff_delay(64), Duration::from_secs(MAX_BACKOFF_SECS));
        assert_eq!(backoff_delay(u32::MAX), Duration::from_secs(MAX_BACKOFF_SECS));
    }

    #[test]
    fn test_no_retries_by_default() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let result: Result<()> = tokio_test::block_on(retry_with_backoff(0, || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(Error::llm("rate limited"))
        }));

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}

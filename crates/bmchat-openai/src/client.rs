//! OpenAI client implementation

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use bmchat_core::{
    ChatPrompt, CompletionProvider, EmbeddingProvider, Error, Result, RetryConfig,
};

use crate::config::OpenAiConfig;

/// OpenAI client serving both embeddings and chat completions
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
    retry: RetryConfig,
}

#[derive(Debug, Serialize)]
pub(crate) struct EmbeddingRequest<'a> {
    pub model: &'a str,
    pub input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingData {
    pub embedding: Vec<f32>,
    pub index: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseMessage {
    pub content: Option<String>,
}

/// Which provider failure a request maps onto
#[derive(Debug, Clone, Copy)]
pub(crate) enum Capability {
    Embedding,
    Completion,
}

impl Capability {
    fn error(self, message: String) -> Error {
        match self {
            Capability::Embedding => Error::EmbeddingProvider(message),
            Capability::Completion => Error::CompletionProvider(message),
        }
    }
}

/// One failed attempt, and whether another may succeed
struct AttemptError {
    error: Error,
    retryable: bool,
}

impl OpenAiClient {
    /// Create a new OpenAI client from configuration
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::Authentication("missing OpenAI API key".to_string()));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            config,
            client,
            retry: RetryConfig::default(),
        })
    }

    /// Create a new OpenAI client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = OpenAiConfig::from_env()?;
        Self::new(config)
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    pub(crate) fn embedding_request<'a>(&'a self, inputs: &'a [String]) -> EmbeddingRequest<'a> {
        EmbeddingRequest {
            model: &self.config.embedding_model,
            input: inputs.iter().map(String::as_str).collect(),
        }
    }

    pub(crate) fn chat_request<'a>(&'a self, prompt: &'a ChatPrompt) -> ChatRequest<'a> {
        let generation = &self.config.generation;
        ChatRequest {
            model: &generation.model_id,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: generation.temperature,
            max_tokens: generation.max_tokens,
        }
    }

    /// POST `body` to `path`, retrying throttling, server errors and
    /// transient transport failures with exponential backoff.
    async fn post_json<B, R>(
        &self,
        path: &str,
        body: &B,
        capability: Capability,
        request_timeout: Duration,
    ) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        let url = self.config.endpoint(path);
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let result = match timeout(request_timeout, self.send_once(&url, body, capability)).await {
                Ok(result) => result,
                Err(_) => Err(AttemptError {
                    error: Error::Timeout(format!(
                        "{} request timed out after {:?}",
                        path, request_timeout
                    )),
                    retryable: true,
                }),
            };

            match result {
                Ok(response) => return Ok(response),
                Err(failure) if failure.retryable && attempt < max_attempts => {
                    let backoff = self.retry.backoff(attempt);
                    warn!(
                        path,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %failure.error,
                        "retrying OpenAI request"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }

    async fn send_once<B, R>(
        &self,
        url: &str,
        body: &B,
        capability: Capability,
    ) -> std::result::Result<R, AttemptError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        let response = self
            .client
            .post(url)
            .bearer_auth(self.config.api_key.trim())
            .json(body)
            .send()
            .await
            .map_err(|e| AttemptError {
                retryable: is_transient(&e),
                error: Error::Network(e.to_string()),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(AttemptError {
                retryable: should_retry(status),
                error: status_error(status, &body, capability),
            });
        }

        response.json::<R>().await.map_err(|e| AttemptError {
            retryable: false,
            error: Error::Serialization(e.to_string()),
        })
    }
}

/// Throttling and server-side failures are worth another attempt
pub(crate) fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

pub(crate) fn status_error(status: StatusCode, body: &str, capability: Capability) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Authentication(format!(
            "OpenAI rejected the API key ({}): {}",
            status, body
        )),
        _ => capability.error(format!("OpenAI request failed ({}): {}", status, body)),
    }
}

/// Order embeddings by their input index and check one came back per input
pub(crate) fn collect_embeddings(
    mut response: EmbeddingResponse,
    expected: usize,
) -> Result<Vec<Vec<f32>>> {
    response.data.sort_by_key(|entry| entry.index);
    if response.data.len() != expected {
        return Err(Error::EmbeddingProvider(format!(
            "OpenAI returned {} embeddings for {} inputs",
            response.data.len(),
            expected
        )));
    }
    Ok(response.data.into_iter().map(|entry| entry.embedding).collect())
}

pub(crate) fn first_message(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| Error::CompletionProvider("OpenAI returned no message content".to_string()))
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::EmbeddingProvider("OpenAI returned no embedding".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|text| text.trim().is_empty()) {
            return Err(Error::InvalidInput(
                "cannot embed empty text".to_string(),
            ));
        }

        let request = self.embedding_request(texts);
        let response: EmbeddingResponse = self
            .post_json(
                "embeddings",
                &request,
                Capability::Embedding,
                self.config.request_timeout,
            )
            .await?;

        debug!(inputs = texts.len(), model = %self.config.embedding_model, "embedded texts");
        collect_embeddings(response, texts.len())
    }

    fn model_id(&self) -> &str {
        &self.config.embedding_model
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String> {
        let request = self.chat_request(prompt);
        let response: ChatResponse = self
            .post_json(
                "chat/completions",
                &request,
                Capability::Completion,
                self.config.generation.timeout,
            )
            .await?;

        first_message(response)
    }

    fn model_id(&self) -> &str {
        &self.config.generation.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(should_retry(StatusCode::TOO_MANY_REQUESTS));
        assert!(should_retry(StatusCode::BAD_GATEWAY));
        assert!(!should_retry(StatusCode::BAD_REQUEST));
        assert!(!should_retry(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_status_error_mapping() {
        let error = status_error(StatusCode::UNAUTHORIZED, "bad key", Capability::Embedding);
        assert!(matches!(error, Error::Authentication(_)));

        let error = status_error(StatusCode::TOO_MANY_REQUESTS, "slow down", Capability::Embedding);
        assert!(matches!(error, Error::EmbeddingProvider(_)));

        let error = status_error(StatusCode::INTERNAL_SERVER_ERROR, "oops", Capability::Completion);
        assert!(matches!(error, Error::CompletionProvider(_)));
    }

    #[test]
    fn test_collect_embeddings_orders_by_index() {
        let response: EmbeddingResponse = serde_json::from_str(
            r#"{"data": [
                {"embedding": [0.2], "index": 1, "object": "embedding"},
                {"embedding": [0.1], "index": 0, "object": "embedding"}
            ], "model": "text-embedding-3-small"}"#,
        )
        .unwrap();

        let vectors = collect_embeddings(response, 2).unwrap();
        assert_eq!(vectors, vec![vec![0.1], vec![0.2]]);
    }

    #[test]
    fn test_collect_embeddings_count_mismatch() {
        let response = EmbeddingResponse { data: Vec::new() };
        assert!(matches!(
            collect_embeddings(response, 1),
            Err(Error::EmbeddingProvider(_))
        ));
    }

    #[test]
    fn test_first_message() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_message(response).unwrap(), "Hello");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(first_message(empty), Err(Error::CompletionProvider(_))));
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let result = OpenAiClient::new(OpenAiConfig::new("  "));
        assert!(matches!(result, Err(Error::Authentication(_))));
    }

    #[tokio::test]
    async fn test_empty_text_rejected_before_request() {
        let client = OpenAiClient::new(OpenAiConfig::new("sk-test")).unwrap();
        let result = client.embed("   ").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let mut config = OpenAiConfig::new("sk-test");
        config.base_url = "http://127.0.0.1:9".to_string();
        config.request_timeout = Duration::from_secs(5);
        let client = OpenAiClient::new(config).unwrap().with_retry(RetryConfig {
            max_attempts: 1,
            ..Default::default()
        });

        let result = client.embed("hello").await;
        assert!(matches!(result, Err(Error::Network(_)) | Err(Error::Timeout(_))));
    }
}

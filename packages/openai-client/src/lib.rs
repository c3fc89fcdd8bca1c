//! OpenAI-compatible chat completions client
//!
//! A small client for `/chat/completions` endpoints (OpenAI, Ollama, vLLM,
//! LiteLLM gateways) with no domain-specific logic. Supports plain
//! completions, structured outputs, declared tools and SSE streaming with
//! tool-call reassembly.
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::{OpenAIClient, ChatRequest, Message};
//!
//! let client = OpenAIClient::new(api_key).with_base_url("https://llm.example.org/v1");
//!
//! let response = client
//!     .chat_completion(ChatRequest::new("mistral-small").message(Message::user("Bonjour")))
//!     .await?;
//! ```
//!
//! # Structured Output
//!
//! [`StructuredOutput`] derives a strict schema from a `JsonSchema` type, to
//! pass to [`ChatRequest::json_schema`]; [`strip_code_blocks`] cleans the
//! answer before deserializing it.

pub mod accumulator;
pub mod error;
pub mod schema;
pub mod streaming;
pub mod tool;
pub mod types;

pub use accumulator::StreamToolAccumulator;
pub use error::{OpenAIError, Result};
pub use schema::StructuredOutput;
pub use streaming::{ChatCompletionChunk, ChatCompletionStream};
pub use tool::{StreamFunctionCall, StreamToolCall, ToolCall, ToolDefinition, ToolSpec};
pub use types::*;

use reqwest::{header, Client, Response};
use tracing::{debug, warn};

/// Chat completions client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| OpenAIError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (gateways, self-hosted servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn post(&self, body: &serde_json::Value) -> Result<Response> {
        let response = self
            .http_client
            .post(self.completions_url())
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Chat completions request failed");
                OpenAIError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %message, "Chat completions API error");
            return Err(OpenAIError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    fn to_body(request: &ChatRequest) -> Result<serde_json::Value> {
        serde_json::to_value(request)
            .map_err(|e| OpenAIError::Parse(format!("Failed to serialize request: {}", e)))
    }

    /// Chat completion.
    ///
    /// Returns the assistant content and any tool calls it proposed.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();
        let body = Self::to_body(&request)?;

        let raw: types::ChatResponseRaw = self
            .post(&body)
            .await?
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))?;

        let message = raw
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(OpenAIError::empty_response)?;

        let tool_calls = message
            .tool_calls
            .iter()
            .filter_map(ToolCall::from_openai_value)
            .collect::<Vec<_>>();

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            tool_calls = tool_calls.len(),
            "Chat completion"
        );

        Ok(ChatResponse {
            content: message.content.unwrap_or_default(),
            tool_calls,
            usage: raw.usage,
        })
    }

    /// Streaming chat completion.
    ///
    /// Sends the request with `stream: true` and returns the parsed SSE chunks.
    pub async fn chat_completion_stream(&self, request: ChatRequest) -> Result<ChatCompletionStream> {
        let mut body = Self::to_body(&request)?;
        body["stream"] = serde_json::Value::Bool(true);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "Opening chat completion stream"
        );

        let response = self.post(&body).await?;
        Ok(ChatCompletionStream::new(response.bytes_stream()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = OpenAIClient::new("sk-test").with_base_url("https://llm.example.org/v1/");

        assert_eq!(client.api_key, "sk-test");
        assert_eq!(client.base_url(), "https://llm.example.org/v1");
        assert_eq!(
            client.completions_url(),
            "https://llm.example.org/v1/chat/completions"
        );
    }

    #[test]
    fn test_error_kind() {
        let err = OpenAIError::Api {
            status: 429,
            message: "rate limited".into(),
        };
        assert_eq!(err.kind(), "OpenAIError::Api");
        assert_eq!(err.to_string(), "API error (429): rate limited");
    }
}

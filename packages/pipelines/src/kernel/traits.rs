// Trait definitions for dependency injection
//
// Infrastructure only: which prompt to send and what to do with the answer
// lives in the domain pipelines.
//
// Naming convention: Base* for trait names (e.g., BaseLLM)

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use openai_client::{Message, ToolCall, ToolDefinition};

// =============================================================================
// LLM Trait (Infrastructure - chat completion endpoint)
// =============================================================================

/// One increment of a streamed answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmDelta {
    /// Text fragment to forward as-is
    Text(String),
    /// Complete tool calls proposed by the model, reassembled from fragments
    ToolCalls(Vec<ToolCall>),
}

/// Lazy answer sequence. Ends after the first `Err`.
pub type LlmStream = BoxStream<'static, Result<LlmDelta>>;

#[async_trait]
pub trait BaseLLM: Send + Sync {
    /// Single completion, returns the assistant text
    async fn complete(&self, model: &str, messages: Vec<Message>) -> Result<String>;

    /// Completion constrained by a JSON schema
    /// Returns the raw JSON string; parse with `kernel::extract` or serde_json
    async fn generate_structured(
        &self,
        model: &str,
        messages: Vec<Message>,
        schema_name: &str,
        schema: serde_json::Value,
    ) -> Result<String>;

    /// Streamed completion with declared tools (possibly none)
    async fn stream(
        &self,
        model: &str,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
    ) -> Result<LlmStream>;
}

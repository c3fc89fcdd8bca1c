// LLM implementation over an OpenAI-compatible endpoint
//
// This is the infrastructure implementation of BaseLLM.
// Every call runs at temperature 0.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use openai_client::{ChatRequest, Message, OpenAIClient, StreamToolAccumulator, ToolDefinition};

use super::{BaseLLM, LlmDelta, LlmStream};
use crate::config::{Valve, Valves};

#[derive(Clone)]
pub struct OpenAICompatibleLLM {
    client: OpenAIClient,
}

impl OpenAICompatibleLLM {
    pub fn new(client: OpenAIClient) -> Self {
        Self { client }
    }

    /// Client for the endpoint and key named by the valves. An unset endpoint
    /// keeps the client default; pipelines refuse to run before calling it.
    pub fn from_valves(valves: &Valves) -> Self {
        let mut client = OpenAIClient::new(valves.api_key.clone());
        if valves.is_set(Valve::Endpoint) {
            client = client.with_base_url(valves.endpoint.trim());
        }
        Self::new(client)
    }

    fn request(model: &str, messages: Vec<Message>) -> ChatRequest {
        ChatRequest::new(model).messages(messages).temperature(0.0)
    }
}

#[async_trait]
impl BaseLLM for OpenAICompatibleLLM {
    async fn complete(&self, model: &str, messages: Vec<Message>) -> Result<String> {
        tracing::debug!(model, messages = messages.len(), "Calling chat completion");

        let response = self
            .client
            .chat_completion(Self::request(model, messages))
            .await
            .context("Chat completion failed")?;

        tracing::debug!(
            model,
            response_length = response.content.len(),
            "Chat completion received"
        );

        Ok(response.content)
    }

    async fn generate_structured(
        &self,
        model: &str,
        messages: Vec<Message>,
        schema_name: &str,
        schema: serde_json::Value,
    ) -> Result<String> {
        tracing::debug!(model, schema = schema_name, "Calling structured completion");

        let request = Self::request(model, messages).json_schema(schema_name, schema);
        let response = self
            .client
            .chat_completion(request)
            .await
            .with_context(|| format!("Structured completion {} failed", schema_name))?;

        Ok(response.content)
    }

    async fn stream(
        &self,
        model: &str,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
    ) -> Result<LlmStream> {
        let mut request = Self::request(model, messages);
        for tool in &tools {
            request = request.tool(tool);
        }

        let mut chunks = self.client.chat_completion_stream(request).await?;
        let model = model.to_string();

        let stream = async_stream::stream! {
            let mut accumulator = StreamToolAccumulator::new();

            while let Some(chunk) = chunks.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        tracing::warn!(model = %model, error = %e, "Completion stream failed");
                        yield Err(anyhow::Error::from(e));
                        return;
                    }
                };

                if !chunk.tool_calls.is_empty() {
                    accumulator.process_chunk(&chunk.tool_calls);
                }
                if !chunk.delta.is_empty() {
                    yield Ok(LlmDelta::Text(chunk.delta));
                }
                if chunk.done {
                    break;
                }
            }

            if !accumulator.is_empty() {
                let calls = accumulator.into_tool_calls();
                tracing::debug!(model = %model, tool_calls = calls.len(), "Stream proposed tool calls");
                yield Ok(LlmDelta::ToolCalls(calls));
            }
        };

        Ok(Box::pin(stream))
    }
}

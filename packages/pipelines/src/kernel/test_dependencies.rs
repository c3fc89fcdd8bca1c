// Mock implementations for testing
//
// Scripted LLM answers, consumed in order, with every call recorded so tests
// can assert on which model saw which prompt.

use anyhow::Result;
use async_trait::async_trait;
use futures::stream;
use openai_client::{Message, OpenAIError, ToolCall, ToolDefinition};
use std::sync::{Arc, Mutex};

use super::{BaseLLM, LlmDelta, LlmStream};

// =============================================================================
// Mock LLM
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmCallKind {
    Complete,
    Structured,
    Stream,
}

/// Arguments captured from one LLM call
#[derive(Debug, Clone)]
pub struct LlmCall {
    pub kind: LlmCallKind,
    pub model: String,
    pub messages: Vec<Message>,
    /// Structured schema name, or declared tool names for streams
    pub schema_or_tools: Vec<String>,
}

impl LlmCall {
    /// Every message content joined, for `contains` checks.
    pub fn prompt_text(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One scripted stream: deltas, then optionally a failure.
#[derive(Debug, Clone, Default)]
struct StreamScript {
    deltas: Vec<LlmDelta>,
    failure: Option<String>,
}

pub struct MockLLM {
    completions: Arc<Mutex<Vec<String>>>,
    structured: Arc<Mutex<Vec<String>>>,
    streams: Arc<Mutex<Vec<StreamScript>>>,
    calls: Arc<Mutex<Vec<LlmCall>>>,
}

impl MockLLM {
    pub fn new() -> Self {
        Self {
            completions: Arc::new(Mutex::new(Vec::new())),
            structured: Arc::new(Mutex::new(Vec::new())),
            streams: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a plain completion answer
    pub fn with_completion(self, response: impl Into<String>) -> Self {
        self.completions.lock().unwrap().push(response.into());
        self
    }

    /// Queue a structured answer (will be serialized)
    pub fn with_structured<T: serde::Serialize>(self, data: &T) -> Self {
        let json = serde_json::to_string(data).expect("Failed to serialize mock response");
        self.structured.lock().unwrap().push(json);
        self
    }

    /// Queue a raw structured answer, possibly invalid JSON
    pub fn with_raw_structured(self, raw: impl Into<String>) -> Self {
        self.structured.lock().unwrap().push(raw.into());
        self
    }

    /// Queue a stream yielding the given text fragments
    pub fn with_text_stream(self, fragments: &[&str]) -> Self {
        let deltas = fragments
            .iter()
            .map(|f| LlmDelta::Text(f.to_string()))
            .collect();
        self.with_stream(deltas)
    }

    /// Queue a stream that ends with one tool call
    pub fn with_tool_call_stream(self, fragments: &[&str], name: &str, arguments: &str) -> Self {
        let mut deltas: Vec<LlmDelta> = fragments
            .iter()
            .map(|f| LlmDelta::Text(f.to_string()))
            .collect();
        deltas.push(LlmDelta::ToolCalls(vec![ToolCall {
            id: "call_0".to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }]));
        self.with_stream(deltas)
    }

    /// Queue an arbitrary stream
    pub fn with_stream(self, deltas: Vec<LlmDelta>) -> Self {
        self.streams.lock().unwrap().push(StreamScript {
            deltas,
            failure: None,
        });
        self
    }

    /// Queue a stream that yields the fragments then fails with a network error
    pub fn with_failing_stream(self, fragments: &[&str], error: &str) -> Self {
        let deltas = fragments
            .iter()
            .map(|f| LlmDelta::Text(f.to_string()))
            .collect();
        self.streams.lock().unwrap().push(StreamScript {
            deltas,
            failure: Some(error.to_string()),
        });
        self
    }

    /// Get all calls, in order
    pub fn calls(&self) -> Vec<LlmCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Get the calls of one kind
    pub fn calls_of(&self, kind: LlmCallKind) -> Vec<LlmCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.kind == kind)
            .cloned()
            .collect()
    }

    /// Get the number of calls made
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Check if any prompt contained the given text
    pub fn was_called_with(&self, text: &str) -> bool {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.prompt_text().contains(text))
    }

    fn record(&self, kind: LlmCallKind, model: &str, messages: Vec<Message>, extra: Vec<String>) {
        self.calls.lock().unwrap().push(LlmCall {
            kind,
            model: model.to_string(),
            messages,
            schema_or_tools: extra,
        });
    }
}

impl Default for MockLLM {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseLLM for MockLLM {
    async fn complete(&self, model: &str, messages: Vec<Message>) -> Result<String> {
        self.record(LlmCallKind::Complete, model, messages, Vec::new());

        let mut responses = self.completions.lock().unwrap();
        if !responses.is_empty() {
            Ok(responses.remove(0))
        } else {
            Ok("Mock LLM response".to_string())
        }
    }

    async fn generate_structured(
        &self,
        model: &str,
        messages: Vec<Message>,
        schema_name: &str,
        _schema: serde_json::Value,
    ) -> Result<String> {
        self.record(
            LlmCallKind::Structured,
            model,
            messages,
            vec![schema_name.to_string()],
        );

        let mut responses = self.structured.lock().unwrap();
        if !responses.is_empty() {
            Ok(responses.remove(0))
        } else {
            Err(OpenAIError::Parse(format!("no scripted {} response", schema_name)).into())
        }
    }

    async fn stream(
        &self,
        model: &str,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
    ) -> Result<LlmStream> {
        let tool_names = tools.into_iter().map(|t| t.name).collect();
        self.record(LlmCallKind::Stream, model, messages, tool_names);

        let script = {
            let mut streams = self.streams.lock().unwrap();
            if streams.is_empty() {
                StreamScript {
                    deltas: vec![LlmDelta::Text("Mock LLM response".to_string())],
                    failure: None,
                }
            } else {
                streams.remove(0)
            }
        };

        let mut items: Vec<Result<LlmDelta>> = script.deltas.into_iter().map(Ok).collect();
        if let Some(message) = script.failure {
            items.push(Err(OpenAIError::Network(message).into()));
        }

        Ok(Box::pin(stream::iter(items)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_mock_streams_are_consumed_in_order() {
        let llm = MockLLM::new()
            .with_text_stream(&["a", "b"])
            .with_failing_stream(&["c"], "reset");

        let first: Vec<_> = llm.stream("m", vec![], vec![]).await.unwrap().collect().await;
        assert_eq!(first.len(), 2);

        let second: Vec<_> = llm.stream("m", vec![], vec![]).await.unwrap().collect().await;
        assert!(second[0].is_ok());
        assert!(second[1].is_err());

        assert_eq!(llm.calls_of(LlmCallKind::Stream).len(), 2);
    }

    #[tokio::test]
    async fn test_unscripted_structured_call_fails() {
        let llm = MockLLM::new();
        let result = llm
            .generate_structured("m", vec![Message::user("x")], "KW", serde_json::json!({}))
            .await;
        assert!(result.is_err());
        assert!(llm.was_called_with("x"));
    }
}

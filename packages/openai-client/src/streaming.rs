//! SSE streaming parser for chat completions.
//!
//! Converts a raw `reqwest` byte stream into `ChatCompletionChunk` values.
//! Handles `data: [DONE]`, partial lines, multi-byte characters split across
//! network reads, and tool-call deltas.

use bytes::Bytes;
use futures::stream::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::OpenAIError;
use crate::tool::StreamToolCall;

/// A single chunk from a streaming chat completion.
#[derive(Debug, Clone, Default)]
pub struct ChatCompletionChunk {
    /// The text delta for this chunk.
    pub delta: String,
    /// Tool call fragments carried by this chunk.
    pub tool_calls: Vec<StreamToolCall>,
    /// Finish reason reported on the last content chunk.
    pub finish_reason: Option<String>,
    /// Whether the stream is done.
    pub done: bool,
}

/// Raw streaming chunk from the API.
#[derive(Debug, serde::Deserialize)]
struct StreamChunkRaw {
    #[serde(default)]
    choices: Vec<StreamChoiceRaw>,
}

#[derive(Debug, serde::Deserialize)]
struct StreamChoiceRaw {
    #[serde(default)]
    delta: Option<DeltaRaw>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct DeltaRaw {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<StreamToolCall>>,
}

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Stream adapter that converts raw SSE bytes into `ChatCompletionChunk` values.
pub struct ChatCompletionStream {
    inner: ByteStream,
    pending: Vec<u8>,
    buffer: String,
    finished: bool,
}

impl ChatCompletionStream {
    pub(crate) fn new(
        byte_stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            pending: Vec::new(),
            buffer: String::new(),
            finished: false,
        }
    }

    /// Move every complete UTF-8 prefix of `pending` into the line buffer.
    fn absorb(&mut self, bytes: &[u8]) -> Result<(), OpenAIError> {
        self.pending.extend_from_slice(bytes);
        match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                self.buffer.push_str(text);
                self.pending.clear();
                Ok(())
            }
            Err(e) if e.error_len().is_none() => {
                // Incomplete trailing sequence: keep it for the next read.
                let valid = e.valid_up_to();
                let text = std::str::from_utf8(&self.pending[..valid])
                    .map_err(|e| OpenAIError::Parse(format!("Invalid UTF-8 in stream: {}", e)))?;
                self.buffer.push_str(text);
                self.pending.drain(..valid);
                Ok(())
            }
            Err(e) => Err(OpenAIError::Parse(format!("Invalid UTF-8 in stream: {}", e))),
        }
    }
}

impl Stream for ChatCompletionStream {
    type Item = Result<ChatCompletionChunk, OpenAIError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.finished {
            return Poll::Ready(None);
        }

        loop {
            if let Some(chunk) = try_parse_line(&mut this.buffer) {
                if matches!(&chunk, Ok(c) if c.done) {
                    this.finished = true;
                }
                return Poll::Ready(Some(chunk));
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    if let Err(e) = this.absorb(&bytes) {
                        this.finished = true;
                        return Poll::Ready(Some(Err(e)));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(OpenAIError::Network(e.to_string()))));
                }
                Poll::Ready(None) => {
                    this.finished = true;
                    // Servers may omit the final newline.
                    if !this.buffer.trim().is_empty() {
                        this.buffer.push('\n');
                        if let Some(chunk) = try_parse_line(&mut this.buffer) {
                            return Poll::Ready(Some(chunk));
                        }
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Try to extract and parse a complete SSE line from the buffer.
/// Returns `None` if no complete data line is available yet.
fn try_parse_line(buffer: &mut String) -> Option<Result<ChatCompletionChunk, OpenAIError>> {
    loop {
        let newline_pos = buffer.find('\n')?;
        let line = buffer[..newline_pos].trim().to_string();
        buffer.drain(..=newline_pos);

        if line.is_empty() {
            continue;
        }

        // Skip non-data lines ("event:", "id:", "retry:", ": keep-alive")
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();

        if data == "[DONE]" {
            return Some(Ok(ChatCompletionChunk {
                done: true,
                ..Default::default()
            }));
        }

        return Some(parse_data(data));
    }
}

fn parse_data(data: &str) -> Result<ChatCompletionChunk, OpenAIError> {
    let raw: StreamChunkRaw = serde_json::from_str(data).map_err(|e| {
        let end = data
            .char_indices()
            .nth(200)
            .map(|(i, _)| i)
            .unwrap_or(data.len());
        OpenAIError::Parse(format!(
            "Failed to parse stream chunk: {} (data: {})",
            e,
            &data[..end]
        ))
    })?;

    let Some(choice) = raw.choices.into_iter().next() else {
        // Usage-only trailer chunks carry no choices.
        return Ok(ChatCompletionChunk::default());
    };
    let delta = choice.delta.unwrap_or_default();

    Ok(ChatCompletionChunk {
        delta: delta.content.unwrap_or_default(),
        tool_calls: delta.tool_calls.unwrap_or_default(),
        finish_reason: choice.finish_reason,
        done: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::StreamToolAccumulator;
    use futures::StreamExt;

    fn make_sse_bytes(lines: &[&str]) -> Vec<Result<Bytes, reqwest::Error>> {
        lines
            .iter()
            .map(|line| Ok(Bytes::from(format!("{}\n", line))))
            .collect()
    }

    #[tokio::test]
    async fn test_parse_text_chunks() {
        let data = make_sse_bytes(&[
            r#"data: {"choices":[{"delta":{"content":"Bonjour"}}]}"#,
            "",
            r#"data: {"choices":[{"delta":{"content":" !"},"finish_reason":"stop"}]}"#,
            "",
            "data: [DONE]",
        ]);

        let mut stream = ChatCompletionStream::new(futures::stream::iter(data));

        let c1 = stream.next().await.unwrap().unwrap();
        assert_eq!(c1.delta, "Bonjour");

        let c2 = stream.next().await.unwrap().unwrap();
        assert_eq!(c2.delta, " !");
        assert_eq!(c2.finish_reason.as_deref(), Some("stop"));

        let done = stream.next().await.unwrap().unwrap();
        assert!(done.done);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_tool_call_fragments() {
        let data = make_sse_bytes(&[
            r#"data: {"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_9","type":"function","function":{"name":"analyze_documents","arguments":"{\"information"}}]}}]}"#,
            r#"data: {"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"_request\":\"dates\"}"}}]}}]}"#,
            "data: [DONE]",
        ]);

        let mut stream = ChatCompletionStream::new(futures::stream::iter(data));
        let mut acc = StreamToolAccumulator::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.unwrap();
            acc.process_chunk(&chunk.tool_calls);
        }

        let calls = acc.into_tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "analyze_documents");
        assert_eq!(calls[0].arguments, r#"{"information_request":"dates"}"#);
    }

    #[tokio::test]
    async fn test_multibyte_split_across_reads() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"é\"}}]}\n".as_bytes();
        let split = line.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let data: Vec<Result<Bytes, reqwest::Error>> = vec![
            Ok(Bytes::copy_from_slice(&line[..split])),
            Ok(Bytes::copy_from_slice(&line[split..])),
        ];

        let mut stream = ChatCompletionStream::new(futures::stream::iter(data));
        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(chunk.delta, "é");
    }

    #[tokio::test]
    async fn test_missing_trailing_newline() {
        let data: Vec<Result<Bytes, reqwest::Error>> = vec![Ok(Bytes::from_static(
            br#"data: {"choices":[{"delta":{"content":"fin"}}]}"#,
        ))];

        let mut stream = ChatCompletionStream::new(futures::stream::iter(data));
        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(chunk.delta, "fin");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_invalid_json_is_error() {
        let data = make_sse_bytes(&["data: {not json"]);
        let mut stream = ChatCompletionStream::new(futures::stream::iter(data));
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, OpenAIError::Parse(_)));
    }
}

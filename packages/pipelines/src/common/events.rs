//! Items of a pipeline's output sequence.

use serde_json::{json, Value};

/// One item yielded by a streaming pipeline: a text fragment for the user,
/// or a status record for the host's progress indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipeEvent {
    Text(String),
    Status { description: String, done: bool },
}

impl PipeEvent {
    pub fn text(fragment: impl Into<String>) -> Self {
        PipeEvent::Text(fragment.into())
    }

    /// An in-progress status line.
    pub fn status(description: impl Into<String>) -> Self {
        PipeEvent::Status {
            description: description.into(),
            done: false,
        }
    }

    /// Clears the progress indicator.
    pub fn status_done() -> Self {
        PipeEvent::Status {
            description: String::new(),
            done: true,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PipeEvent::Text(text) => Some(text),
            PipeEvent::Status { .. } => None,
        }
    }

    /// Host wire shape: text as a JSON string, status as
    /// `{"event":{"type":"status","data":{"description":..,"done":..}}}`.
    pub fn to_value(&self) -> Value {
        match self {
            PipeEvent::Text(text) => Value::String(text.clone()),
            PipeEvent::Status { description, done } => json!({
                "event": {
                    "type": "status",
                    "data": { "description": description, "done": done }
                }
            }),
        }
    }
}

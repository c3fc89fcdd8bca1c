//! Chat completions endpoint.
//!
//! POST /v1/chat/completions
//!
//! The requested `model` names the pipeline. Streamed turns are sent as SSE
//! `chat.completion.chunk` records; status events are forwarded as their raw
//! JSON records so the host can drive its progress indicator. The stream
//! ends with `data: [DONE]`.

use std::convert::Infallible;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::{json, Value};

use crate::common::{PipeBody, PipeEvent, PipeInput};
use crate::server::app::AppState;

#[derive(Serialize)]
pub struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
pub struct ErrorBody {
    message: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Identity shared by every record of one completion.
struct Completion {
    id: String,
    created: i64,
    model: String,
}

impl Completion {
    fn new(model: &str) -> Self {
        Self {
            id: format!("chatcmpl-{}", uuid::Uuid::new_v4().simple()),
            created: chrono::Utc::now().timestamp(),
            model: model.to_string(),
        }
    }

    fn chunk(&self, delta: Value, finish_reason: Option<&str>) -> Value {
        json!({
            "id": self.id,
            "object": "chat.completion.chunk",
            "created": self.created,
            "model": self.model,
            "choices": [{ "index": 0, "delta": delta, "finish_reason": finish_reason }]
        })
    }

    fn event_record(&self, event: &PipeEvent) -> Value {
        match event {
            PipeEvent::Text(text) => self.chunk(json!({ "content": text }), None),
            PipeEvent::Status { .. } => event.to_value(),
        }
    }

    fn full(&self, content: String) -> Value {
        json!({
            "id": self.id,
            "object": "chat.completion",
            "created": self.created,
            "model": self.model,
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }
}

fn sse_data(value: &Value) -> Option<Result<Event, Infallible>> {
    Event::default().json_data(value).ok().map(Ok)
}

pub async fn chat_completions_handler(
    Extension(state): Extension<AppState>,
    Json(body): Json<PipeBody>,
) -> Response {
    let Some(pipeline) = state.registry.get(&body.model) else {
        tracing::warn!(model = %body.model, "Unknown pipeline requested");
        let error = ErrorResponse {
            error: ErrorBody {
                message: format!("Unknown model: {}", body.model),
                kind: "not_found",
            },
        };
        return (StatusCode::NOT_FOUND, Json(error)).into_response();
    };

    let completion = Completion::new(&body.model);
    let streaming = body.stream;

    tracing::info!(
        pipeline = pipeline.id(),
        messages = body.messages.len(),
        stream = streaming,
        "Chat turn"
    );

    let output = pipeline.pipe(PipeInput::from_body(body)).await;

    if !streaming {
        let content = output.collect_text().await;
        return Json(completion.full(content)).into_response();
    }

    let last = completion.chunk(json!({}), Some("stop"));
    let events = output
        .into_stream()
        .filter_map(move |event| {
            let record = sse_data(&completion.event_record(&event));
            async move { record }
        })
        .chain(stream::iter(
            [sse_data(&last), Some(Ok(Event::default().data("[DONE]")))]
                .into_iter()
                .flatten(),
        ));

    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}

use axum::{extract::Extension, Json};
use serde::Serialize;

use crate::server::app::AppState;

#[derive(Serialize)]
pub struct ModelList {
    object: &'static str,
    data: Vec<ModelEntry>,
}

#[derive(Serialize)]
pub struct ModelEntry {
    id: String,
    name: String,
    object: &'static str,
    owned_by: &'static str,
}

/// OpenAI-style model list: one entry per registered pipeline.
pub async fn models_handler(Extension(state): Extension<AppState>) -> Json<ModelList> {
    let data = state
        .registry
        .iter()
        .map(|p| ModelEntry {
            id: p.id().to_string(),
            name: p.name().to_string(),
            object: "model",
            owned_by: "pipelines",
        })
        .collect();

    Json(ModelList {
        object: "list",
        data,
    })
}

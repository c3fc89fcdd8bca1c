//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use keyword_db::KeywordStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Valves;
use crate::domains::document_analysis::DocumentAnalyzer;
use crate::domains::helpdesk::Helpdesk;
use crate::kernel::BaseLLM;
use crate::pipeline::PipelineRegistry;
use crate::server::routes::{chat_completions_handler, health_handler, models_handler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<PipelineRegistry>,
}

/// Register every pipeline on one LLM backend and one knowledge base.
pub fn build_registry(
    llm: Arc<dyn BaseLLM>,
    knowledge: Arc<dyn KeywordStore>,
    valves: &Valves,
) -> PipelineRegistry {
    PipelineRegistry::new()
        .register(Arc::new(DocumentAnalyzer::new(llm.clone(), valves.clone())))
        .register(Arc::new(Helpdesk::new(llm, knowledge, valves.clone())))
}

/// Build the Axum application router
pub fn build_app(registry: PipelineRegistry) -> Router {
    let state = AppState {
        registry: Arc::new(registry),
    };

    // CORS configuration - the chat front-end runs on its own origin
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/models", get(models_handler))
        .route("/v1/chat/completions", post(chat_completions_handler))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

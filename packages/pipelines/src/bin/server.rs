//! Pipelines HTTP server
//!
//! Serves the registered pipelines as chat-completion models for the host.

use std::sync::Arc;

use anyhow::{Context, Result};
use pipelines_core::domains::helpdesk::knowledge;
use pipelines_core::kernel::OpenAICompatibleLLM;
use pipelines_core::server::{build_app, build_registry};
use pipelines_core::ServerConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pipelines_core=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting pipelines server");

    let config = ServerConfig::from_env().context("Failed to load configuration")?;

    tracing::info!("Valves:");
    for (name, value) in config.valves.masked() {
        tracing::info!("  {}: {}", name, value);
    }

    let knowledge = knowledge::load(config.knowledge_base_path.as_deref())?;
    let llm = Arc::new(OpenAICompatibleLLM::from_valves(&config.valves));
    let registry = build_registry(llm, knowledge, &config.valves);
    let app = build_app(registry);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(address = %addr, "Pipelines server listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

//! The contract between the host and a pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use indexmap::IndexMap;

use crate::common::{PipeEvent, PipeInput};

/// Lazy, finite, non-restartable sequence of output events.
pub type PipeStream = BoxStream<'static, PipeEvent>;

/// What a turn produces: a fixed answer, or a stream to forward.
pub enum PipeOutput {
    Text(String),
    Stream(PipeStream),
}

impl PipeOutput {
    pub fn text(text: impl Into<String>) -> Self {
        PipeOutput::Text(text.into())
    }

    /// View any output as a stream; a fixed answer becomes one text event.
    pub fn into_stream(self) -> PipeStream {
        match self {
            PipeOutput::Text(text) => Box::pin(stream::once(async move { PipeEvent::Text(text) })),
            PipeOutput::Stream(stream) => stream,
        }
    }

    /// Drain the output and concatenate its text, dropping status events.
    pub async fn collect_text(self) -> String {
        match self {
            PipeOutput::Text(text) => text,
            PipeOutput::Stream(stream) => {
                stream
                    .filter_map(|event| async move {
                        match event {
                            PipeEvent::Text(text) => Some(text),
                            PipeEvent::Status { .. } => None,
                        }
                    })
                    .collect::<Vec<_>>()
                    .await
                    .concat()
            }
        }
    }

    /// Drain the output, keeping every event.
    pub async fn collect_events(self) -> Vec<PipeEvent> {
        self.into_stream().collect().await
    }
}

impl std::fmt::Debug for PipeOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipeOutput::Text(text) => f.debug_tuple("Text").field(text).finish(),
            PipeOutput::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Identifier the host routes on (the requested model id)
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Process one turn. Never fails: problems become user-visible text.
    async fn pipe(&self, input: PipeInput) -> PipeOutput;
}

/// Registered pipelines, in registration order.
#[derive(Default, Clone)]
pub struct PipelineRegistry {
    pipelines: IndexMap<String, Arc<dyn Pipeline>>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pipeline under its id, replacing any previous one.
    pub fn register(mut self, pipeline: Arc<dyn Pipeline>) -> Self {
        tracing::info!(id = pipeline.id(), name = pipeline.name(), "Registered pipeline");
        self.pipelines.insert(pipeline.id().to_string(), pipeline);
        self
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Pipeline>> {
        self.pipelines.get(id).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Pipeline>> {
        self.pipelines.values()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.pipelines.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Pipeline for Echo {
        fn id(&self) -> &str {
            "echo"
        }

        fn name(&self) -> &str {
            "Echo"
        }

        async fn pipe(&self, input: PipeInput) -> PipeOutput {
            let events = vec![
                PipeEvent::status("working"),
                PipeEvent::text(input.user_message.clone()),
                PipeEvent::text("!"),
                PipeEvent::status_done(),
            ];
            PipeOutput::Stream(Box::pin(stream::iter(events)))
        }
    }

    #[tokio::test]
    async fn test_collect_text_skips_status() {
        let input = PipeInput {
            user_message: "salut".into(),
            ..Default::default()
        };
        assert_eq!(Echo.pipe(input).await.collect_text().await, "salut!");
    }

    #[tokio::test]
    async fn test_text_output_as_stream() {
        let events = PipeOutput::text("fixe").collect_events().await;
        assert_eq!(events, vec![PipeEvent::text("fixe")]);
    }

    #[test]
    fn test_registry_lookup() {
        let registry = PipelineRegistry::new().register(Arc::new(Echo));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.ids(), vec!["echo"]);
        assert!(registry.get("echo").is_some());
        assert!(registry.get("other").is_none());
    }
}

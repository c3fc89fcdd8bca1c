//! Kernel module - LLM infrastructure and test doubles.

pub mod llm;
pub mod test_dependencies;
pub mod traits;

pub use llm::OpenAICompatibleLLM;
pub use test_dependencies::{LlmCall, LlmCallKind, MockLLM};
pub use traits::*;

use anyhow::{Context, Result};
use openai_client::{strip_code_blocks, Message, StructuredOutput};

/// Structured completion parsed into `T`.
///
/// The schema is generated from `T` in strict mode; code fences around the
/// answer are tolerated.
pub async fn extract<T: StructuredOutput>(
    llm: &dyn BaseLLM,
    model: &str,
    messages: Vec<Message>,
) -> Result<T> {
    let name = T::type_name();
    let raw = llm
        .generate_structured(model, messages, &name, T::openai_schema())
        .await?;

    serde_json::from_str(strip_code_blocks(&raw))
        .with_context(|| format!("Failed to parse {} response", name))
}

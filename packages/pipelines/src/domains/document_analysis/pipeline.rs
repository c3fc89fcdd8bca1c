//! Document analyzer turn.
//!
//! The turn's stage is re-derived from the history every time:
//!
//! ```text
//! awaiting-documents -> clarifying-request -> awaiting-confirmation
//!                              ^                      |
//!                              +------- (no) ---------+
//!                                                     | (yes)
//!                                       confirmed-analysis -> answered
//! ```
//!
//! Documents move the turn out of awaiting-documents; an `analyze_documents`
//! tool call out of clarifying-request; the structured confirmation check
//! decides between asking again and analyzing.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use openai_client::{Message, ToolCall, ToolSpec};
use tracing::{debug, info, warn};

use super::prompts::{make_prompt, per_document_prompt, synthesis_prompt, PromptKind};
use super::sources::documents_in;
use super::tools::{AnalyzeDocuments, AnalyzeDocumentsArgs, ConfirmationCheck};
use crate::common::{
    conversation_text, describe, HeuristicTokenCounter, PipeEvent, PipeInput, PipeMessage,
    SharedTokenCounter,
};
use crate::config::{Valve, ValveError, Valves, VALVES_REFUSAL};
use crate::domains::CONVERSATION_TOO_LONG;
use crate::kernel::{extract, BaseLLM, LlmDelta};
use crate::pipeline::{PipeOutput, PipeStream, Pipeline};

pub const PIPELINE_ID: &str = "document-analyzer";
pub const PIPELINE_NAME: &str = "Analyse de Documents";

pub const STATUS_CHECKING: &str = "Vérification des paramètres...";
pub const STATUS_ANALYZING: &str = "Analyse des Documents";
pub const STATUS_SYNTHESIS: &str = "Synthèse des Résultats";

/// Refusal for a document over the analyze limit.
pub fn document_too_long(name: &str, tokens: usize, limit: usize) -> String {
    format!(
        "\nLe document \"{}\" dépasse la limite de tokens autorisée ({} > {}). Veuillez réduire la taille du document.",
        name, tokens, limit
    )
}

/// Valve values resolved for one turn.
#[derive(Debug, Clone)]
struct Settings {
    chat_model: String,
    analyze_model: String,
    chat_limit: usize,
    analyze_limit: usize,
}

pub struct DocumentAnalyzer {
    llm: Arc<dyn BaseLLM>,
    valves: Valves,
    tokens: SharedTokenCounter,
}

impl DocumentAnalyzer {
    pub fn new(llm: Arc<dyn BaseLLM>, valves: Valves) -> Self {
        Self {
            llm,
            valves,
            tokens: Arc::new(HeuristicTokenCounter::default()),
        }
    }

    pub fn with_token_counter(mut self, tokens: SharedTokenCounter) -> Self {
        self.tokens = tokens;
        self
    }

    fn settings(&self) -> Result<Settings, ValveError> {
        self.valves.require(&Valve::ALL)?;
        Ok(Settings {
            chat_model: self.valves.model_name_chat.trim().to_string(),
            analyze_model: self.valves.model_name_analyze.trim().to_string(),
            chat_limit: self.valves.token_limit(Valve::TokenLimitChat)?,
            analyze_limit: self.valves.token_limit(Valve::TokenLimitAnalyze)?,
        })
    }
}

#[async_trait]
impl Pipeline for DocumentAnalyzer {
    fn id(&self) -> &str {
        PIPELINE_ID
    }

    fn name(&self) -> &str {
        PIPELINE_NAME
    }

    async fn pipe(&self, input: PipeInput) -> PipeOutput {
        let settings = match self.settings() {
            Ok(settings) => settings,
            Err(e) => {
                warn!(pipeline = PIPELINE_ID, error = %e, "Refusing turn");
                return PipeOutput::text(VALVES_REFUSAL);
            }
        };

        let turn = AnalyzerTurn {
            llm: self.llm.clone(),
            tokens: self.tokens.clone(),
            settings,
            messages: input.messages,
        };
        PipeOutput::Stream(turn.run())
    }
}

// =============================================================================
// Turn
// =============================================================================

struct AnalyzerTurn {
    llm: Arc<dyn BaseLLM>,
    tokens: SharedTokenCounter,
    settings: Settings,
    messages: Vec<PipeMessage>,
}

fn diagnostic(err: &anyhow::Error) -> PipeEvent {
    PipeEvent::Text(format!("\n\n{}", describe(err)))
}

impl AnalyzerTurn {
    fn run(self) -> PipeStream {
        Box::pin(async_stream::stream! {
            let conversation_tokens = self.tokens.count_text(&conversation_text(&self.messages));
            if conversation_tokens > self.settings.chat_limit {
                info!(
                    tokens = conversation_tokens,
                    limit = self.settings.chat_limit,
                    "Conversation over token limit"
                );
                yield PipeEvent::text(CONVERSATION_TOO_LONG);
                return;
            }

            let documents = documents_in(&self.messages);

            let mut oversized = false;
            for (name, content) in &documents {
                let tokens = self.tokens.count_text(content);
                debug!(document = %name, tokens, limit = self.settings.analyze_limit, "Document size");
                if tokens > self.settings.analyze_limit {
                    yield PipeEvent::Text(document_too_long(name, tokens, self.settings.analyze_limit));
                    oversized = true;
                }
            }
            if oversized {
                return;
            }

            if documents.is_empty() {
                info!(stage = "awaiting_documents", "Analyzer turn");
                let mut answer = self.forward(make_prompt(&PromptKind::AwaitingDocuments, &self.messages));
                while let Some(event) = answer.next().await {
                    yield event;
                }
                return;
            }

            // clarifying-request: forward text until the model calls the tool
            info!(stage = "clarifying_request", documents = documents.len(), "Analyzer turn");
            let prompt = make_prompt(
                &PromptKind::ClarifyingRequest { documents: documents.len() },
                &self.messages,
            );
            let mut chat = match self
                .llm
                .stream(&self.settings.chat_model, prompt, vec![AnalyzeDocuments.definition()])
                .await
            {
                Ok(chat) => chat,
                Err(e) => {
                    yield diagnostic(&e);
                    return;
                }
            };

            let mut call: Option<ToolCall> = None;
            while let Some(delta) = chat.next().await {
                match delta {
                    Ok(LlmDelta::Text(text)) => yield PipeEvent::Text(text),
                    Ok(LlmDelta::ToolCalls(calls)) => {
                        call = calls.into_iter().find(|c| c.is::<AnalyzeDocuments>());
                        if call.is_some() {
                            break;
                        }
                    }
                    Err(e) => {
                        yield diagnostic(&e);
                        return;
                    }
                }
            }
            drop(chat);

            let Some(call) = call else {
                return;
            };

            let args: AnalyzeDocumentsArgs = match call.parse_args() {
                Ok(args) => args,
                Err(e) => {
                    yield diagnostic(&anyhow::Error::from(e));
                    return;
                }
            };

            yield PipeEvent::status(STATUS_CHECKING);

            let check: ConfirmationCheck = match extract(
                self.llm.as_ref(),
                &self.settings.chat_model,
                make_prompt(&PromptKind::CheckConfirmation, &self.messages),
            )
            .await
            {
                Ok(check) => check,
                Err(e) => {
                    yield diagnostic(&e);
                    return;
                }
            };

            if !check.confirmed() {
                info!(stage = "awaiting_confirmation", "Analyzer turn");
                yield PipeEvent::status_done();
                let mut answer = self.forward(make_prompt(&PromptKind::AskForConfirmation, &self.messages));
                while let Some(event) = answer.next().await {
                    yield event;
                }
                return;
            }

            info!(
                stage = "confirmed_analysis",
                documents = documents.len(),
                request = %args.information_request,
                "Analyzer turn"
            );
            yield PipeEvent::status(STATUS_ANALYZING);

            let mut rows: Vec<(String, String)> = Vec::with_capacity(documents.len());
            for (name, content) in &documents {
                yield PipeEvent::status(format!("Analyse du document {}", name));
                match self
                    .llm
                    .complete(&self.settings.analyze_model, per_document_prompt(&args.information_request, content))
                    .await
                {
                    Ok(answer) => rows.push((name.clone(), answer)),
                    Err(e) => {
                        yield diagnostic(&e);
                        return;
                    }
                }
            }

            yield PipeEvent::status(STATUS_SYNTHESIS);
            let draft = match self
                .llm
                .complete(&self.settings.analyze_model, synthesis_prompt(&rows))
                .await
            {
                Ok(draft) => draft,
                Err(e) => {
                    yield diagnostic(&e);
                    return;
                }
            };
            debug!(draft_length = draft.len(), "Synthesis draft");

            yield PipeEvent::status_done();

            let mut answer = self.forward(make_prompt(&PromptKind::ProcessOutput { draft }, &self.messages));
            while let Some(event) = answer.next().await {
                yield event;
            }
        })
    }

    /// Stream the chat model's answer to `prompt` as text events; a failure
    /// ends the stream with a diagnostic.
    fn forward(&self, prompt: Vec<Message>) -> PipeStream {
        let llm = self.llm.clone();
        let model = self.settings.chat_model.clone();

        Box::pin(async_stream::stream! {
            let mut answer = match llm.stream(&model, prompt, Vec::new()).await {
                Ok(answer) => answer,
                Err(e) => {
                    yield diagnostic(&e);
                    return;
                }
            };

            while let Some(delta) = answer.next().await {
                match delta {
                    Ok(LlmDelta::Text(text)) => yield PipeEvent::Text(text),
                    Ok(LlmDelta::ToolCalls(_)) => {}
                    Err(e) => {
                        yield diagnostic(&e);
                        return;
                    }
                }
            }
        })
    }
}

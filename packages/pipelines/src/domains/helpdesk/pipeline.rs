//! IT helpdesk turn: keyword retrieval, streamed answer, ticket proposal.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use futures::StreamExt;
use keyword_db::KeywordStore;
use openai_client::{Message, ToolSpec};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::prompts::{
    assistant_prompt, keyword_selection_prompt, ticket_cancelled_note, ticket_correction_note,
};
use super::ticket::{validate_arguments, CreateTicket, Ticket};
use crate::common::{
    describe, dialogue, HeuristicTokenCounter, PipeEvent, PipeInput, PipeMessage, PipeRole,
    SharedTokenCounter,
};
use crate::config::{Valve, ValveError, Valves, VALVES_REFUSAL};
use crate::domains::CONVERSATION_TOO_LONG;
use crate::kernel::{extract, BaseLLM, LlmDelta};
use crate::pipeline::{PipeOutput, PipeStream, Pipeline};

pub const PIPELINE_ID: &str = "helpdesk";
pub const PIPELINE_NAME: &str = "Assistant Technique Expérimental";

pub const TICKET_PREFIX: &str = "[TICKET]";
pub const SEND_KEYWORD: &str = "envoyer";
pub const TICKET_SENT: &str = "Le ticket a été envoyé!";

/// Corrective restarts allowed after an invalid ticket, per turn.
const MAX_TICKET_CORRECTIONS: usize = 1;

const REQUIRED_VALVES: [Valve; 5] = [
    Valve::ApiKey,
    Valve::Endpoint,
    Valve::ModelNameChat,
    Valve::TokenLimitChat,
    Valve::ModelNameAnalyze,
];

/// Keywords picked by the analyze model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct KeywordSelection {
    pub keywords: Vec<String>,
}

/// Text shown when the model proposes a valid ticket.
pub fn ticket_message(ticket: &Ticket) -> serde_json::Result<String> {
    Ok(format!(
        "{} {}\n\nRépondez \"{}\" pour envoyer le ticket.",
        TICKET_PREFIX,
        serde_json::to_string_pretty(ticket)?,
        SEND_KEYWORD
    ))
}

/// Answer to a ticket proposed on the previous turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingTicket {
    /// No ticket was awaiting confirmation
    None,
    /// The user answered with the send keyword
    Confirmed,
    /// The user answered anything else
    Cancelled,
}

/// Whether an assistant answer carries a ticket proposal: a line starting
/// with `[TICKET]`, wherever it sits in the answer.
fn proposes_ticket(answer: &str) -> bool {
    answer
        .lines()
        .any(|line| line.trim_start().starts_with(TICKET_PREFIX))
}

/// Look at the last exchange: an assistant message proposing a ticket
/// followed by the user's reply.
pub fn pending_ticket(messages: &[PipeMessage]) -> PendingTicket {
    let [.., proposal, reply] = messages else {
        return PendingTicket::None;
    };

    let proposed = proposal.role == PipeRole::Assistant && proposes_ticket(&proposal.content);
    if !proposed || reply.role != PipeRole::User {
        return PendingTicket::None;
    }

    if reply.content.trim().eq_ignore_ascii_case(SEND_KEYWORD) {
        PendingTicket::Confirmed
    } else {
        PendingTicket::Cancelled
    }
}

#[derive(Debug, Clone)]
struct Settings {
    chat_model: String,
    analyze_model: String,
    chat_limit: usize,
}

pub struct Helpdesk {
    llm: Arc<dyn BaseLLM>,
    store: Arc<dyn KeywordStore>,
    valves: Valves,
    tokens: SharedTokenCounter,
}

impl Helpdesk {
    pub fn new(llm: Arc<dyn BaseLLM>, store: Arc<dyn KeywordStore>, valves: Valves) -> Self {
        Self {
            llm,
            store,
            valves,
            tokens: Arc::new(HeuristicTokenCounter::default()),
        }
    }

    pub fn with_token_counter(mut self, tokens: SharedTokenCounter) -> Self {
        self.tokens = tokens;
        self
    }

    fn settings(&self) -> Result<Settings, ValveError> {
        self.valves.require(&REQUIRED_VALVES)?;
        Ok(Settings {
            chat_model: self.valves.model_name_chat.trim().to_string(),
            analyze_model: self.valves.model_name_analyze.trim().to_string(),
            chat_limit: self.valves.token_limit(Valve::TokenLimitChat)?,
        })
    }

    /// Support notes for the conversation, picked through model-selected keywords.
    async fn knowledge(&self, model: &str, conversation: &[Message]) -> anyhow::Result<Vec<String>> {
        let prompt = keyword_selection_prompt(&self.store.keywords(), conversation);
        let selection: KeywordSelection = extract(self.llm.as_ref(), model, prompt)
            .await
            .context("Keyword selection failed")?;

        let notes = self.store.lookup(&selection.keywords);
        info!(
            keywords = ?selection.keywords,
            notes = notes.len(),
            "Selected helpdesk knowledge"
        );

        Ok(notes.into_iter().collect())
    }
}

#[async_trait]
impl Pipeline for Helpdesk {
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

        let pending = pending_ticket(&input.messages);
        if pending == PendingTicket::Confirmed {
            info!("Ticket confirmed by user");
            return PipeOutput::text(TICKET_SENT);
        }

        let conversation = dialogue(&input.body.messages);
        let text = conversation
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let tokens = self.tokens.count_text(&text);
        if tokens > settings.chat_limit {
            info!(tokens, limit = settings.chat_limit, "Conversation over token limit");
            return PipeOutput::text(CONVERSATION_TOO_LONG);
        }

        let knowledge = match self.knowledge(&settings.analyze_model, &conversation).await {
            Ok(knowledge) => knowledge,
            Err(e) => {
                warn!(error = %e, "Helpdesk turn failed before answering");
                return PipeOutput::text(format!("Erreur : {}", describe(&e)));
            }
        };

        let mut prompt = assistant_prompt(&conversation, &knowledge);
        if pending == PendingTicket::Cancelled {
            debug!("Ticket not confirmed, telling the model");
            prompt.push(ticket_cancelled_note());
        }

        let turn = HelpdeskTurn {
            llm: self.llm.clone(),
            model: settings.chat_model,
            prompt,
        };
        PipeOutput::Stream(turn.run())
    }
}

// =============================================================================
// Turn
// =============================================================================

struct HelpdeskTurn {
    llm: Arc<dyn BaseLLM>,
    model: String,
    prompt: Vec<Message>,
}

fn stream_error(err: &anyhow::Error) -> PipeEvent {
    PipeEvent::Text(format!("Erreur : {}", describe(err)))
}

impl HelpdeskTurn {
    fn run(self) -> PipeStream {
        Box::pin(async_stream::stream! {
            let HelpdeskTurn { llm, model, mut prompt } = self;
            let tools = vec![CreateTicket.definition()];
            let mut corrections = 0;
            // the proposal must open a line for the next turn to find it
            let mut at_line_start = true;

            loop {
                let mut answer = match llm.stream(&model, prompt.clone(), tools.clone()).await {
                    Ok(answer) => answer,
                    Err(e) => {
                        yield stream_error(&e);
                        return;
                    }
                };

                let mut restart = false;
                while let Some(delta) = answer.next().await {
                    let calls = match delta {
                        Ok(LlmDelta::Text(text)) => {
                            if !text.is_empty() {
                                at_line_start = text.ends_with('\n');
                            }
                            yield PipeEvent::Text(text);
                            continue;
                        }
                        Ok(LlmDelta::ToolCalls(calls)) => calls,
                        Err(e) => {
                            yield stream_error(&e);
                            return;
                        }
                    };

                    let Some(call) = calls.into_iter().find(|c| c.is::<CreateTicket>()) else {
                        continue;
                    };

                    match validate_arguments(&call.arguments) {
                        Ok(ticket) => match ticket_message(&ticket) {
                            Ok(message) => {
                                info!(site = ?ticket.site, "Ticket proposed");
                                if at_line_start {
                                    yield PipeEvent::Text(message);
                                } else {
                                    yield PipeEvent::Text(format!("\n\n{}", message));
                                }
                            }
                            Err(e) => {
                                yield stream_error(&anyhow::Error::from(e));
                                return;
                            }
                        },
                        Err(invalid) => {
                            warn!(
                                fields = ?invalid.fields(),
                                corrections,
                                "Invalid ticket proposed"
                            );
                            yield PipeEvent::Text(format!(
                                "Erreur lors de la création du ticket : {}\n\n",
                                invalid
                            ));
                            at_line_start = true;
                            if corrections >= MAX_TICKET_CORRECTIONS {
                                return;
                            }
                            corrections += 1;
                            prompt.push(ticket_correction_note(&invalid.issues));
                            restart = true;
                            break;
                        }
                    }
                }

                if !restart {
                    return;
                }
            }
        })
    }
}

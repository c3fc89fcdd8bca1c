//! Conversation snapshot handed to a pipeline by the host.

use openai_client::Message;
use serde::{Deserialize, Serialize};

/// Role of a host message. Roles the pipelines do not know (tool results and
/// the like) are kept as `Other` and never forwarded to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipeRole {
    System,
    User,
    Assistant,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipeMessage {
    pub role: PipeRole,
    #[serde(default)]
    pub content: String,
}

impl PipeMessage {
    pub fn new(role: PipeRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(PipeRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(PipeRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(PipeRole::Assistant, content)
    }

    pub fn is_system(&self) -> bool {
        self.role == PipeRole::System
    }

    /// Model message for user and assistant turns; `None` otherwise.
    pub fn to_dialogue_message(&self) -> Option<Message> {
        match self.role {
            PipeRole::User => Some(Message::user(self.content.clone())),
            PipeRole::Assistant => Some(Message::assistant(self.content.clone())),
            PipeRole::System | PipeRole::Other => None,
        }
    }
}

/// User and assistant turns of `messages`, in order, as model messages.
pub fn dialogue(messages: &[PipeMessage]) -> Vec<Message> {
    messages
        .iter()
        .filter_map(PipeMessage::to_dialogue_message)
        .collect()
}

/// Identity of the person chatting, as forwarded by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipeUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Raw request body of a turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipeBody {
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub messages: Vec<PipeMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<PipeUser>,
}

/// Everything a pipeline receives for one turn.
///
/// `messages` is the host's working copy of the conversation, which may carry
/// injected system content (uploaded documents); `body.messages` is what the
/// client actually sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipeInput {
    pub user_message: String,
    pub model_id: String,
    pub messages: Vec<PipeMessage>,
    pub body: PipeBody,
}

impl PipeInput {
    /// Build a turn from a request body alone: the latest user message is the
    /// last `user` entry and the working copy equals the sent messages.
    pub fn from_body(body: PipeBody) -> Self {
        let user_message = body
            .messages
            .iter()
            .rev()
            .find(|m| m.role == PipeRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        Self {
            user_message,
            model_id: body.model.clone(),
            messages: body.messages.clone(),
            body,
        }
    }
}

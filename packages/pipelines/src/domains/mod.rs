pub mod document_analysis;
pub mod helpdesk;
pub mod keyword_rag;

/// Fixed answer when the conversation is over the chat token limit.
pub const CONVERSATION_TOO_LONG: &str = "Cette conversation dépasse la limite de tokens autorisée. \
Veuillez réduire le nombre de messages ou la taille des messages.";

//! Token estimation for conversation and document limits.

use std::sync::Arc;

use super::messages::PipeMessage;

pub trait TokenCounter: Send + Sync {
    fn count_text(&self, text: &str) -> usize;
}

/// Character-based estimate: chars / 4 with a 10% margin, rounded up.
///
/// Errs on the high side so a limit is never silently exceeded upstream.
#[derive(Debug, Clone)]
pub struct HeuristicTokenCounter {
    chars_per_token: f64,
    safety_margin: f64,
}

impl HeuristicTokenCounter {
    pub fn new(chars_per_token: f64, safety_margin: f64) -> Self {
        Self {
            chars_per_token,
            safety_margin,
        }
    }
}

impl Default for HeuristicTokenCounter {
    fn default() -> Self {
        Self::new(4.0, 1.1)
    }
}

impl TokenCounter for HeuristicTokenCounter {
    fn count_text(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }

        let chars = text.chars().count() as f64;
        (chars / self.chars_per_token * self.safety_margin).ceil() as usize
    }
}

pub type SharedTokenCounter = Arc<dyn TokenCounter>;

/// Text measured against the conversation limit: every non-system message
/// content joined by a single space.
pub fn conversation_text(messages: &[PipeMessage]) -> String {
    messages
        .iter()
        .filter(|m| !m.is_system())
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

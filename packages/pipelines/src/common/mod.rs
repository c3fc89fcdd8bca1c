pub mod diagnostics;
pub mod events;
pub mod messages;
pub mod tokens;

pub use diagnostics::{describe, error_kind};
pub use events::PipeEvent;
pub use messages::{dialogue, PipeBody, PipeInput, PipeMessage, PipeRole, PipeUser};
pub use tokens::{conversation_text, HeuristicTokenCounter, SharedTokenCounter, TokenCounter};

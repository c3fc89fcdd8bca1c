//! UTC IT helpdesk assistant.

pub mod knowledge;
pub mod pipeline;
pub mod prompts;
pub mod ticket;

pub use pipeline::{pending_ticket, Helpdesk, KeywordSelection, PendingTicket, PIPELINE_ID};
pub use ticket::{validate_arguments, CreateTicket, Ticket, TicketValidationError};

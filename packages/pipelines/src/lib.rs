//! Chat pipelines for the UTC assistant host.
//!
//! Two conversational pipelines built on an OpenAI-compatible endpoint:
//!
//! - [`domains::document_analysis`]: finds requested information in
//!   uploaded documents, one model call per document, then a summary table.
//! - [`domains::helpdesk`]: IT support assistant grounded on a keyword
//!   knowledge base, able to propose a network support ticket.
//!
//! Plus [`domains::keyword_rag`], a single-shot retrieval helper used for
//! offline evaluation, and an Axum adapter exposing the pipelines as
//! chat-completion models.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod pipeline;
pub mod server;

pub use common::{PipeBody, PipeEvent, PipeInput, PipeMessage, PipeRole, PipeUser};
pub use config::{ServerConfig, Valve, ValveError, Valves, VALVES_REFUSAL};
pub use pipeline::{PipeOutput, PipeStream, Pipeline, PipelineRegistry};

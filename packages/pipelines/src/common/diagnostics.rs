//! User-visible failure descriptions.
//!
//! Pipelines never surface an error to the host: failures become a text
//! fragment naming the error kind and its message.

use openai_client::OpenAIError;

use crate::config::ValveError;

/// Short kind name for the innermost recognizable error in the chain.
pub fn error_kind(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<OpenAIError>() {
            return e.kind();
        }
        if cause.is::<serde_json::Error>() {
            return "serde_json::Error";
        }
        if cause.is::<ValveError>() {
            return "ValveError";
        }
    }
    "Error"
}

/// `"<kind> <message>"`, message including its context chain.
pub fn describe(err: &anyhow::Error) -> String {
    format!("{} {:#}", error_kind(err), err)
}

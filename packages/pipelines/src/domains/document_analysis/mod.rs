//! Document analyzer: finds user-requested information in uploaded documents.

pub mod pipeline;
pub mod prompts;
pub mod sources;
pub mod tools;

pub use pipeline::{DocumentAnalyzer, PIPELINE_ID};
pub use prompts::{make_prompt, per_document_prompt, synthesis_prompt, PromptKind};
pub use sources::{documents_in, extract_sources};
pub use tools::{AnalyzeDocuments, AnalyzeDocumentsArgs, ConfirmationCheck};

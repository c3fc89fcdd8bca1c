//! Helpdesk knowledge base: support notes tagged with problem keywords.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use keyword_db::{JsonKeywordDb, KeywordStore};

const EMBEDDED: &str = include_str!("../../../data/helpdesk_kb.json");

/// The knowledge base shipped with the crate.
pub fn embedded() -> Result<JsonKeywordDb> {
    JsonKeywordDb::from_json_str(EMBEDDED).context("Embedded helpdesk knowledge base is invalid")
}

/// Knowledge base from `path` when given, the embedded one otherwise.
pub fn load(path: Option<&Path>) -> Result<Arc<dyn KeywordStore>> {
    let db = match path {
        Some(path) => JsonKeywordDb::from_path(path)
            .with_context(|| format!("Failed to load knowledge base {}", path.display()))?,
        None => embedded()?,
    };

    tracing::info!(
        keywords = db.keywords().len(),
        documents = db.document_count(),
        source = %path.map_or("embedded".into(), |p| p.display().to_string()),
        "Helpdesk knowledge base loaded"
    );

    Ok(Arc::new(db))
}

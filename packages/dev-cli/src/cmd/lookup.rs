//! Keyword lookups against a knowledge base.

use std::path::Path;

use anyhow::Result;
use console::style;
use pipelines_core::domains::helpdesk::knowledge;
use tracing::debug;

use crate::context::AppContext;
use crate::utils::preview;

pub fn run(ctx: &AppContext, keywords: &[String], db: Option<&Path>) -> Result<()> {
    let store = knowledge::load(db)?;

    for keyword in keywords {
        if !store.contains_keyword(keyword) {
            ctx.print_warning(&format!("Unknown keyword: {}", keyword));
        }
    }

    let documents = store.lookup(keywords);
    debug!(keywords = ?keywords, documents = documents.len(), "Lookup");
    ctx.print_header(&format!("{} document(s)", documents.len()));

    for (i, document) in documents.iter().enumerate() {
        println!("{} {}", style(format!("[{}]", i + 1)).cyan(), preview(document, 160));
    }

    Ok(())
}

//! Uploaded documents, as injected by the host into the leading system message.
//!
//! The host wraps every retrieved chunk in `<source id=.. name="..">..</source>`.
//! Chunks of the same file share a name and are stitched back together.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::common::PipeMessage;

static RE_SOURCE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<source id=[^>]*>.*?</source>").unwrap());

static RE_SOURCE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name="([^"]+)""#).unwrap());

/// Named documents found in `content`, in first-seen order.
///
/// A block without a `name="…"` attribute is named `source_<n>`, `n` being
/// its 1-based position among all blocks. Blocks sharing a name are
/// concatenated in order of appearance, tags included.
pub fn extract_sources(content: &str) -> IndexMap<String, String> {
    let mut documents: IndexMap<String, String> = IndexMap::new();

    for (i, block) in RE_SOURCE_BLOCK.find_iter(content).enumerate() {
        let block = block.as_str().trim();
        let name = RE_SOURCE_NAME
            .captures(block)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| format!("source_{}", i + 1));

        documents.entry(name).or_default().push_str(block);
    }

    documents
}

/// Documents of a conversation. Only a leading system message can carry them.
pub fn documents_in(messages: &[PipeMessage]) -> IndexMap<String, String> {
    match messages.first() {
        Some(first) if first.is_system() => extract_sources(&first.content),
        _ => IndexMap::new(),
    }
}

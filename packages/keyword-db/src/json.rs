//! In-memory keyword database backed by a JSON document.
//!
//! The on-disk shape is
//!
//! ```json
//! {
//!   "keywords": { "vpn-ne-demarre-pas": "optional description" },
//!   "documents": { "document text": ["vpn-ne-demarre-pas"] }
//! }
//! ```
//!
//! Declaration order of both maps is preserved.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{KeywordDbError, Result};
use crate::store::KeywordStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonKeywordDb {
    /// keyword -> description
    #[serde(default)]
    keywords: IndexMap<String, String>,

    /// document -> tags
    #[serde(default)]
    documents: IndexMap<String, Vec<String>>,
}

impl JsonKeywordDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a database from its JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let db: Self = serde_json::from_str(json)?;
        db.report_unknown_tags();
        debug!(
            keywords = db.keywords.len(),
            documents = db.documents.len(),
            "Loaded keyword database"
        );
        Ok(db)
    }

    /// Read and parse a database file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| KeywordDbError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Serialize back to pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Document tags that are not declared in the keyword table, deduplicated
    /// in first-seen order. Such tags can still be looked up but will never be
    /// offered to the model.
    pub fn unknown_tags(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.documents
            .values()
            .flatten()
            .map(String::as_str)
            .filter(|tag| !self.keywords.contains_key(*tag))
            .filter(|tag| seen.insert(*tag))
            .collect()
    }

    /// Documents carrying no tag at all; unreachable through `lookup`.
    pub fn untagged_documents(&self) -> impl Iterator<Item = &str> {
        self.documents
            .iter()
            .filter(|(_, tags)| tags.is_empty())
            .map(|(doc, _)| doc.as_str())
    }

    fn report_unknown_tags(&self) {
        let unknown = self.unknown_tags();
        if !unknown.is_empty() {
            warn!(tags = ?unknown, "Documents reference undeclared keywords");
        }
    }
}

impl KeywordStore for JsonKeywordDb {
    fn lookup(&self, keywords: &[String]) -> BTreeSet<String> {
        if keywords.is_empty() {
            return BTreeSet::new();
        }
        let wanted: HashSet<&str> = keywords.iter().map(String::as_str).collect();

        self.documents
            .iter()
            .filter(|(_, tags)| tags.iter().any(|t| wanted.contains(t.as_str())))
            .map(|(doc, _)| doc.clone())
            .collect()
    }

    fn keywords(&self) -> Vec<String> {
        self.keywords.keys().cloned().collect()
    }

    fn description(&self, keyword: &str) -> Option<&str> {
        self.keywords.get(keyword).map(String::as_str)
    }

    fn insert_keyword(&mut self, keyword: &str, description: &str) {
        if !self.keywords.contains_key(keyword) {
            self.keywords
                .insert(keyword.to_string(), description.to_string());
        }
    }

    fn insert_document(&mut self, document: &str, keywords: &[String]) {
        if !self.documents.contains_key(document) {
            self.documents
                .insert(document.to_string(), keywords.to_vec());
        }
    }

    fn document_count(&self) -> usize {
        self.documents.len()
    }
}

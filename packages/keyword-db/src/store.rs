//! The keyword store abstraction.

use std::collections::BTreeSet;

/// Tag-to-document associative index.
///
/// A document is free text tagged with zero or more keywords. `lookup`
/// returns the union of the documents tagged with any requested keyword;
/// there is no ranking, and the result is a set.
pub trait KeywordStore: Send + Sync {
    /// Every document whose tags intersect `keywords`.
    ///
    /// Unknown keywords match nothing; an empty query matches nothing.
    fn lookup(&self, keywords: &[String]) -> BTreeSet<String>;

    /// Known keywords, in declaration order.
    fn keywords(&self) -> Vec<String>;

    /// Free-text description attached to a keyword.
    fn description(&self, keyword: &str) -> Option<&str>;

    /// Register a keyword. No-op if it already exists.
    fn insert_keyword(&mut self, keyword: &str, description: &str);

    /// Register a document with its tags. No-op if the document already exists.
    fn insert_document(&mut self, document: &str, keywords: &[String]);

    /// Number of stored documents.
    fn document_count(&self) -> usize;

    fn contains_keyword(&self, keyword: &str) -> bool {
        self.description(keyword).is_some()
    }
}

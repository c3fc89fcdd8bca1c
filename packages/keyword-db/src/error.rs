//! Typed errors for loading keyword databases.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, KeywordDbError>;

#[derive(Debug, Error)]
pub enum KeywordDbError {
    /// The database file could not be read
    #[error("failed to read keyword database {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The database content is not `{ "keywords": {...}, "documents": {...} }`
    #[error("invalid keyword database: {0}")]
    Parse(#[from] serde_json::Error),
}

//! Keyword-to-document lookup table.
//!
//! Coarse retrieval for assistants that let a model pick keywords from a
//! closed list: the store returns every document tagged with any of them.
//!
//! ```rust,ignore
//! use keyword_db::{JsonKeywordDb, KeywordStore};
//!
//! let db = JsonKeywordDb::from_path("data/kb.json")?;
//! let docs = db.lookup(&["vpn-ne-demarre-pas".to_string()]);
//! ```
//!
//! Stores are built once at startup and shared read-only
//! (`Arc<dyn KeywordStore>`).

pub mod error;
pub mod json;
pub mod store;

pub use error::{KeywordDbError, Result};
pub use json::JsonKeywordDb;
pub use store::KeywordStore;

//! Repository Module
//!
//! CRUD operations on the SurrealDB tables, one repository per table.

// Catalog
pub mod milestone;
pub mod store;

// Sessions
pub mod cart_session;
pub mod reward_history;

// Re-exports
pub use cart_session::CartSessionRepository;
pub use milestone::MilestoneRepository;
pub use reward_history::RewardHistoryRepository;
pub use store::StoreRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use surrealdb::sql::Thing;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// ID convention: record ids travel as "table:id" strings across the whole
// stack. Handlers accept either the full form or the bare key; repositories
// strip the prefix before talking to the database.

/// Drop a leading `table:` prefix if present
pub(crate) fn strip_table_prefix<'a>(table: &str, id: &'a str) -> &'a str {
    id.strip_prefix(table)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(id)
}

/// Build a Thing for the given table and (possibly prefixed) id
pub(crate) fn make_thing(table: &str, id: &str) -> Thing {
    Thing::from((table.to_string(), strip_table_prefix(table, id).to_string()))
}

/// Base repository holding the database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

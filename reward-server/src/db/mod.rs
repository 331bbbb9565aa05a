//! Database Module
//!
//! Owns the embedded SurrealDB handle and applies the schema on startup.

pub mod models;
pub mod repository;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

use crate::utils::AppError;

const NAMESPACE: &str = "rewards";
const DATABASE: &str = "main";

/// Schema applied at startup. All statements are idempotent so the service
/// can restart against an existing data directory.
const SCHEMA: &str = r#"
    DEFINE TABLE IF NOT EXISTS store SCHEMALESS;
    DEFINE TABLE IF NOT EXISTS milestone SCHEMALESS;
    DEFINE TABLE IF NOT EXISTS cart_session SCHEMALESS;
    DEFINE TABLE IF NOT EXISTS reward_history SCHEMALESS;

    DEFINE INDEX IF NOT EXISTS cart_session_token ON cart_session FIELDS cartToken UNIQUE;
    DEFINE INDEX IF NOT EXISTS reward_once_per_milestone ON reward_history FIELDS cartSession, milestone UNIQUE;
"#;

/// Database service, owns the embedded SurrealDB instance
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the on-disk database at `db_path`
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db: Surreal<Db> = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        Self::prepare(db).await
    }

    /// In-memory database. Used by tests.
    pub async fn new_in_memory() -> Result<Self, AppError> {
        let db: Surreal<Db> = Surreal::new::<Mem>(())
            .await
            .map_err(|e| AppError::database(format!("Failed to open in-memory database: {e}")))?;

        Self::prepare(db).await
    }

    async fn prepare(db: Surreal<Db>) -> Result<Self, AppError> {
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        db.query(SCHEMA)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply schema: {e}")))?
            .check()
            .map_err(|e| AppError::database(format!("Failed to apply schema: {e}")))?;

        tracing::info!("Database ready (SurrealDB embedded, ns={NAMESPACE} db={DATABASE})");

        Ok(Self { db })
    }
}

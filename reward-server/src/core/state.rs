use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::core::Config;
use crate::db::DbService;
use crate::rewards::RewardService;

/// Shared server state - holds the configuration and the database handle
///
/// `ServerState` is cloned into every handler via axum's `State` extractor.
/// The SurrealDB handle is internally reference counted, so cloning is cheap.
#[derive(Clone, Debug)]
pub struct ServerState {
    /// Server configuration
    pub config: Config,
    /// Embedded database (SurrealDB)
    pub db: Surreal<Db>,
}

impl ServerState {
    pub fn new(config: Config, db: Surreal<Db>) -> Self {
        Self { config, db }
    }

    /// Initialize the server state
    ///
    /// 1. Ensure the work_dir structure exists
    /// 2. Open the embedded database and apply the schema
    ///
    /// # Panics
    ///
    /// Panics when the database cannot be initialized - the server cannot
    /// run without storage.
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("rewards.db");
        let db_service = DbService::new(&db_path.to_string_lossy())
            .await
            .expect("Failed to initialize database");

        Self::new(config.clone(), db_service.db)
    }

    /// State backed by an in-memory database. Used by tests.
    pub async fn initialize_in_memory(config: &Config) -> Self {
        let db_service = DbService::new_in_memory()
            .await
            .expect("Failed to initialize in-memory database");
        Self::new(config.clone(), db_service.db)
    }

    /// Database handle
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    /// Build the reward service on top of this state's database
    pub fn reward_service(&self) -> RewardService {
        RewardService::new(
            self.db.clone(),
            self.config.default_delivery_fee,
            self.config.update_max_retries,
        )
    }
}

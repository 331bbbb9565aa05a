//! Store Repository

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, make_thing, strip_table_prefix};
use crate::db::models::{Store, StoreCreate, StoreUpdate};
use crate::utils::time_now_ms;

const TABLE: &str = "store";

#[derive(Clone)]
pub struct StoreRepository {
    base: BaseRepository,
}

impl StoreRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find store by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Store>> {
        let pure_id = strip_table_prefix(TABLE, id);
        let store: Option<Store> = self.base.db().select((TABLE, pure_id)).await?;
        Ok(store)
    }

    /// Create a new store
    pub async fn create(&self, data: StoreCreate) -> RepoResult<Store> {
        let store = Store {
            id: None,
            name: data.name,
            currency: data.currency.unwrap_or_else(|| "EUR".to_string()),
            delivery_fee: data.delivery_fee,
            created_at: time_now_ms(),
        };

        let created: Option<Store> = self.base.db().create(TABLE).content(store).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create store".to_string()))
    }

    /// Update store settings
    pub async fn update(&self, id: &str, data: StoreUpdate) -> RepoResult<Store> {
        let pure_id = strip_table_prefix(TABLE, id);
        self.find_by_id(pure_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Store {} not found", id)))?;

        let thing = make_thing(TABLE, pure_id);
        self.base
            .db()
            .query("UPDATE $thing MERGE $data")
            .bind(("thing", thing))
            .bind(("data", data))
            .await?
            .check()?;

        self.find_by_id(pure_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Store {} not found", id)))
    }
}

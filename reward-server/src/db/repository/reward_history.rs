//! Reward History Repository
//!
//! Rows are appended by the cart-session transaction in
//! [`CartSessionRepository::update_value`]; this repository only reads.
//!
//! [`CartSessionRepository::update_value`]: super::CartSessionRepository::update_value

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use surrealdb::sql::Thing;

use super::{BaseRepository, RepoResult};
use crate::db::models::RewardHistory;

#[derive(Clone)]
pub struct RewardHistoryRepository {
    base: BaseRepository,
}

impl RewardHistoryRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// All reward rows of one session, oldest first
    pub async fn find_by_session(&self, session: &Thing) -> RepoResult<Vec<RewardHistory>> {
        let session_id = session.to_string();
        let mut rows: Vec<RewardHistory> = self
            .base
            .db()
            .query("SELECT * FROM reward_history WHERE cartSession = $session_id")
            .bind(("session_id", session_id))
            .await?
            .take(0)?;

        rows.sort_by_key(|r| (r.created_at, r.sequence));
        Ok(rows)
    }
}

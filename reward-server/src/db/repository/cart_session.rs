//! Cart Session Repository
//!
//! Session writes are read-modify-write cycles racing against other tabs of
//! the same shopper, so every mutation carries the version the caller read.
//! The write happens in one database transaction together with any reward
//! history rows: either everything lands or nothing does.

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use surrealdb::sql::Thing;

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{CartSession, RewardHistory};
use crate::utils::time_now_ms;

/// Marker thrown inside the transaction when the version check fails;
/// surfaces through the driver as an error string we match on.
const VERSION_CONFLICT: &str = "version-conflict";

/// Conditional value update plus history append, all-or-nothing.
///
/// `INSERT IGNORE` leans on the unique (cartSession, milestone) index:
/// a milestone re-crossed after a value drop gets no second history row.
const UPDATE_VALUE_SQL: &str = r#"
    BEGIN TRANSACTION;
    LET $updated = UPDATE cart_session
        SET currentValue = $value,
            unlockedMilestones = $unlocked,
            version = version + 1,
            updatedAt = $now
        WHERE cartToken = $cart_token AND version = $version
        RETURN AFTER;
    IF array::len($updated) == 0 { THROW "version-conflict" };
    INSERT IGNORE INTO reward_history $rows;
    COMMIT TRANSACTION;
"#;

/// Conditional free-product selection update
const UPDATE_SELECTION_SQL: &str = r#"
    BEGIN TRANSACTION;
    LET $updated = UPDATE cart_session
        SET selectedFreeProducts = $products,
            version = version + 1,
            updatedAt = $now
        WHERE cartToken = $cart_token AND version = $version
        RETURN AFTER;
    IF array::len($updated) == 0 { THROW "version-conflict" };
    COMMIT TRANSACTION;
"#;

#[derive(Clone)]
pub struct CartSessionRepository {
    base: BaseRepository,
}

impl CartSessionRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find session by cart token
    pub async fn find_by_token(&self, token: &str) -> RepoResult<Option<CartSession>> {
        let token_owned = token.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM cart_session WHERE cartToken = $cart_token LIMIT 1")
            .bind(("cart_token", token_owned))
            .await?;
        let sessions: Vec<CartSession> = result.take(0)?;
        Ok(sessions.into_iter().next())
    }

    /// Persist a new session (first contact for this cart token)
    pub async fn create(&self, session: CartSession) -> RepoResult<CartSession> {
        let token = session.cart_token.clone();
        let created: Result<Option<CartSession>, surrealdb::Error> =
            self.base.db().create("cart_session").content(session).await;

        match created {
            Ok(Some(session)) => Ok(session),
            Ok(None) => Err(RepoError::Database(
                "Failed to create cart session".to_string(),
            )),
            // The unique token index catches a concurrent first contact
            Err(e) if e.to_string().contains("cart_session_token") => Err(RepoError::Duplicate(
                format!("Cart session '{}' already exists", token),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the new cart value, the recomputed unlocked set and the reward
    /// history rows for newly crossed milestones in a single transaction,
    /// guarded by the version the caller read.
    ///
    /// Returns `RepoError::Conflict` when the session changed underneath the
    /// caller; nothing is persisted in that case.
    pub async fn update_value(
        &self,
        token: &str,
        version: i64,
        new_value: rust_decimal::Decimal,
        unlocked: Vec<Thing>,
        history_rows: Vec<RewardHistory>,
    ) -> RepoResult<CartSession> {
        let unlocked: Vec<String> = unlocked.iter().map(|t| t.to_string()).collect();
        let result = self
            .base
            .db()
            .query(UPDATE_VALUE_SQL)
            .bind(("cart_token", token.to_string()))
            .bind(("version", version))
            .bind(("value", new_value))
            .bind(("unlocked", unlocked))
            .bind(("now", time_now_ms()))
            .bind(("rows", history_rows))
            .await?;

        Self::check_versioned_write(result)?;

        self.find_by_token(token)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Cart session {} not found", token)))
    }

    /// Overwrite the shopper's free-product selection under the same
    /// version guard. No reward-history interaction.
    pub async fn update_free_products(
        &self,
        token: &str,
        version: i64,
        product_ids: Vec<String>,
    ) -> RepoResult<CartSession> {
        let result = self
            .base
            .db()
            .query(UPDATE_SELECTION_SQL)
            .bind(("cart_token", token.to_string()))
            .bind(("version", version))
            .bind(("products", product_ids))
            .bind(("now", time_now_ms()))
            .await?;

        Self::check_versioned_write(result)?;

        self.find_by_token(token)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Cart session {} not found", token)))
    }

    fn check_versioned_write(result: surrealdb::Response) -> RepoResult<()> {
        match result.check() {
            Ok(_) => Ok(()),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains(VERSION_CONFLICT) {
                    Err(RepoError::Conflict(
                        "Cart session was modified concurrently".to_string(),
                    ))
                } else {
                    Err(RepoError::Database(msg))
                }
            }
        }
    }
}

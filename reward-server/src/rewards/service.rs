//! Reward service
//!
//! Persistence-aware use cases around the pure evaluator: session opening,
//! cart-value updates and free-product selection. Each value update is a
//! read-evaluate-write cycle; the write carries the version that was read
//! and the whole cycle is retried a bounded number of times when another
//! writer got in between.

use rust_decimal::Decimal;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::{
    CartSession, CartSessionCreate, Milestone, RewardHistory, RewardType,
};
use crate::db::repository::{
    CartSessionRepository, MilestoneRepository, RepoError, RewardHistoryRepository,
    StoreRepository, make_thing,
};
use crate::utils::validation::{MAX_SHORT_TEXT_LEN, validate_required_text};
use crate::utils::{AppError, AppResult, time_now_ms};

/// Result of a cart-value update, shaped for the HTTP layer
#[derive(Debug, Clone)]
pub struct CartValueUpdateOutcome {
    /// The session after the update
    pub session: CartSession,
    /// Whether this update crossed at least one new threshold
    pub has_new_milestones: bool,
    /// Records of every milestone unlocked at the new value
    pub unlocked_milestones: Vec<Milestone>,
}

#[derive(Clone)]
pub struct RewardService {
    milestone_repo: MilestoneRepository,
    session_repo: CartSessionRepository,
    history_repo: RewardHistoryRepository,
    store_repo: StoreRepository,
    default_delivery_fee: Decimal,
    max_retries: u32,
}

impl RewardService {
    pub fn new(db: Surreal<Db>, default_delivery_fee: Decimal, max_retries: u32) -> Self {
        Self {
            milestone_repo: MilestoneRepository::new(db.clone()),
            session_repo: CartSessionRepository::new(db.clone()),
            history_repo: RewardHistoryRepository::new(db.clone()),
            store_repo: StoreRepository::new(db),
            default_delivery_fee,
            max_retries,
        }
    }

    /// Open a cart session on first contact from the storefront.
    ///
    /// Idempotent per token: a replayed open (page reload, retried request)
    /// returns the already-persisted session untouched.
    pub async fn open_session(&self, data: CartSessionCreate) -> AppResult<CartSession> {
        validate_required_text(&data.cart_token, "cartToken", MAX_SHORT_TEXT_LEN)?;

        let store = self
            .store_repo
            .find_by_id(&data.store_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Store {} not found", data.store_id)))?;

        if let Some(existing) = self.session_repo.find_by_token(&data.cart_token).await? {
            return Ok(existing);
        }

        let now = time_now_ms();
        let session = CartSession {
            id: None,
            store: store
                .id
                .unwrap_or_else(|| make_thing("store", &data.store_id)),
            customer_id: data.customer_id,
            cart_token: data.cart_token.clone(),
            current_value: Decimal::ZERO,
            unlocked_milestones: Vec::new(),
            selected_free_products: Vec::new(),
            timer_expires_at: data.timer_expires_at,
            is_active: true,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        match self.session_repo.create(session).await {
            Ok(created) => Ok(created),
            // Two first contacts raced; the other one won, return its row
            Err(RepoError::Duplicate(_)) => self
                .session_repo
                .find_by_token(&data.cart_token)
                .await?
                .ok_or_else(|| AppError::internal("Cart session vanished after create race")),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch a session by token
    pub async fn get_session(&self, token: &str) -> AppResult<CartSession> {
        self.session_repo
            .find_by_token(token)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Cart session {token} not found")))
    }

    /// Reward history of a session, oldest first
    pub async fn list_session_rewards(&self, token: &str) -> AppResult<Vec<RewardHistory>> {
        let session = self.get_session(token).await?;
        let session_id = session
            .id
            .ok_or_else(|| AppError::internal("Persisted session has no id"))?;
        Ok(self.history_repo.find_by_session(&session_id).await?)
    }

    /// Apply a reported cart value to a session.
    ///
    /// Recomputes the unlocked set against the store's current active
    /// milestones, persists it together with one reward-history row per
    /// newly crossed milestone (ascending threshold order) in a single
    /// transaction, and reports the delta. A concurrent update restarts
    /// the cycle; after `max_retries` restarts the caller gets a conflict
    /// and the stored session is left as the winner wrote it.
    pub async fn apply_cart_value_update(
        &self,
        token: &str,
        new_value: Decimal,
    ) -> AppResult<CartValueUpdateOutcome> {
        let mut attempts = 0;
        loop {
            let session = self.get_session(token).await?;
            let session_id = session
                .id
                .clone()
                .ok_or_else(|| AppError::internal("Persisted session has no id"))?;

            let active = self.milestone_repo.find_active(&session.store).await?;
            let result =
                crate::rewards::evaluate(&active, &session.unlocked_milestones, new_value)?;

            let delivery_fee = self.delivery_fee_for(&session).await?;
            let now = time_now_ms();
            let history_rows: Vec<RewardHistory> = result
                .newly_unlocked
                .iter()
                .enumerate()
                .filter_map(|(idx, m)| {
                    m.id.clone().map(|milestone_id| RewardHistory {
                        id: None,
                        store: session.store.clone(),
                        cart_session: session_id.clone(),
                        milestone: milestone_id,
                        reward_type: m.reward_type,
                        reward_value: match m.reward_type {
                            RewardType::FreeDelivery => delivery_fee,
                            _ => Decimal::ZERO,
                        },
                        is_redeemed: false,
                        sequence: idx as i64,
                        created_at: now,
                    })
                })
                .collect();

            match self
                .session_repo
                .update_value(
                    token,
                    session.version,
                    new_value,
                    result.unlocked_now.clone(),
                    history_rows,
                )
                .await
            {
                Ok(updated) => {
                    if result.has_new_milestones() {
                        tracing::info!(
                            cart_token = %token,
                            new_value = %new_value,
                            crossed = result.newly_unlocked.len(),
                            "Cart crossed milestone threshold(s)"
                        );
                    }
                    return Ok(CartValueUpdateOutcome {
                        session: updated,
                        has_new_milestones: result.has_new_milestones(),
                        unlocked_milestones: result.matched,
                    });
                }
                Err(RepoError::Conflict(_)) if attempts < self.max_retries => {
                    attempts += 1;
                    tracing::warn!(
                        cart_token = %token,
                        attempt = attempts,
                        "Concurrent session update, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Overwrite the shopper's free-product selection.
    ///
    /// The selection is bounded by the `freeProductCount` of the
    /// highest-threshold unlocked free-products milestone; anything beyond
    /// that is rejected rather than trusted from the client.
    pub async fn apply_free_product_selection(
        &self,
        token: &str,
        product_ids: Vec<String>,
    ) -> AppResult<CartSession> {
        for id in &product_ids {
            validate_required_text(id, "productIds entry", MAX_SHORT_TEXT_LEN)?;
        }

        // Set semantics: drop duplicates, keep first occurrence order
        let mut seen = std::collections::HashSet::new();
        let product_ids: Vec<String> = product_ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();

        let mut attempts = 0;
        loop {
            let session = self.get_session(token).await?;
            let allowed = self.free_product_allowance(&session).await?;

            if product_ids.len() > allowed as usize {
                return Err(AppError::validation(format!(
                    "Selection of {} free products exceeds the unlocked allowance of {}",
                    product_ids.len(),
                    allowed
                )));
            }

            match self
                .session_repo
                .update_free_products(token, session.version, product_ids.clone())
                .await
            {
                Ok(updated) => return Ok(updated),
                Err(RepoError::Conflict(_)) if attempts < self.max_retries => {
                    attempts += 1;
                    tracing::warn!(
                        cart_token = %token,
                        attempt = attempts,
                        "Concurrent session update, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Free products the session is entitled to pick: the count of the
    /// highest-threshold unlocked free-products milestone, zero when none
    /// is unlocked. Paused or deleted milestones grant nothing even while
    /// still listed in the session's unlocked set.
    async fn free_product_allowance(&self, session: &CartSession) -> AppResult<u32> {
        let active = self.milestone_repo.find_active(&session.store).await?;
        let unlocked: std::collections::HashSet<String> = session
            .unlocked_milestones
            .iter()
            .map(|t| t.to_string())
            .collect();

        // Catalog is ascending by threshold, so the last match wins
        let allowance = active
            .iter()
            .filter(|m| m.reward_type == RewardType::FreeProducts)
            .filter(|m| {
                m.id.as_ref()
                    .is_some_and(|id| unlocked.contains(&id.to_string()))
            })
            .map(|m| m.free_product_count)
            .next_back()
            .unwrap_or(0);

        Ok(allowance)
    }

    async fn delivery_fee_for(&self, session: &CartSession) -> AppResult<Decimal> {
        let store = self.store_repo.find_by_id(&session.store.to_string()).await?;
        Ok(store
            .and_then(|s| s.delivery_fee)
            .unwrap_or(self.default_delivery_fee))
    }
}

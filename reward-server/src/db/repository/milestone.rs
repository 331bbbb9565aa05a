//! Milestone Repository
//!
//! Store-scoped catalog of reward milestones. The evaluator re-reads the
//! catalog on every evaluation, so no caching or invalidation exists here.

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use surrealdb::sql::Thing;

use super::{BaseRepository, RepoError, RepoResult, make_thing, strip_table_prefix};
use crate::db::models::{
    Milestone, MilestoneCreate, MilestoneStatus, MilestoneUpdate, RewardType,
};
use crate::utils::time_now_ms;

const TABLE: &str = "milestone";

#[derive(Clone)]
pub struct MilestoneRepository {
    base: BaseRepository,
}

impl MilestoneRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Active milestones of a store, ascending by threshold.
    ///
    /// Thresholds are decimal strings in storage, so ordering happens here
    /// rather than in the query; ties are broken by creation time, which
    /// keeps emission order stable for equal thresholds.
    pub async fn find_active(&self, store: &Thing) -> RepoResult<Vec<Milestone>> {
        let store_id = store.to_string();
        let mut milestones: Vec<Milestone> = self
            .base
            .db()
            .query("SELECT * FROM milestone WHERE store = $store AND status = 'active'")
            .bind(("store", store_id))
            .await?
            .take(0)?;

        milestones.sort_by(|a, b| {
            a.threshold_amount
                .cmp(&b.threshold_amount)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(milestones)
    }

    /// Milestones of a store filtered by status; `None` returns everything
    /// except soft-deleted records. Admin listing order (display_order).
    pub async fn find_by_status(
        &self,
        store: &Thing,
        status: Option<MilestoneStatus>,
    ) -> RepoResult<Vec<Milestone>> {
        let store_id = store.to_string();
        let mut milestones: Vec<Milestone> = match status {
            Some(status) => {
                self.base
                    .db()
                    .query("SELECT * FROM milestone WHERE store = $store AND status = $status")
                    .bind(("store", store_id))
                    .bind(("status", status))
                    .await?
                    .take(0)?
            }
            None => {
                self.base
                    .db()
                    .query("SELECT * FROM milestone WHERE store = $store AND status != 'deleted'")
                    .bind(("store", store_id))
                    .await?
                    .take(0)?
            }
        };

        milestones.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(milestones)
    }

    /// Find milestone by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Milestone>> {
        let pure_id = strip_table_prefix(TABLE, id);
        let milestone: Option<Milestone> = self.base.db().select((TABLE, pure_id)).await?;
        Ok(milestone)
    }

    /// Create a new milestone for a store
    pub async fn create(&self, store: Thing, data: MilestoneCreate) -> RepoResult<Milestone> {
        if data.threshold_amount.is_sign_negative() {
            return Err(RepoError::Validation(format!(
                "thresholdAmount must be non-negative, got {}",
                data.threshold_amount
            )));
        }
        if data.reward_type == RewardType::Discount && data.discount_value.is_none() {
            return Err(RepoError::Validation(
                "discount milestones require a discountValue".to_string(),
            ));
        }
        if let Some(discount) = data.discount_value
            && discount.is_sign_negative()
        {
            return Err(RepoError::Validation(format!(
                "discountValue must be non-negative, got {discount}"
            )));
        }

        let milestone = Milestone {
            id: None,
            store,
            name: data.name,
            threshold_amount: data.threshold_amount,
            reward_type: data.reward_type,
            free_product_count: data.free_product_count.unwrap_or(0),
            discount_value: data.discount_value,
            discount_type: data.discount_type,
            status: MilestoneStatus::Active,
            priority: data.priority.unwrap_or(0),
            display_order: data.display_order.unwrap_or(0),
            usage_limit: data.usage_limit,
            max_usage_per_customer: data.max_usage_per_customer,
            created_at: time_now_ms(),
        };

        let created: Option<Milestone> = self.base.db().create(TABLE).content(milestone).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create milestone".to_string()))
    }

    /// Update a milestone's fields
    pub async fn update(&self, id: &str, data: MilestoneUpdate) -> RepoResult<Milestone> {
        let pure_id = strip_table_prefix(TABLE, id);
        let existing = self
            .find_by_id(pure_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Milestone {} not found", id)))?;

        if existing.status == MilestoneStatus::Deleted {
            return Err(RepoError::Validation(format!(
                "Milestone {} is deleted",
                id
            )));
        }
        if let Some(threshold) = data.threshold_amount
            && threshold.is_sign_negative()
        {
            return Err(RepoError::Validation(format!(
                "thresholdAmount must be non-negative, got {threshold}"
            )));
        }
        if let Some(discount) = data.discount_value
            && discount.is_sign_negative()
        {
            return Err(RepoError::Validation(format!(
                "discountValue must be non-negative, got {discount}"
            )));
        }
        // The merged record must satisfy the same rule as create
        let reward_type = data.reward_type.unwrap_or(existing.reward_type);
        let discount_value = data.discount_value.or(existing.discount_value);
        if reward_type == RewardType::Discount && discount_value.is_none() {
            return Err(RepoError::Validation(
                "discount milestones require a discountValue".to_string(),
            ));
        }

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
            .ok_or_else(|| RepoError::NotFound(format!("Milestone {} not found", id)))
    }

    /// Flip the lifecycle status (pause/resume). Deleted milestones stay
    /// deleted; reviving one is not supported.
    pub async fn set_status(&self, id: &str, status: MilestoneStatus) -> RepoResult<Milestone> {
        let pure_id = strip_table_prefix(TABLE, id);
        let existing = self
            .find_by_id(pure_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Milestone {} not found", id)))?;

        if existing.status == MilestoneStatus::Deleted {
            return Err(RepoError::Validation(format!(
                "Milestone {} is deleted",
                id
            )));
        }

        let thing = make_thing(TABLE, pure_id);
        self.base
            .db()
            .query("UPDATE $thing SET status = $status")
            .bind(("thing", thing))
            .bind(("status", status))
            .await?
            .check()?;

        self.find_by_id(pure_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Milestone {} not found", id)))
    }

    /// Soft delete: mark the record deleted, keep it in storage
    pub async fn soft_delete(&self, id: &str) -> RepoResult<bool> {
        let pure_id = strip_table_prefix(TABLE, id);
        if self.find_by_id(pure_id).await?.is_none() {
            return Err(RepoError::NotFound(format!("Milestone {} not found", id)));
        }

        let thing = make_thing(TABLE, pure_id);
        self.base
            .db()
            .query("UPDATE $thing SET status = 'deleted'")
            .bind(("thing", thing))
            .await?
            .check()?;
        Ok(true)
    }

    /// Duplicate a milestone: new record copying every field except the id
    /// and creation time, under a derived name
    pub async fn duplicate(&self, id: &str) -> RepoResult<Milestone> {
        let pure_id = strip_table_prefix(TABLE, id);
        let source = self
            .find_by_id(pure_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Milestone {} not found", id)))?;

        let copy = Milestone {
            id: None,
            name: format!("{} (copy)", source.name),
            created_at: time_now_ms(),
            ..source
        };

        let created: Option<Milestone> = self.base.db().create(TABLE).content(copy).await?;
        created.ok_or_else(|| RepoError::Database("Failed to duplicate milestone".to_string()))
    }
}

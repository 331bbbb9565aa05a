//! Milestone Model
//!
//! A milestone pairs a cart-value threshold with a reward. Thresholds are
//! not unique: two milestones at the same amount are legal and evaluated
//! independently.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use super::serde_thing;

pub type MilestoneId = Thing;

/// Reward granted when the milestone unlocks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    FreeDelivery,
    FreeProducts,
    Discount,
}

/// How a discount reward is expressed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

/// Lifecycle status. `Deleted` is a soft-delete marker: the record stays
/// in storage but is excluded from evaluation and from default listings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    #[default]
    Active,
    Paused,
    Deleted,
}

impl MilestoneStatus {
    /// Parse the lowercase wire form used by the `?status=` query parameter
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Deleted => "deleted",
        }
    }
}

/// Milestone entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    #[serde(default, with = "serde_thing::option", skip_serializing_if = "Option::is_none")]
    pub id: Option<MilestoneId>,
    /// Owning store
    #[serde(with = "serde_thing")]
    pub store: Thing,
    pub name: String,
    /// Cart value at which the milestone unlocks (inclusive, store currency)
    pub threshold_amount: Decimal,
    pub reward_type: RewardType,
    /// Number of free products the shopper may pick
    /// (meaningful only for `free_products`)
    #[serde(default)]
    pub free_product_count: u32,
    /// Discount size (meaningful only for `discount`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_value: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_type: Option<DiscountType>,
    #[serde(default)]
    pub status: MilestoneStatus,
    /// UI ordering only, never consulted by the evaluator
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub display_order: i32,
    /// Optional cap on total redemptions (stored, enforced at checkout)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_usage_per_customer: Option<u32>,
    /// Created timestamp (milliseconds since epoch); also the tie-breaker
    /// for milestones sharing a threshold
    #[serde(default)]
    pub created_at: i64,
}

/// Create milestone payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneCreate {
    pub name: String,
    pub threshold_amount: Decimal,
    pub reward_type: RewardType,
    pub free_product_count: Option<u32>,
    pub discount_value: Option<Decimal>,
    pub discount_type: Option<DiscountType>,
    pub priority: Option<i32>,
    pub display_order: Option<i32>,
    pub usage_limit: Option<u32>,
    pub max_usage_per_customer: Option<u32>,
}

/// Update milestone payload (status changes go through pause/resume/delete)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_type: Option<RewardType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_product_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_value: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_type: Option<DiscountType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_usage_per_customer: Option<u32>,
}

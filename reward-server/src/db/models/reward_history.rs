//! Reward History Model
//!
//! Append-only ledger of milestone-unlock events. At most one row exists
//! per (cart session, milestone) pair; a unique index backs this up.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use super::milestone::RewardType;
use super::serde_thing;

/// Reward history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardHistory {
    #[serde(default, with = "serde_thing::option", skip_serializing_if = "Option::is_none")]
    pub id: Option<Thing>,
    #[serde(with = "serde_thing")]
    pub store: Thing,
    #[serde(with = "serde_thing")]
    pub cart_session: Thing,
    #[serde(with = "serde_thing")]
    pub milestone: Thing,
    pub reward_type: RewardType,
    /// Delivery fee for free-delivery rewards; zero placeholder otherwise
    /// (actual discount amounts are computed at checkout)
    pub reward_value: Decimal,
    /// Flipped at order completion, out of scope here
    #[serde(default)]
    pub is_redeemed: bool,
    /// Position within the emission batch; rows created by one value update
    /// share a timestamp, this keeps them in threshold order
    #[serde(default)]
    pub sequence: i64,
    #[serde(default)]
    pub created_at: i64,
}

//! Cart Session Model
//!
//! One record per shopping session, keyed by the client-generated cart
//! token. The unlocked-milestone set is a pure function of the current
//! value and the store's active milestones; it is recomputed in full on
//! every value update and never patched incrementally.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use super::serde_thing;

/// Cart session entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSession {
    #[serde(default, with = "serde_thing::option", skip_serializing_if = "Option::is_none")]
    pub id: Option<Thing>,
    /// Owning store
    #[serde(with = "serde_thing")]
    pub store: Thing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Client-generated token, unique per active shopping session
    pub cart_token: String,
    /// Cart subtotal as last reported by the storefront
    pub current_value: Decimal,
    /// Milestones unlocked as of `current_value` (set semantics)
    #[serde(default, with = "serde_thing::vec")]
    pub unlocked_milestones: Vec<Thing>,
    /// Free products picked by the shopper, bounded by the highest unlocked
    /// free-products milestone
    #[serde(default)]
    pub selected_free_products: Vec<String>,
    /// Urgency countdown expiry (stored for the widget, not enforced here)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_expires_at: Option<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Optimistic-lock counter, bumped on every write
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

fn default_true() -> bool {
    true
}

/// Open session payload (first contact from the storefront)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSessionCreate {
    /// Owning store id (`store:<id>` or plain id)
    pub store_id: String,
    pub cart_token: String,
    pub customer_id: Option<String>,
    pub timer_expires_at: Option<i64>,
}

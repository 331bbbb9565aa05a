//! Store Model
//!
//! Per-store settings the reward flow needs: currency and the flat delivery
//! fee recorded as the reward value of free-delivery milestones.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use super::serde_thing;

/// Store entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    #[serde(default, with = "serde_thing::option", skip_serializing_if = "Option::is_none")]
    pub id: Option<Thing>,
    pub name: String,
    /// ISO 4217 currency code
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Flat delivery fee; falls back to the server default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_fee: Option<Decimal>,
    #[serde(default)]
    pub created_at: i64,
}

fn default_currency() -> String {
    "EUR".to_string()
}

/// Create store payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreCreate {
    pub name: String,
    pub currency: Option<String>,
    pub delivery_fee: Option<Decimal>,
}

/// Update store payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StoreUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_fee: Option<Decimal>,
}

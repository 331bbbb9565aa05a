//! Database Models

// Serde helpers
pub mod serde_thing;

// Catalog
pub mod milestone;
pub mod store;

// Sessions
pub mod cart_session;
pub mod reward_history;

// Re-exports
pub use cart_session::{CartSession, CartSessionCreate};
pub use milestone::{
    DiscountType, Milestone, MilestoneCreate, MilestoneId, MilestoneStatus, MilestoneUpdate,
    RewardType,
};
pub use reward_history::RewardHistory;
pub use store::{Store, StoreCreate, StoreUpdate};

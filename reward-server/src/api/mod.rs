//! API route modules
//!
//! # Structure
//!
//! - [`health`] - liveness and database checks
//! - [`stores`] - store settings
//! - [`milestones`] - milestone catalog management
//! - [`cart_sessions`] - shopper session flow

pub mod health;

// Admin surface
pub mod milestones;
pub mod stores;

// Storefront surface
pub mod cart_sessions;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

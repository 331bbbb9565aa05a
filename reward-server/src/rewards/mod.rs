//! Milestone reward evaluation
//!
//! This module is the single authority for turning a cart value into the
//! set of unlocked milestones and the reward history that must follow.
//!
//! - [`evaluate`] - the pure threshold computation
//! - [`RewardService`] - the persistence-aware use cases built on top of it

pub mod evaluator;
pub mod service;

#[cfg(test)]
mod tests;

pub use evaluator::{EvaluationResult, evaluate};
pub use service::{CartValueUpdateOutcome, RewardService};

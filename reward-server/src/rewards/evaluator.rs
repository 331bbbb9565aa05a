//! Milestone evaluator
//!
//! Pure threshold computation, no storage access and no side effects. The
//! unlocked set is recomputed from scratch against the catalog on every
//! call, never derived incrementally from the previous set, so a
//! milestone edited or paused between two evaluations can never linger in
//! a session's unlocked set.

use rust_decimal::Decimal;
use std::collections::HashSet;
use surrealdb::sql::Thing;

use crate::db::models::{Milestone, MilestoneId};
use crate::utils::{AppError, AppResult};

/// Outcome of one evaluation
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    /// Ids of every milestone whose threshold the value reaches,
    /// ascending by threshold
    pub unlocked_now: Vec<MilestoneId>,
    /// Milestones crossing from locked to unlocked in this evaluation,
    /// ascending by threshold; reward history is emitted in this order
    pub newly_unlocked: Vec<Milestone>,
    /// Full records behind `unlocked_now`
    pub matched: Vec<Milestone>,
}

impl EvaluationResult {
    pub fn has_new_milestones(&self) -> bool {
        !self.newly_unlocked.is_empty()
    }
}

/// Compute the unlocked-milestone set for a cart value.
///
/// `active_milestones` is the store's active catalog in ascending threshold
/// order (as returned by `MilestoneRepository::find_active`). The threshold
/// comparison is inclusive: a cart exactly at the threshold unlocks it.
/// Comparison is decimal arithmetic throughout; cart values never touch a
/// binary float.
pub fn evaluate(
    active_milestones: &[Milestone],
    previous_unlocked: &[Thing],
    new_value: Decimal,
) -> AppResult<EvaluationResult> {
    if new_value.is_sign_negative() {
        return Err(AppError::validation(format!(
            "currentValue must be non-negative, got {new_value}"
        )));
    }

    let previous: HashSet<String> = previous_unlocked.iter().map(|t| t.to_string()).collect();

    let mut unlocked_now = Vec::new();
    let mut newly_unlocked = Vec::new();
    let mut matched = Vec::new();

    for milestone in active_milestones {
        if milestone.threshold_amount > new_value {
            continue;
        }
        // Records straight from the database always carry an id
        let Some(id) = milestone.id.clone() else {
            continue;
        };

        if !previous.contains(&id.to_string()) {
            newly_unlocked.push(milestone.clone());
        }
        unlocked_now.push(id);
        matched.push(milestone.clone());
    }

    Ok(EvaluationResult {
        unlocked_now,
        newly_unlocked,
        matched,
    })
}

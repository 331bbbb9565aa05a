//! Milestone API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::models::{Milestone, MilestoneCreate, MilestoneStatus, MilestoneUpdate};
use crate::db::repository::{MilestoneRepository, StoreRepository};
use crate::utils::validation::{MAX_NAME_LEN, validate_optional_text, validate_required_text};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Lifecycle filter (active | paused | deleted); absent means
    /// everything except deleted
    pub status: Option<String>,
}

/// Resolve a store id to its record id, 404 when unknown
async fn resolve_store(state: &ServerState, store_id: &str) -> AppResult<surrealdb::sql::Thing> {
    let repo = StoreRepository::new(state.get_db());
    let store = repo
        .find_by_id(store_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Store {} not found", store_id)))?;
    store
        .id
        .ok_or_else(|| AppError::internal("Persisted store has no id"))
}

/// GET /api/stores/:store_id/milestones - list the store's catalog
pub async fn list(
    State(state): State<ServerState>,
    Path(store_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Milestone>>> {
    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => Some(
            MilestoneStatus::parse(raw)
                .ok_or_else(|| AppError::validation(format!("Invalid status filter: {raw}")))?,
        ),
    };

    let store = resolve_store(&state, &store_id).await?;
    let repo = MilestoneRepository::new(state.get_db());
    let milestones = repo.find_by_status(&store, status).await?;
    Ok(Json(milestones))
}

/// POST /api/stores/:store_id/milestones - add a milestone to the catalog
pub async fn create(
    State(state): State<ServerState>,
    Path(store_id): Path<String>,
    Json(payload): Json<MilestoneCreate>,
) -> AppResult<Json<Milestone>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;

    let store = resolve_store(&state, &store_id).await?;
    let repo = MilestoneRepository::new(state.get_db());
    let milestone = repo.create(store, payload).await?;
    Ok(Json(milestone))
}

/// GET /api/milestones/:id - fetch a single milestone
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Milestone>> {
    let repo = MilestoneRepository::new(state.get_db());
    let milestone = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Milestone {} not found", id)))?;
    Ok(Json(milestone))
}

/// PUT /api/milestones/:id - update milestone fields
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<MilestoneUpdate>,
) -> AppResult<Json<Milestone>> {
    validate_optional_text(&payload.name, "name", MAX_NAME_LEN)?;

    let repo = MilestoneRepository::new(state.get_db());
    let milestone = repo.update(&id, payload).await?;
    Ok(Json(milestone))
}

/// DELETE /api/milestones/:id - soft delete
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = MilestoneRepository::new(state.get_db());
    let result = repo.soft_delete(&id).await?;
    Ok(Json(result))
}

/// POST /api/milestones/:id/pause - exclude from evaluation, keep the record
pub async fn pause(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Milestone>> {
    let repo = MilestoneRepository::new(state.get_db());
    let milestone = repo.set_status(&id, MilestoneStatus::Paused).await?;
    Ok(Json(milestone))
}

/// POST /api/milestones/:id/resume - put a paused milestone back in play
pub async fn resume(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Milestone>> {
    let repo = MilestoneRepository::new(state.get_db());
    let milestone = repo.set_status(&id, MilestoneStatus::Active).await?;
    Ok(Json(milestone))
}

/// POST /api/milestones/:id/duplicate - copy under a derived name
pub async fn duplicate(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Milestone>> {
    let repo = MilestoneRepository::new(state.get_db());
    let milestone = repo.duplicate(&id).await?;
    Ok(Json(milestone))
}

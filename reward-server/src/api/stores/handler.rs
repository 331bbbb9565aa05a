//! Store API handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::models::{Store, StoreCreate, StoreUpdate};
use crate::db::repository::StoreRepository;
use crate::utils::validation::{MAX_NAME_LEN, validate_optional_text, validate_required_text};
use crate::utils::{AppError, AppResult};

/// POST /api/stores - register a store
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<StoreCreate>,
) -> AppResult<Json<Store>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    if let Some(fee) = payload.delivery_fee {
        crate::utils::validation::validate_non_negative_amount(fee, "deliveryFee")?;
    }

    let repo = StoreRepository::new(state.get_db());
    let store = repo.create(payload).await?;
    Ok(Json(store))
}

/// GET /api/stores/:id - fetch store settings
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Store>> {
    let repo = StoreRepository::new(state.get_db());
    let store = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Store {} not found", id)))?;
    Ok(Json(store))
}

/// PUT /api/stores/:id - update store settings
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<StoreUpdate>,
) -> AppResult<Json<Store>> {
    validate_optional_text(&payload.name, "name", MAX_NAME_LEN)?;
    if let Some(fee) = payload.delivery_fee {
        crate::utils::validation::validate_non_negative_amount(fee, "deliveryFee")?;
    }

    let repo = StoreRepository::new(state.get_db());
    let store = repo.update(&id, payload).await?;
    Ok(Json(store))
}

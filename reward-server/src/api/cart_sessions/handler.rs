//! Cart Session API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::models::{CartSession, CartSessionCreate, Milestone, RewardHistory};
use crate::utils::AppResult;

/// PUT body for a cart value report
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueUpdateRequest {
    pub current_value: Decimal,
}

/// PUT body for a free-product selection
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRequest {
    pub product_ids: Vec<String>,
}

/// Response to a value update: the stored session plus the evaluation delta
/// the widget animates on.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueUpdateResponse {
    pub session: CartSession,
    /// True when this update crossed at least one threshold
    pub new_milestones: bool,
    /// Every milestone unlocked at the new value, ascending by threshold
    pub unlocked_milestones: Vec<Milestone>,
}

/// POST /api/cart-sessions - open (or re-open) a session for a cart token
pub async fn open(
    State(state): State<ServerState>,
    Json(payload): Json<CartSessionCreate>,
) -> AppResult<Json<CartSession>> {
    let session = state.reward_service().open_session(payload).await?;
    Ok(Json(session))
}

/// GET /api/cart-sessions/:token - current session state
pub async fn get_session(
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> AppResult<Json<CartSession>> {
    let session = state.reward_service().get_session(&token).await?;
    Ok(Json(session))
}

/// PUT /api/cart-sessions/:token/value - report a new cart value
pub async fn update_value(
    State(state): State<ServerState>,
    Path(token): Path<String>,
    Json(payload): Json<ValueUpdateRequest>,
) -> AppResult<Json<ValueUpdateResponse>> {
    let outcome = state
        .reward_service()
        .apply_cart_value_update(&token, payload.current_value)
        .await?;

    Ok(Json(ValueUpdateResponse {
        session: outcome.session,
        new_milestones: outcome.has_new_milestones,
        unlocked_milestones: outcome.unlocked_milestones,
    }))
}

/// PUT /api/cart-sessions/:token/free-products - overwrite the selection
pub async fn update_free_products(
    State(state): State<ServerState>,
    Path(token): Path<String>,
    Json(payload): Json<SelectionRequest>,
) -> AppResult<Json<CartSession>> {
    let session = state
        .reward_service()
        .apply_free_product_selection(&token, payload.product_ids)
        .await?;
    Ok(Json(session))
}

/// GET /api/cart-sessions/:token/rewards - reward history, oldest first
pub async fn list_rewards(
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> AppResult<Json<Vec<RewardHistory>>> {
    let rewards = state.reward_service().list_session_rewards(&token).await?;
    Ok(Json(rewards))
}

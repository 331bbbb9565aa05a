//! Milestone API module
//!
//! Catalog management is store scoped: listing and creation hang off
//! `/api/stores/{store_id}/milestones`, record-level operations off
//! `/api/milestones/{id}`.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/stores/{store_id}/milestones", store_routes())
        .nest("/api/milestones", record_routes())
}

fn store_routes() -> Router<ServerState> {
    Router::new().route("/", get(handler::list).post(handler::create))
}

fn record_routes() -> Router<ServerState> {
    Router::new()
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/pause", post(handler::pause))
        .route("/{id}/resume", post(handler::resume))
        .route("/{id}/duplicate", post(handler::duplicate))
}

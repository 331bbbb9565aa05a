//! Cart Session API module
//!
//! Storefront-facing surface: sessions are addressed by the client
//! generated cart token, never by record id.

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart-sessions", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::open))
        .route("/{token}", get(handler::get_session))
        .route("/{token}/value", put(handler::update_value))
        .route("/{token}/free-products", put(handler::update_free_products))
        .route("/{token}/rewards", get(handler::list_rewards))
}

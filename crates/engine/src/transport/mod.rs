// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the challenge engine.

pub mod auth;
pub mod http;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::EngineState;

/// Build the axum `Router` with all engine routes.
pub fn build_router(state: Arc<EngineState>) -> Router {
    Router::new()
        // Health (no auth)
        .route("/api/v1/health", get(http::health))
        // Challenge lifecycle
        .route("/api/v1/challenges/{id}", get(http::get_challenge))
        .route("/api/v1/challenges/{id}/approve", post(http::approve_challenge))
        .route("/api/v1/challenges/{id}/disapprove", post(http::disapprove_challenge))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), auth::auth_layer))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

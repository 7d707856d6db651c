// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers;
use crate::server::AppState;

/// Relay routes without state or middleware
pub fn relay_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/chat", post(handlers::chat))
        .route("/api/analyze-pdf", post(handlers::analyze_pdf))
}

/// Complete application: routes, body limit, CORS and request tracing.
pub fn build_router(state: AppState, max_body_mb: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    relay_routes()
        .layer(DefaultBodyLimit::max(max_body_mb.saturating_mul(1024 * 1024)))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

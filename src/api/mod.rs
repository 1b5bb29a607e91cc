//! API routes and handlers
//!
//! This module defines all API endpoints and their routing.

use axum::{routing::get, Router};

use crate::AppState;

mod establishments;
mod health;
mod registry;

pub use health::*;

/// Public API routes (no session required)
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/detailed", get(health::health_check_detailed))
}

/// Session-scoped API routes
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .nest("/establishments", establishments::routes())
        .nest("/registry", registry::routes())
}

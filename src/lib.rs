//! Pharmacy Registry Library
//!
//! Registration and lifecycle of pharmacy establishments, validated against
//! a read-only reference registry and audited on every committed change.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

pub use config::AppConfig;
pub use db::DbPool;
pub use middleware::{auth_middleware, trace_requests, Claims};
pub use services::{MutationPipeline, ReferenceRegistry, TraceRecorder};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Operational store pool
    pub db: DbPool,
    /// Establishment mutation pipeline
    pub pipeline: Arc<MutationPipeline>,
    /// Request trace recorder
    pub tracer: TraceRecorder,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DbPool,
        registry: Arc<dyn ReferenceRegistry>,
        tracer: TraceRecorder,
    ) -> Self {
        let pipeline = MutationPipeline::new(
            db.clone(),
            registry,
            config.database.statement_timeout(),
        );
        Self {
            config,
            db,
            pipeline: Arc::new(pipeline),
            tracer,
        }
    }
}

/// Mount the API under `/api/v1` with session and trace middleware on the
/// protected routes.
pub fn app_router(state: AppState) -> axum::Router {
    axum::Router::new()
        .nest("/api/v1", api::public_routes())
        .nest(
            "/api/v1",
            api::protected_routes()
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    middleware::trace_requests,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    middleware::auth_middleware,
                )),
        )
        .with_state(state)
}

//! Request trace middleware
//!
//! Hands (method, route, actor, origin) to the trace recorder after the
//! response is produced. Must sit inside the session middleware so the
//! [`ActorContext`] is already present.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use crate::{models::ActorContext, AppState};

pub async fn trace_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let (actor_id, origin) = request
        .extensions()
        .get::<ActorContext>()
        .map(|ctx| (ctx.actor_id, ctx.origin.clone()))
        .unwrap_or_default();

    let response = next.run(request).await;

    state.tracer.trace(&method, &route, actor_id, origin);
    response
}

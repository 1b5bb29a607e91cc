//! JWT session middleware
//!
//! Turns the bearer token into an [`ActorContext`] carried in request
//! extensions. A request without a token proceeds as anonymous and is
//! rejected later by the access guard; a token that fails to decode is
//! rejected here.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{models::ActorContext, utils::error::ErrorResponse, AppState};

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (actor ID)
    pub sub: String,
    /// Organization the actor is currently working in
    #[serde(default)]
    pub organization_id: Option<String>,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

impl Claims {
    fn into_context(self) -> Result<ActorContext, AuthError> {
        let actor_id = Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken)?;
        let organization_id = self
            .organization_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|_| AuthError::InvalidToken)?;
        Ok(ActorContext::new(actor_id, organization_id))
    }
}

/// Authentication error types
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    InvalidToken,
    TokenExpired,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::InvalidToken => "Invalid authentication token",
            AuthError::TokenExpired => "Authentication token has expired",
        };

        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("unauthenticated", message)),
        )
            .into_response()
    }
}

/// Create a session token for an actor working in `organization_id`
pub fn create_session_token(
    actor_id: &Uuid,
    organization_id: Option<&Uuid>,
    secret: &str,
    expiry_hours: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::hours(expiry_hours as i64);

    let claims = Claims {
        sub: actor_id.to_string(),
        organization_id: organization_id.map(|id| id.to_string()),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate and decode a session token
pub fn validate_token(token: &str, secret: &str, leeway_secs: u64) -> Result<Claims, AuthError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = leeway_secs;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })
}

/// Extract bearer token from Authorization header
fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
}

/// Client address: first hop of X-Forwarded-For, else the socket peer
pub fn request_origin(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

/// Session middleware
///
/// Inserts an [`ActorContext`] into request extensions for every request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let origin = request_origin(request.headers(), peer);

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|h| extract_bearer_token(h).ok_or(AuthError::InvalidToken))
        .transpose()?;

    let mut ctx = match token {
        Some(token) => validate_token(
            token,
            &state.config.auth.jwt_secret,
            state.config.auth.leeway_secs,
        )?
        .into_context()?,
        None => {
            debug!("Request carries no session token");
            ActorContext::default()
        }
    };
    ctx.origin = origin;

    request.extensions_mut().insert(ctx);

    Ok(next.run(request).await)
}

/// Extractor for the session context
///
/// Falls back to an anonymous context when the middleware did not run.
impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<ActorContext>()
            .cloned()
            .unwrap_or_default())
    }
}

//! Error types and handling
//!
//! `PipelineError` is the tagged outcome of every establishment operation.
//! `AppError` is what the HTTP layer returns; every variant maps to a
//! consistent JSON response body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn, Level};

use crate::models::Capability;

/// Tagged failure of a mutation pipeline call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// No actor in the session
    #[error("no authenticated actor")]
    Unauthenticated,

    /// Actor has not selected an organization
    #[error("no active organization selected")]
    NoActiveTenant,

    /// Role in the active organization lacks the capability
    #[error("missing capability '{}'", .0.as_str())]
    Forbidden(Capability),

    /// Identifier failed the format or checksum check
    #[error("invalid {field}: {value}")]
    InvalidDocument { field: &'static str, value: String },

    /// Identifier is not present in the reference registry
    #[error("{kind} {id} not found in reference registry")]
    UnknownIdentity { kind: &'static str, id: String },

    /// Identifier exists in the reference registry but is not active
    #[error("{kind} {id} is {status} in reference registry")]
    InactiveIdentity {
        kind: &'static str,
        id: String,
        status: &'static str,
    },

    /// Establishment does not exist
    #[error("establishment {0} not found")]
    NotFound(String),

    /// Establishment already registered
    #[error("establishment {0} already exists")]
    AlreadyExists(String),

    /// A store could not be reached or timed out
    #[error("store unavailable: {0}")]
    TransportFailure(String),

    /// The atomic state-plus-audit write failed and was rolled back
    #[error("commit failed: {0}")]
    ConflictOnCommit(String),
}

impl PipelineError {
    /// Whether the caller may safely retry the same request
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::TransportFailure(_) | PipelineError::ConflictOnCommit(_)
        )
    }

    /// Stable tag for logs and response bodies
    pub fn tag(&self) -> &'static str {
        match self {
            PipelineError::Unauthenticated => "unauthenticated",
            PipelineError::NoActiveTenant => "no_active_tenant",
            PipelineError::Forbidden(_) => "forbidden",
            PipelineError::InvalidDocument { .. } => "invalid_document",
            PipelineError::UnknownIdentity { .. } => "unknown_identity",
            PipelineError::InactiveIdentity { .. } => "inactive_identity",
            PipelineError::NotFound(_) => "not_found",
            PipelineError::AlreadyExists(_) => "already_exists",
            PipelineError::TransportFailure(_) => "transport_failure",
            PipelineError::ConflictOnCommit(_) => "conflict_on_commit",
        }
    }
}

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Pipeline outcome, carrying its own status mapping
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unprocessable entity - validation failed (422)
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }
}

/// Error response body
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Whether the same request may be retried
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            retryable: false,
            details: None,
        }
    }

    /// Add details to the error response
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }
}

fn pipeline_status(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::Unauthenticated => StatusCode::UNAUTHORIZED,
        PipelineError::NoActiveTenant | PipelineError::Forbidden(_) => StatusCode::FORBIDDEN,
        PipelineError::InvalidDocument { .. }
        | PipelineError::UnknownIdentity { .. }
        | PipelineError::InactiveIdentity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
        PipelineError::AlreadyExists(_) => StatusCode::CONFLICT,
        PipelineError::ConflictOnCommit(_) => StatusCode::CONFLICT,
        PipelineError::TransportFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Level a pipeline outcome is logged at, if at all. Store and transport
/// failures are errors; access denials are expected and only warned about.
fn pipeline_log_level(err: &PipelineError) -> Option<Level> {
    match err {
        PipelineError::TransportFailure(_) | PipelineError::ConflictOnCommit(_) => {
            Some(Level::ERROR)
        }
        PipelineError::NoActiveTenant | PipelineError::Forbidden(_) => Some(Level::WARN),
        _ => None,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, retryable) = match &self {
            AppError::Pipeline(err) => (pipeline_status(err), err.tag(), err.is_retryable()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", false),
            AppError::ValidationError(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", false)
            }
        };

        if let AppError::Pipeline(err) = &self {
            match pipeline_log_level(err) {
                Some(Level::ERROR) => {
                    error!(error = %err, error_type = error_type, "Request error")
                }
                Some(_) => warn!(error = %err, error_type = error_type, "Request denied"),
                None => {}
            }
        }

        let mut body = ErrorResponse::new(error_type, self.to_string()).retryable(retryable);
        if let AppError::ValidationError(errors) = &self {
            if let Ok(fields) = serde_json::to_value(errors.field_errors()) {
                body = body.with_details(fields);
            }
        }

        (status, Json(body)).into_response()
    }
}

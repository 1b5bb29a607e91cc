//! Middleware components
//!
//! This module contains middleware for:
//! - Session resolution (JWT)
//! - Request tracing

pub mod auth;
pub mod request_trace;

pub use auth::{auth_middleware, create_session_token, Claims};
pub use request_trace::trace_requests;

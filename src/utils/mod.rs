//! Utility modules

pub mod error;
pub mod validation;

pub use error::{AppError, ErrorResponse, PipelineError};

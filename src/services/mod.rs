//! Business logic services

pub mod audit;
pub mod http_registry;
pub mod pipeline;
pub mod rbac;
pub mod registry;
pub mod sql_registry;
pub mod trace;

pub use audit::AuditRecorder;
pub use http_registry::HttpReferenceRegistry;
pub use pipeline::MutationPipeline;
pub use rbac::{capabilities_for, AccessGuard};
pub use registry::{ReferenceRegistry, RegistryError};
pub use sql_registry::SqlReferenceRegistry;
pub use trace::TraceRecorder;

//! Data models

mod audit;
mod establishment;
mod identity;
mod organization;
mod trace;

pub use audit::*;
pub use establishment::*;
pub use identity::*;
pub use organization::*;
pub use trace::*;

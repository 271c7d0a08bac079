//! # Domain Layer
//!
//! Student records, templates, vector documents and the error type.
//! This layer is independent of external frameworks and infrastructure.

mod error;
pub mod models;

pub use error::*;
pub use models::*;

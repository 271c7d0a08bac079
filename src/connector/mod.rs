//! # Connector Layer
//!
//! Adapters for the record store, vector stores, embedding models and LLM
//! APIs, plus the CLI container, router and controllers.

pub mod adapter;
pub mod api;

pub use adapter::*;
pub use api::*;

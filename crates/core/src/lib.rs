//! `stocksense-core` — shared domain primitives.
//!
//! This crate contains **pure domain** building blocks (no infrastructure
//! concerns): strongly-typed identifiers and the shared error model.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::ItemId;

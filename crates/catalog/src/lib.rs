//! Catalog domain module.
//!
//! The item catalog as seen by the analysis engine: a per-item snapshot of
//! on-hand stock and replenishment attributes. Read-only from the engine's
//! point of view; the external store owns the durable state.

pub mod item;

pub use item::Item;

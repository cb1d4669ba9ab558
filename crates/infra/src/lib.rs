//! `stocksense-infra`
//!
//! Infrastructure implementations of the engine's store ports, plus the
//! analysis runner that owns a pipeline and re-runs it on a schedule.
//!
//! The in-memory store is intended for tests and development; production
//! backends implement the same traits against a real document store.

pub mod memory;
pub mod runner;

pub use memory::InMemoryStore;
pub use runner::{AnalysisRunner, AnalysisRunnerHandle};

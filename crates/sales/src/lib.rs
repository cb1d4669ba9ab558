//! Sales domain module.
//!
//! This crate contains the sale-event wire type and the pure aggregation
//! step that reduces raw line items into per-item quantity totals. No IO,
//! no HTTP, no storage.

pub mod aggregate;
pub mod event;

pub use aggregate::{NoSalesData, SalesAggregates, aggregate};
pub use event::{SaleEvent, SaleLine};

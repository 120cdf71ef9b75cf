//! tasklist core - list reconciliation with no I/O
//!
//! This crate holds the domain types, the reconciliation state (collection
//! store, aggregate counters, grouping, pagination) and the ports (traits)
//! the application needs from the outside world. HTTP, config files and the
//! terminal are handled by adapters in `tasklist-app`.

pub mod domain;
pub mod ports;
pub mod app;
pub mod error;

// Re-exports for ergonomics
pub use domain::*;
pub use error::*;

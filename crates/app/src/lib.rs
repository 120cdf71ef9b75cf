//! tasklist application library
//!
//! Adapters for the core ports, the controller service that drives the
//! reconciliation state, and the line-oriented UI on top of it.

pub mod adapters;
pub mod services;
pub mod ui;

//! Department roster engine: position approval, cascade unassignment,
//! structure versioning, reconciliation, and reporting-line views, plus
//! the axum service shell that exposes them.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;

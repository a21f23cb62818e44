//! # Metrics Module
//!
//! Prometheus metrics for harness runs, organized by responsibility.
//!
//! ## Sub-modules
//!
//! - `registry` - Metrics registry setup, registration and text exposition
//! - `harness_metrics` - Checks, oracle lookups and scenario outcomes

pub mod harness_metrics;
pub mod registry;

pub use harness_metrics::*;
pub use registry::*;

//! # Observability
//!
//! Prometheus metrics for harness runs. Logging goes through `tracing` directly.

pub mod metrics;

//! # Harness Configuration
//!
//! Harness-level configuration loaded from environment variables.
//!
//! All configuration has sensible defaults and can be overridden via environment variables.
//! A configuration value is passed explicitly into every runner and oracle; nothing in the
//! harness reads process-wide state after startup.

mod harness;

pub use harness::{Capability, HarnessConfig};

/// Load configuration from environment variables with defaults
pub fn load_config() -> HarnessConfig {
    HarnessConfig::from_env()
}

//! # Simulated Backend
//!
//! An in-memory Service API and a lifecycle driver on top of it, so every scenario
//! can run without a live cluster or a declarative engine. The cluster implements
//! [`crate::oracle::ServiceLookup`], so the oracle reads it exactly like a real API.

mod cluster;
mod driver;

pub use cluster::{ClusterError, InMemoryCluster};
pub use driver::SimulatedDriver;

use crate::config::HarnessConfig;
use crate::oracle::{ServiceLookup, ServiceOracle};
use crate::scenario::LifecycleRunner;
use std::sync::Arc;

/// Runner wired to a fresh in-memory cluster, plus a handle on that cluster
pub fn simulated_runner(config: &HarnessConfig) -> (LifecycleRunner, Arc<InMemoryCluster>) {
    let cluster = Arc::new(InMemoryCluster::new(config.load_balancers_available));
    let driver = SimulatedDriver::new(Arc::clone(&cluster), config.namespace.clone());
    let lookup: Arc<dyn ServiceLookup> = Arc::clone(&cluster) as Arc<dyn ServiceLookup>;
    let oracle = ServiceOracle::new(lookup, config.destroy_check_mode());
    let runner = LifecycleRunner::new(Arc::new(driver), oracle, config.clone());
    (runner, cluster)
}

//! # Service Lifecycle Harness
//!
//! Lifecycle verification for a declaratively managed Kubernetes `Service`.
//!
//! ## Overview
//!
//! The harness checks that declarative configuration produces the expected remote
//! objects across a full lifecycle:
//!
//! 1. **Fixtures** - typed `kubernetes_service` fixtures rendered deterministically
//!    into configuration documents ([`fixture`])
//! 2. **Apply** - a [`scenario::LifecycleDriver`] converges the remote system on each
//!    document and reports the tracked state
//! 3. **Observe** - the [`oracle`] reads the object straight from the API, independent
//!    of the engine's view
//! 4. **Verify** - attribute, port-list and identity-continuity checks ([`verify`],
//!    [`continuity`])
//! 5. **Destroy** - everything is torn down and absence confirmed against the API
//!
//! ## Backends
//!
//! - **Live cluster**: [`oracle::KubeServiceLookup`] over `kube::Api<Service>`
//! - **Simulated**: [`simulated::InMemoryCluster`] and [`simulated::SimulatedDriver`]
//!   run every scenario without a cluster
//!
//! ## Usage
//!
//! See the [README.md](../README.md) for the `svcharness` CLI.

pub mod config;
pub mod constants;
pub mod continuity;
pub mod error;
pub mod fixture;
pub mod identity;
pub mod observability;
pub mod oracle;
pub mod resource;
pub mod scenario;
pub mod simulated;
pub mod state;
pub mod verify;

pub use config::HarnessConfig;
pub use error::HarnessError;
pub use identity::ResourceIdentity;

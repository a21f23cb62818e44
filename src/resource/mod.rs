//! # Service Resource Model
//!
//! Typed view of a remote Service: port bindings and enums, the observed snapshot,
//! and the flattened attribute view used for attribute checks.

pub mod attributes;
pub mod observed;
pub mod types;

pub use attributes::{flatten, Attributes};
pub use observed::{IngressPoint, ObservedMetadata, ObservedResource, ObservedSpec, ObservedStatus};
pub use types::{ExternalTrafficPolicy, PortBinding, ServiceType, SessionAffinity, TargetPort};

//! # Constants
//!
//! Default values shared across the harness. Every value here can be overridden
//! through [`crate::config::HarnessConfig`] unless noted otherwise.

/// Resource kind of a managed Service in the declarative engine's state
pub const SERVICE_RESOURCE_KIND: &str = "kubernetes_service";

/// Block label used by every generated fixture
pub const DEFAULT_RESOURCE_LABEL: &str = "test";

/// Separator between namespace and name in an opaque resource ID
pub const IDENTIFIER_SEPARATOR: char = '/';

/// Namespace used when a fixture does not set one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Prefix for randomly named test resources
pub const DEFAULT_NAME_PREFIX: &str = "tf-acc-test";

/// Prefix handed to the API server for generated names
pub const DEFAULT_GENERATED_NAME_PREFIX: &str = "tf-acc-test-gen-";

/// Length of the random alphanumeric suffix appended to test resource names
pub const DEFAULT_RANDOM_SUFFIX_LEN: usize = 10;

/// Provider alias pinned to the last released provider build
pub const DEFAULT_RELEASED_PROVIDER: &str = "kubernetes-released";

/// Provider alias pointing at the locally built provider
pub const DEFAULT_LOCAL_PROVIDER: &str = "kubernetes-local";

/// Registry source of the released provider
pub const RELEASED_PROVIDER_SOURCE: &str = "hashicorp/kubernetes";

/// Version constraint for the released provider
pub const DEFAULT_RELEASED_PROVIDER_VERSION: &str = "1.13.3";

/// Registry source of the locally built provider (not overridable)
pub const LOCAL_PROVIDER_SOURCE: &str = "localhost/test/kubernetes";

/// Placeholder reported for attributes absent from a state
pub const UNSET_ATTRIBUTE: &str = "<unset>";

/// Default protocol assigned by the API server to ports without one
pub const DEFAULT_PROTOCOL: &str = "TCP";

/// First port of the node port allocation range
pub const NODE_PORT_RANGE_START: i32 = 30000;

/// Last port of the node port allocation range
pub const NODE_PORT_RANGE_END: i32 = 32767;

/// Length of the random suffix the simulated API server appends to generated names
pub const GENERATED_NAME_SUFFIX_LEN: usize = 5;

/// Health-check node port pinned by the load balancer health-check fixtures
pub const DEFAULT_HEALTHCHECK_NODE_PORT: i32 = 31111;

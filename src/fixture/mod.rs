//! # Fixture Generator
//!
//! Typed builder for `kubernetes_service` fixtures. A fixture is plain data; it is
//! rendered into a declarative configuration document by [`render`] and converted into
//! the equivalent API object by [`manifest`]. Rendering is deterministic: the same
//! fixture always yields byte-identical text.
//!
//! ## Example
//!
//! ```
//! use service_lifecycle_harness::fixture::{PortSpec, ServiceFixture};
//!
//! let fixture = ServiceFixture::named("web")
//!     .label("app", "web")
//!     .port(PortSpec::new(8080).target(80));
//! assert!(fixture.render().contains("target_port = 80"));
//! ```

pub mod manifest;
pub mod render;
pub mod variants;

use crate::config::HarnessConfig;
use crate::constants::{
    DEFAULT_RESOURCE_LABEL, LOCAL_PROVIDER_SOURCE, RELEASED_PROVIDER_SOURCE, SERVICE_RESOURCE_KIND,
};
use crate::resource::{ExternalTrafficPolicy, ServiceType, SessionAffinity, TargetPort};
use std::collections::BTreeMap;

/// How the resource is named
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceName {
    /// Fixed `metadata.name`
    Explicit(String),
    /// `metadata.generate_name` prefix; the API server picks the rest
    Generated(String),
}

/// `provider` meta-argument of a resource block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderRef {
    /// Bare reference, `provider = kubernetes-local`
    Reference(String),
    /// Legacy quoted form, `provider = "kubernetes-local"`
    Quoted(String),
}

impl ProviderRef {
    pub fn alias(&self) -> &str {
        match self {
            ProviderRef::Reference(alias) | ProviderRef::Quoted(alias) => alias,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureMetadata {
    pub name: ResourceName,
    pub namespace: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

/// One `port` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    pub name: Option<String>,
    pub port: i32,
    pub target_port: Option<TargetPort>,
    pub protocol: Option<String>,
    pub node_port: Option<i32>,
}

impl PortSpec {
    pub fn new(port: i32) -> Self {
        Self {
            name: None,
            port,
            target_port: None,
            protocol: None,
            node_port: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn target(mut self, target_port: impl Into<TargetPort>) -> Self {
        self.target_port = Some(target_port.into());
        self
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn node_port(mut self, node_port: i32) -> Self {
        self.node_port = Some(node_port);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FixtureSpec {
    pub service_type: Option<ServiceType>,
    pub ports: Vec<PortSpec>,
    pub selector: BTreeMap<String, String>,
    pub external_name: Option<String>,
    pub external_ips: Vec<String>,
    pub load_balancer_ip: Option<String>,
    pub load_balancer_source_ranges: Vec<String>,
    pub session_affinity: Option<SessionAffinity>,
    pub external_traffic_policy: Option<ExternalTrafficPolicy>,
    pub health_check_node_port: Option<i32>,
    pub publish_not_ready_addresses: Option<bool>,
}

/// Desired state of one `kubernetes_service` resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFixture {
    /// Block label, the `test` in `kubernetes_service.test`
    pub block_label: String,
    pub provider: Option<ProviderRef>,
    pub metadata: FixtureMetadata,
    pub spec: FixtureSpec,
    /// Engine-side setting with no counterpart on the remote object
    pub wait_for_load_balancer: Option<bool>,
}

impl ServiceFixture {
    fn with_name(name: ResourceName) -> Self {
        Self {
            block_label: DEFAULT_RESOURCE_LABEL.to_string(),
            provider: None,
            metadata: FixtureMetadata {
                name,
                namespace: None,
                labels: BTreeMap::new(),
                annotations: BTreeMap::new(),
            },
            spec: FixtureSpec::default(),
            wait_for_load_balancer: None,
        }
    }

    /// Fixture with a fixed name
    pub fn named(name: impl Into<String>) -> Self {
        Self::with_name(ResourceName::Explicit(name.into()))
    }

    /// Fixture whose name the API server generates from `prefix`
    pub fn generated(prefix: impl Into<String>) -> Self {
        Self::with_name(ResourceName::Generated(prefix.into()))
    }

    /// Engine address, `kubernetes_service.<label>`
    pub fn address(&self) -> String {
        format!("{SERVICE_RESOURCE_KIND}.{}", self.block_label)
    }

    pub fn block_label(mut self, label: impl Into<String>) -> Self {
        self.block_label = label.into();
        self
    }

    pub fn provider(mut self, provider: ProviderRef) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.metadata.namespace = Some(namespace.into());
        self
    }

    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.labels.insert(key.into(), value.into());
        self
    }

    pub fn annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.annotations.insert(key.into(), value.into());
        self
    }

    pub fn service_type(mut self, service_type: ServiceType) -> Self {
        self.spec.service_type = Some(service_type);
        self
    }

    pub fn port(mut self, port: PortSpec) -> Self {
        self.spec.ports.push(port);
        self
    }

    pub fn selector(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.selector.insert(key.into(), value.into());
        self
    }

    pub fn external_name(mut self, external_name: impl Into<String>) -> Self {
        self.spec.external_name = Some(external_name.into());
        self
    }

    pub fn external_ips<I, S>(mut self, ips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.external_ips = ips.into_iter().map(Into::into).collect();
        self
    }

    pub fn load_balancer_ip(mut self, ip: impl Into<String>) -> Self {
        self.spec.load_balancer_ip = Some(ip.into());
        self
    }

    pub fn load_balancer_source_ranges<I, S>(mut self, ranges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.load_balancer_source_ranges = ranges.into_iter().map(Into::into).collect();
        self
    }

    pub fn session_affinity(mut self, affinity: SessionAffinity) -> Self {
        self.spec.session_affinity = Some(affinity);
        self
    }

    pub fn external_traffic_policy(mut self, policy: ExternalTrafficPolicy) -> Self {
        self.spec.external_traffic_policy = Some(policy);
        self
    }

    pub fn health_check_node_port(mut self, node_port: i32) -> Self {
        self.spec.health_check_node_port = Some(node_port);
        self
    }

    pub fn publish_not_ready_addresses(mut self, publish: bool) -> Self {
        self.spec.publish_not_ready_addresses = Some(publish);
        self
    }

    pub fn wait_for_load_balancer(mut self, wait: bool) -> Self {
        self.wait_for_load_balancer = Some(wait);
        self
    }

    /// Render the resource block
    pub fn render(&self) -> String {
        render::render_service(self)
    }
}

/// Source and version pin of one required provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSource {
    pub source: String,
    pub version: Option<String>,
}

/// `terraform { required_providers { ... } }` preamble
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProviderRequirements {
    pub providers: BTreeMap<String, ProviderSource>,
}

impl ProviderRequirements {
    /// Released and locally built providers side by side, for cross-version steps
    pub fn released_and_local(config: &HarnessConfig) -> Self {
        let mut providers = BTreeMap::new();
        providers.insert(
            config.released_provider.clone(),
            ProviderSource {
                source: RELEASED_PROVIDER_SOURCE.to_string(),
                version: Some(config.released_provider_version.clone()),
            },
        );
        providers.insert(
            config.local_provider.clone(),
            ProviderSource {
                source: LOCAL_PROVIDER_SOURCE.to_string(),
                version: None,
            },
        );
        Self { providers }
    }
}

/// Complete configuration document handed to the lifecycle driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureDocument {
    pub providers: Option<ProviderRequirements>,
    pub service: ServiceFixture,
}

impl FixtureDocument {
    pub fn new(service: ServiceFixture) -> Self {
        Self {
            providers: None,
            service,
        }
    }

    pub fn with_providers(mut self, providers: ProviderRequirements) -> Self {
        self.providers = Some(providers);
        self
    }

    /// Render preamble (if any) followed by the resource block
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(providers) = &self.providers {
            out.push_str(&render::render_requirements(providers));
            out.push('\n');
        }
        out.push_str(&self.service.render());
        out
    }
}

impl From<ServiceFixture> for FixtureDocument {
    fn from(service: ServiceFixture) -> Self {
        Self::new(service)
    }
}

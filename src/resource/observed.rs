//! # Observed Resource
//!
//! Point-in-time snapshot of a remote Service, read straight from the API.
//! Snapshots are built once and never mutated; a new observation replaces the old one.

use super::types::PortBinding;
use crate::identity::ResourceIdentity;
use k8s_openapi::api::core::v1::Service;
use std::collections::BTreeMap;

/// Snapshot of a remote Service
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObservedResource {
    pub metadata: ObservedMetadata,
    pub spec: ObservedSpec,
    pub status: ObservedStatus,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObservedMetadata {
    pub name: String,
    pub namespace: String,
    pub generate_name: String,
    pub uid: String,
    pub generation: i64,
    pub resource_version: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObservedSpec {
    pub ports: Vec<PortBinding>,
    pub selector: BTreeMap<String, String>,
    pub service_type: String,
    pub cluster_ip: String,
    pub external_name: String,
    pub external_ips: Vec<String>,
    pub load_balancer_ip: String,
    pub load_balancer_source_ranges: Vec<String>,
    pub session_affinity: String,
    pub external_traffic_policy: String,
    pub health_check_node_port: i32,
    pub publish_not_ready_addresses: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObservedStatus {
    pub load_balancer_ingress: Vec<IngressPoint>,
}

/// One load-balancer ingress entry
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IngressPoint {
    pub ip: String,
    pub hostname: String,
}

impl ObservedResource {
    /// `{namespace, name}` the API reported for this object
    pub fn identity(&self) -> ResourceIdentity {
        ResourceIdentity::new(&self.metadata.namespace, &self.metadata.name)
    }

    pub fn uid(&self) -> &str {
        &self.metadata.uid
    }
}

impl From<&Service> for ObservedResource {
    fn from(service: &Service) -> Self {
        let meta = &service.metadata;
        let metadata = ObservedMetadata {
            name: meta.name.clone().unwrap_or_default(),
            namespace: meta.namespace.clone().unwrap_or_default(),
            generate_name: meta.generate_name.clone().unwrap_or_default(),
            uid: meta.uid.clone().unwrap_or_default(),
            generation: meta.generation.unwrap_or_default(),
            resource_version: meta.resource_version.clone().unwrap_or_default(),
            labels: meta.labels.clone().unwrap_or_default(),
            annotations: meta.annotations.clone().unwrap_or_default(),
        };

        let spec = service
            .spec
            .as_ref()
            .map(|spec| ObservedSpec {
                ports: spec
                    .ports
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .map(PortBinding::from)
                    .collect(),
                selector: spec.selector.clone().unwrap_or_default(),
                service_type: spec.type_.clone().unwrap_or_default(),
                // "None" marks a headless service and is reported verbatim
                cluster_ip: spec.cluster_ip.clone().unwrap_or_default(),
                external_name: spec.external_name.clone().unwrap_or_default(),
                external_ips: spec.external_ips.clone().unwrap_or_default(),
                load_balancer_ip: spec.load_balancer_ip.clone().unwrap_or_default(),
                load_balancer_source_ranges: spec
                    .load_balancer_source_ranges
                    .clone()
                    .unwrap_or_default(),
                session_affinity: spec.session_affinity.clone().unwrap_or_default(),
                external_traffic_policy: spec.external_traffic_policy.clone().unwrap_or_default(),
                health_check_node_port: spec.health_check_node_port.unwrap_or_default(),
                publish_not_ready_addresses: spec.publish_not_ready_addresses.unwrap_or_default(),
            })
            .unwrap_or_default();

        let status = ObservedStatus {
            load_balancer_ingress: service
                .status
                .as_ref()
                .and_then(|s| s.load_balancer.as_ref())
                .and_then(|lb| lb.ingress.as_ref())
                .map(|ingress| {
                    ingress
                        .iter()
                        .map(|point| IngressPoint {
                            ip: point.ip.clone().unwrap_or_default(),
                            hostname: point.hostname.clone().unwrap_or_default(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        };

        Self {
            metadata,
            spec,
            status,
        }
    }
}

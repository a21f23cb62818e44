//! # Fixture Manifests
//!
//! Converts a fixture into the `v1/Service` object the declarative engine would submit.

use super::{ResourceName, ServiceFixture};
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

fn non_empty_map(map: &BTreeMap<String, String>) -> Option<BTreeMap<String, String>> {
    (!map.is_empty()).then(|| map.clone())
}

fn non_empty_list(list: &[String]) -> Option<Vec<String>> {
    (!list.is_empty()).then(|| list.to_vec())
}

impl ServiceFixture {
    /// Build the API object for this fixture
    ///
    /// `default_namespace` applies when the fixture does not set a namespace.
    pub fn to_manifest(&self, default_namespace: &str) -> Service {
        let (name, generate_name) = match &self.metadata.name {
            ResourceName::Explicit(name) => (Some(name.clone()), None),
            ResourceName::Generated(prefix) => (None, Some(prefix.clone())),
        };

        let metadata = ObjectMeta {
            name,
            generate_name,
            namespace: Some(
                self.metadata
                    .namespace
                    .clone()
                    .unwrap_or_else(|| default_namespace.to_string()),
            ),
            labels: non_empty_map(&self.metadata.labels),
            annotations: non_empty_map(&self.metadata.annotations),
            ..Default::default()
        };

        let spec = &self.spec;
        let ports: Vec<ServicePort> = spec
            .ports
            .iter()
            .map(|port| ServicePort {
                name: port.name.clone(),
                port: port.port,
                protocol: port.protocol.clone(),
                target_port: port.target_port.as_ref().map(IntOrString::from),
                node_port: port.node_port,
                ..Default::default()
            })
            .collect();

        Service {
            metadata,
            spec: Some(ServiceSpec {
                type_: spec.service_type.map(|t| t.as_str().to_string()),
                ports: (!ports.is_empty()).then_some(ports),
                selector: non_empty_map(&spec.selector),
                external_name: spec.external_name.clone(),
                external_ips: non_empty_list(&spec.external_ips),
                load_balancer_ip: spec.load_balancer_ip.clone(),
                load_balancer_source_ranges: non_empty_list(&spec.load_balancer_source_ranges),
                session_affinity: spec.session_affinity.map(|a| a.as_str().to_string()),
                external_traffic_policy: spec
                    .external_traffic_policy
                    .map(|p| p.as_str().to_string()),
                health_check_node_port: spec.health_check_node_port,
                publish_not_ready_addresses: spec.publish_not_ready_addresses,
                ..Default::default()
            }),
            status: None,
        }
    }
}

//! # Flattened Attributes
//!
//! Renders an [`ObservedResource`] into the flat key scheme the declarative engine
//! keeps in its state: `metadata.0.name`, `spec.0.port.#`, `spec.0.selector.App`, ...
//!
//! Lists carry a `.#` count and maps a `.%` count. Absent integers flatten to `"0"`,
//! absent strings to `""`, booleans to `"true"`/`"false"`.

use super::observed::ObservedResource;
use std::collections::BTreeMap;

/// Flat attribute view of one resource
pub type Attributes = BTreeMap<String, String>;

struct AttributeWriter {
    attributes: Attributes,
}

impl AttributeWriter {
    fn new() -> Self {
        Self {
            attributes: Attributes::new(),
        }
    }

    fn scalar(&mut self, key: impl Into<String>, value: impl ToString) {
        self.attributes.insert(key.into(), value.to_string());
    }

    fn list(&mut self, key: &str, values: &[String]) {
        self.scalar(format!("{key}.#"), values.len());
        for (index, value) in values.iter().enumerate() {
            self.scalar(format!("{key}.{index}"), value);
        }
    }

    fn map(&mut self, key: &str, values: &BTreeMap<String, String>) {
        self.scalar(format!("{key}.%"), values.len());
        for (k, v) in values {
            self.scalar(format!("{key}.{k}"), v);
        }
    }
}

/// Flatten a snapshot into state attributes
pub fn flatten(observed: &ObservedResource) -> Attributes {
    let mut w = AttributeWriter::new();
    let meta = &observed.metadata;
    let spec = &observed.spec;

    w.scalar("id", observed.identity());

    w.scalar("metadata.#", 1);
    w.map("metadata.0.annotations", &meta.annotations);
    w.scalar("metadata.0.generate_name", &meta.generate_name);
    w.scalar("metadata.0.generation", meta.generation);
    w.map("metadata.0.labels", &meta.labels);
    w.scalar("metadata.0.name", &meta.name);
    w.scalar("metadata.0.namespace", &meta.namespace);
    w.scalar("metadata.0.resource_version", &meta.resource_version);
    w.scalar("metadata.0.uid", &meta.uid);

    w.scalar("spec.#", 1);
    w.scalar("spec.0.cluster_ip", &spec.cluster_ip);
    w.list("spec.0.external_ips", &spec.external_ips);
    w.scalar("spec.0.external_name", &spec.external_name);
    w.scalar("spec.0.external_traffic_policy", &spec.external_traffic_policy);
    w.scalar("spec.0.health_check_node_port", spec.health_check_node_port);
    w.scalar("spec.0.load_balancer_ip", &spec.load_balancer_ip);
    w.list(
        "spec.0.load_balancer_source_ranges",
        &spec.load_balancer_source_ranges,
    );
    w.scalar("spec.0.port.#", spec.ports.len());
    for (index, port) in spec.ports.iter().enumerate() {
        let prefix = format!("spec.0.port.{index}");
        w.scalar(
            format!("{prefix}.name"),
            port.name.as_deref().unwrap_or_default(),
        );
        w.scalar(format!("{prefix}.node_port"), port.node_port.unwrap_or(0));
        w.scalar(format!("{prefix}.port"), port.port);
        w.scalar(format!("{prefix}.protocol"), &port.protocol);
        w.scalar(
            format!("{prefix}.target_port"),
            port.target_port
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        );
    }
    w.scalar(
        "spec.0.publish_not_ready_addresses",
        spec.publish_not_ready_addresses,
    );
    w.map("spec.0.selector", &spec.selector);
    w.scalar("spec.0.session_affinity", &spec.session_affinity);
    w.scalar("spec.0.type", &spec.service_type);

    let ingress = &observed.status.load_balancer_ingress;
    w.scalar("status.#", 1);
    w.scalar("status.0.load_balancer.#", 1);
    w.scalar("status.0.load_balancer.0.ingress.#", ingress.len());
    for (index, point) in ingress.iter().enumerate() {
        let prefix = format!("status.0.load_balancer.0.ingress.{index}");
        w.scalar(format!("{prefix}.hostname"), &point.hostname);
        w.scalar(format!("{prefix}.ip"), &point.ip);
    }

    w.attributes
}

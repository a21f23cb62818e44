//! # Fixture Rendering
//!
//! Writes fixtures as HCL. Every string value goes through [`escape`], so fixture
//! parameters can never close a string early or open a template interpolation.
//! Consecutive attributes are aligned on `=` and items are separated by a blank line.

use super::{PortSpec, ProviderRef, ProviderRequirements, ResourceName, ServiceFixture};
use crate::constants::SERVICE_RESOURCE_KIND;
use crate::resource::TargetPort;
use std::collections::BTreeMap;

const INDENT: &str = "  ";

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<String>),
    Raw(String),
}

impl Value {
    fn str(value: &str) -> Self {
        Value::Str(value.to_string())
    }

    fn render(&self) -> String {
        match self {
            Value::Str(s) => quote(s),
            Value::Int(i) => i.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::List(items) => {
                let rendered: Vec<String> = items.iter().map(|s| quote(s)).collect();
                format!("[{}]", rendered.join(", "))
            }
            Value::Raw(raw) => raw.clone(),
        }
    }
}

#[derive(Debug)]
enum Item {
    Attrs(Vec<(String, Value)>),
    Object {
        key: String,
        entries: Vec<(String, Value)>,
    },
    Block {
        header: String,
        items: Vec<Item>,
    },
}

/// Escape a string for use inside an HCL quoted string
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            other => out.push(other),
        }
    }
    out
}

fn quote(value: &str) -> String {
    format!("\"{}\"", escape(value))
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Object keys stay bare when they are identifiers and are quoted otherwise
fn render_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

fn render_provider(provider: &ProviderRef) -> Value {
    match provider {
        ProviderRef::Reference(alias)
            if alias.split('.').count() <= 2 && alias.split('.').all(is_identifier) =>
        {
            Value::Raw(alias.clone())
        }
        other => Value::str(other.alias()),
    }
}

fn string_map(key: &str, values: &BTreeMap<String, String>) -> Option<Item> {
    (!values.is_empty()).then(|| Item::Object {
        key: key.to_string(),
        entries: values
            .iter()
            .map(|(k, v)| (render_key(k), Value::str(v)))
            .collect(),
    })
}

fn push_attrs(items: &mut Vec<Item>, attrs: Vec<(String, Value)>) {
    if !attrs.is_empty() {
        items.push(Item::Attrs(attrs));
    }
}

fn metadata_block(fixture: &ServiceFixture) -> Item {
    let metadata = &fixture.metadata;
    let mut items = Vec::new();
    items.extend(string_map("annotations", &metadata.annotations));
    items.extend(string_map("labels", &metadata.labels));

    let mut attrs = Vec::new();
    match &metadata.name {
        ResourceName::Explicit(name) => attrs.push(("name".to_string(), Value::str(name))),
        ResourceName::Generated(prefix) => {
            attrs.push(("generate_name".to_string(), Value::str(prefix)));
        }
    }
    if let Some(namespace) = &metadata.namespace {
        attrs.push(("namespace".to_string(), Value::str(namespace)));
    }
    push_attrs(&mut items, attrs);

    Item::Block {
        header: "metadata".to_string(),
        items,
    }
}

fn port_block(port: &PortSpec) -> Item {
    let mut attrs = Vec::new();
    if let Some(name) = &port.name {
        attrs.push(("name".to_string(), Value::str(name)));
    }
    if let Some(node_port) = port.node_port {
        attrs.push(("node_port".to_string(), Value::Int(i64::from(node_port))));
    }
    attrs.push(("port".to_string(), Value::Int(i64::from(port.port))));
    if let Some(protocol) = &port.protocol {
        attrs.push(("protocol".to_string(), Value::str(protocol)));
    }
    if let Some(target) = &port.target_port {
        let value = match target {
            TargetPort::Number(n) => Value::Int(i64::from(*n)),
            TargetPort::Named(name) => Value::str(name),
        };
        attrs.push(("target_port".to_string(), value));
    }
    Item::Block {
        header: "port".to_string(),
        items: vec![Item::Attrs(attrs)],
    }
}

fn spec_block(fixture: &ServiceFixture) -> Item {
    let spec = &fixture.spec;
    let mut items = Vec::new();

    let mut attrs = Vec::new();
    if let Some(external_name) = &spec.external_name {
        attrs.push(("external_name".to_string(), Value::str(external_name)));
    }
    if !spec.external_ips.is_empty() {
        attrs.push((
            "external_ips".to_string(),
            Value::List(spec.external_ips.clone()),
        ));
    }
    if let Some(ip) = &spec.load_balancer_ip {
        attrs.push(("load_balancer_ip".to_string(), Value::str(ip)));
    }
    if !spec.load_balancer_source_ranges.is_empty() {
        attrs.push((
            "load_balancer_source_ranges".to_string(),
            Value::List(spec.load_balancer_source_ranges.clone()),
        ));
    }
    if let Some(policy) = spec.external_traffic_policy {
        attrs.push((
            "external_traffic_policy".to_string(),
            Value::str(policy.as_str()),
        ));
    }
    if let Some(node_port) = spec.health_check_node_port {
        attrs.push((
            "health_check_node_port".to_string(),
            Value::Int(i64::from(node_port)),
        ));
    }
    if let Some(affinity) = spec.session_affinity {
        attrs.push(("session_affinity".to_string(), Value::str(affinity.as_str())));
    }
    if let Some(publish) = spec.publish_not_ready_addresses {
        attrs.push(("publish_not_ready_addresses".to_string(), Value::Bool(publish)));
    }
    push_attrs(&mut items, attrs);

    items.extend(string_map("selector", &spec.selector));
    items.extend(spec.ports.iter().map(port_block));

    if let Some(service_type) = spec.service_type {
        items.push(Item::Attrs(vec![(
            "type".to_string(),
            Value::str(service_type.as_str()),
        )]));
    }

    Item::Block {
        header: "spec".to_string(),
        items,
    }
}

fn write_attrs(out: &mut String, attrs: &[(String, Value)], depth: usize) {
    let width = attrs.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in attrs {
        out.push_str(&INDENT.repeat(depth));
        out.push_str(&format!("{key:<width$} = {}\n", value.render()));
    }
}

fn write_item(out: &mut String, item: &Item, depth: usize) {
    match item {
        Item::Attrs(attrs) => write_attrs(out, attrs, depth),
        Item::Object { key, entries } => {
            out.push_str(&format!("{}{key} = {{\n", INDENT.repeat(depth)));
            write_attrs(out, entries, depth + 1);
            out.push_str(&format!("{}}}\n", INDENT.repeat(depth)));
        }
        Item::Block { header, items } => write_block(out, header, items, depth),
    }
}

fn write_block(out: &mut String, header: &str, items: &[Item], depth: usize) {
    out.push_str(&format!("{}{header} {{\n", INDENT.repeat(depth)));
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        write_item(out, item, depth + 1);
    }
    out.push_str(&format!("{}}}\n", INDENT.repeat(depth)));
}

/// Render the `resource "kubernetes_service" "<label>"` block
pub fn render_service(fixture: &ServiceFixture) -> String {
    let mut items = Vec::new();
    if let Some(provider) = &fixture.provider {
        items.push(Item::Attrs(vec![(
            "provider".to_string(),
            render_provider(provider),
        )]));
    }
    items.push(metadata_block(fixture));
    items.push(spec_block(fixture));
    if let Some(wait) = fixture.wait_for_load_balancer {
        items.push(Item::Attrs(vec![(
            "wait_for_load_balancer".to_string(),
            Value::Bool(wait),
        )]));
    }

    let header = format!(
        "resource {} {}",
        quote(SERVICE_RESOURCE_KIND),
        quote(&fixture.block_label)
    );
    let mut out = String::new();
    write_block(&mut out, &header, &items, 0);
    out
}

/// Render the `terraform { required_providers { ... } }` preamble
pub fn render_requirements(requirements: &ProviderRequirements) -> String {
    let providers = requirements
        .providers
        .iter()
        .map(|(name, source)| {
            let mut entries = vec![("source".to_string(), Value::str(&source.source))];
            if let Some(version) = &source.version {
                entries.push(("version".to_string(), Value::str(version)));
            }
            Item::Object {
                key: render_key(name),
                entries,
            }
        })
        .collect();

    let items = vec![Item::Block {
        header: "required_providers".to_string(),
        items: providers,
    }];
    let mut out = String::new();
    write_block(&mut out, "terraform", &items, 0);
    out
}

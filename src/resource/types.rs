//! # Service Types
//!
//! Port bindings and the enumerations a Service spec carries.

use crate::constants::DEFAULT_PROTOCOL;
use k8s_openapi::api::core::v1::ServicePort;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Port on the selected pods, either a number or a named container port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetPort {
    Number(i32),
    Named(String),
}

impl fmt::Display for TargetPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetPort::Number(port) => write!(f, "{port}"),
            TargetPort::Named(name) => f.write_str(name),
        }
    }
}

impl From<i32> for TargetPort {
    fn from(port: i32) -> Self {
        TargetPort::Number(port)
    }
}

impl From<&str> for TargetPort {
    fn from(name: &str) -> Self {
        TargetPort::Named(name.to_string())
    }
}

impl From<&IntOrString> for TargetPort {
    fn from(value: &IntOrString) -> Self {
        match value {
            IntOrString::Int(port) => TargetPort::Number(*port),
            IntOrString::String(name) => TargetPort::Named(name.clone()),
        }
    }
}

impl From<&TargetPort> for IntOrString {
    fn from(value: &TargetPort) -> Self {
        match value {
            TargetPort::Number(port) => IntOrString::Int(*port),
            TargetPort::Named(name) => IntOrString::String(name.clone()),
        }
    }
}

/// One entry of a Service's ordered port list
///
/// `node_port` is allocated by the API server and is never part of an expectation;
/// compare through [`PortBinding::without_allocation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    pub name: Option<String>,
    pub port: i32,
    pub protocol: String,
    pub target_port: Option<TargetPort>,
    pub node_port: Option<i32>,
}

impl PortBinding {
    /// TCP binding from `port` to `target_port`
    pub fn tcp(port: i32, target_port: impl Into<TargetPort>) -> Self {
        Self {
            name: None,
            port,
            protocol: DEFAULT_PROTOCOL.to_string(),
            target_port: Some(target_port.into()),
            node_port: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Copy with the system-assigned node port cleared
    pub fn without_allocation(&self) -> Self {
        Self {
            node_port: None,
            ..self.clone()
        }
    }
}

impl From<&ServicePort> for PortBinding {
    fn from(port: &ServicePort) -> Self {
        Self {
            name: port.name.clone().filter(|n| !n.is_empty()),
            port: port.port,
            protocol: port
                .protocol
                .clone()
                .unwrap_or_else(|| DEFAULT_PROTOCOL.to_string()),
            target_port: port.target_port.as_ref().map(TargetPort::from),
            node_port: port.node_port.filter(|p| *p != 0),
        }
    }
}

/// Service type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceType {
    #[default]
    ClusterIp,
    NodePort,
    LoadBalancer,
    ExternalName,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::ClusterIp => "ClusterIP",
            ServiceType::NodePort => "NodePort",
            ServiceType::LoadBalancer => "LoadBalancer",
            ServiceType::ExternalName => "ExternalName",
        }
    }

    /// Parse the API server's spelling
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ClusterIP" => Some(ServiceType::ClusterIp),
            "NodePort" => Some(ServiceType::NodePort),
            "LoadBalancer" => Some(ServiceType::LoadBalancer),
            "ExternalName" => Some(ServiceType::ExternalName),
            _ => None,
        }
    }

    /// Whether the API server allocates node ports for this type
    pub fn allocates_node_ports(&self) -> bool {
        matches!(self, ServiceType::NodePort | ServiceType::LoadBalancer)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session affinity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionAffinity {
    #[default]
    None,
    ClientIp,
}

impl SessionAffinity {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionAffinity::None => "None",
            SessionAffinity::ClientIp => "ClientIP",
        }
    }
}

/// External traffic policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExternalTrafficPolicy {
    #[default]
    Cluster,
    Local,
}

impl ExternalTrafficPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalTrafficPolicy::Cluster => "Cluster",
            ExternalTrafficPolicy::Local => "Local",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_binding_from_service_port_defaults_protocol() {
        let port = ServicePort {
            port: 8080,
            target_port: Some(IntOrString::Int(80)),
            node_port: Some(31000),
            ..Default::default()
        };
        let binding = PortBinding::from(&port);
        assert_eq!(binding.protocol, "TCP");
        assert_eq!(binding.node_port, Some(31000));
        assert_eq!(binding.without_allocation(), PortBinding::tcp(8080, 80));
    }

    #[test]
    fn test_empty_port_name_is_unset() {
        let port = ServicePort {
            name: Some(String::new()),
            port: 80,
            protocol: Some("TCP".to_string()),
            target_port: Some(IntOrString::String("http".to_string())),
            ..Default::default()
        };
        let binding = PortBinding::from(&port);
        assert_eq!(binding.name, None);
        assert_eq!(binding.target_port, Some(TargetPort::Named("http".to_string())));
    }

    #[test]
    fn test_target_port_display() {
        assert_eq!(TargetPort::from(80).to_string(), "80");
        assert_eq!(TargetPort::from("http-server").to_string(), "http-server");
    }

    #[test]
    fn test_service_type_parse() {
        for ty in [
            ServiceType::ClusterIp,
            ServiceType::NodePort,
            ServiceType::LoadBalancer,
            ServiceType::ExternalName,
        ] {
            assert_eq!(ServiceType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(ServiceType::parse("Headless"), None);
        assert!(ServiceType::LoadBalancer.allocates_node_ports());
        assert!(!ServiceType::ClusterIp.allocates_node_ports());
    }
}

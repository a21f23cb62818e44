//! # In-Memory Cluster
//!
//! A namespaced Service store that applies the API server defaults and allocations
//! the lifecycle scenarios observe: cluster IPs, node ports, health-check node ports,
//! load-balancer ingress, UIDs, generations and resource versions.

use crate::constants::{
    DEFAULT_NAMESPACE, DEFAULT_PROTOCOL, GENERATED_NAME_SUFFIX_LEN, NODE_PORT_RANGE_END,
    NODE_PORT_RANGE_START,
};
use crate::identity::{random_suffix, ResourceIdentity};
use crate::oracle::{LookupError, ServiceLookup};
use crate::resource::{ExternalTrafficPolicy, ServiceType, SessionAffinity};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{
    LoadBalancerIngress, LoadBalancerStatus, Service, ServiceSpec, ServiceStatus,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::debug;

/// Rejection by the in-memory API server
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterError {
    #[error("services \"{identity}\" not found")]
    NotFound { identity: String },

    #[error("services \"{identity}\" already exists")]
    AlreadyExists { identity: String },

    #[error("Service \"{identity}\" is invalid: {message}")]
    Invalid { identity: String, message: String },

    #[error("no node ports left in range {}-{}", NODE_PORT_RANGE_START, NODE_PORT_RANGE_END)]
    NodePortsExhausted,
}

#[derive(Debug, Default)]
struct ClusterState {
    services: BTreeMap<ResourceIdentity, Service>,
    lookup_failure: Option<String>,
    resource_version: u64,
    cluster_ips_issued: u32,
    ingress_ips_issued: u32,
    next_node_port: i32,
}

impl ClusterState {
    fn next_resource_version(&mut self) -> String {
        self.resource_version += 1;
        self.resource_version.to_string()
    }

    fn allocate_cluster_ip(&mut self) -> String {
        let n = self.cluster_ips_issued;
        self.cluster_ips_issued += 1;
        format!("10.96.{}.{}", n / 250, n % 250 + 1)
    }

    fn allocate_ingress_ip(&mut self) -> String {
        let n = self.ingress_ips_issued;
        self.ingress_ips_issued += 1;
        format!("203.0.{}.{}", 113 + n / 250, n % 250 + 1)
    }

    /// Node ports (service and health-check) held by objects other than `except`
    fn node_ports_in_use(&self, except: &ResourceIdentity) -> BTreeSet<i32> {
        self.services
            .iter()
            .filter(|(identity, _)| *identity != except)
            .filter_map(|(_, service)| service.spec.as_ref())
            .flat_map(|spec| {
                let ports = spec
                    .ports
                    .iter()
                    .flatten()
                    .filter_map(|port| port.node_port);
                ports.chain(spec.health_check_node_port)
            })
            .collect()
    }

    fn allocate_node_port(&mut self, taken: &mut BTreeSet<i32>) -> Result<i32, ClusterError> {
        let span = NODE_PORT_RANGE_END - NODE_PORT_RANGE_START + 1;
        let start = self.next_node_port.clamp(0, span - 1);
        for offset in 0..span {
            let candidate = NODE_PORT_RANGE_START + (start + offset) % span;
            if taken.insert(candidate) {
                self.next_node_port = (start + offset + 1) % span;
                return Ok(candidate);
            }
        }
        Err(ClusterError::NodePortsExhausted)
    }
}

/// In-memory Service API
#[derive(Debug)]
pub struct InMemoryCluster {
    state: Mutex<ClusterState>,
    load_balancers: bool,
}

impl Default for InMemoryCluster {
    fn default() -> Self {
        Self::new(true)
    }
}

impl InMemoryCluster {
    /// `load_balancers` controls whether LoadBalancer services get an ingress address
    pub fn new(load_balancers: bool) -> Self {
        Self {
            state: Mutex::new(ClusterState::default()),
            load_balancers,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ClusterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every lookup fail with a transport error until [`Self::restore_lookups`]
    pub fn fail_lookups(&self, message: impl Into<String>) {
        self.lock().lookup_failure = Some(message.into());
    }

    pub fn restore_lookups(&self) {
        self.lock().lookup_failure = None;
    }

    pub fn len(&self) -> usize {
        self.lock().services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read an object directly, bypassing lookup fault injection
    pub fn fetch(&self, identity: &ResourceIdentity) -> Option<Service> {
        self.lock().services.get(identity).cloned()
    }

    /// Create a new Service
    ///
    /// A missing name is generated from `generateName`; a missing namespace is `default`.
    pub fn create(&self, mut service: Service) -> Result<Service, ClusterError> {
        let mut state = self.lock();

        let namespace = service
            .metadata
            .namespace
            .clone()
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let name = match (&service.metadata.name, &service.metadata.generate_name) {
            (Some(name), _) if !name.is_empty() => name.clone(),
            (_, Some(prefix)) if !prefix.is_empty() => {
                format!("{prefix}{}", random_suffix(GENERATED_NAME_SUFFIX_LEN))
            }
            _ => {
                return Err(ClusterError::Invalid {
                    identity: format!("{namespace}/"),
                    message: "metadata.name: Required value: name or generateName is required"
                        .to_string(),
                })
            }
        };
        let identity = ResourceIdentity::new(&namespace, &name);
        if state.services.contains_key(&identity) {
            return Err(ClusterError::AlreadyExists {
                identity: identity.id(),
            });
        }

        let mut spec = service.spec.take().unwrap_or_default();
        let status = self.default_spec(&mut state, &identity, &mut spec, None, None)?;

        service.metadata.name = Some(name);
        service.metadata.namespace = Some(namespace);
        service.metadata.uid = Some(uuid::Uuid::new_v4().to_string());
        service.metadata.generation = Some(1);
        service.metadata.resource_version = Some(state.next_resource_version());
        service.spec = Some(spec);
        service.status = Some(status);

        debug!(identity = %identity, "Created service");
        state.services.insert(identity, service.clone());
        Ok(service)
    }

    /// Replace the mutable parts of an existing Service
    ///
    /// UID and cluster IP are kept. Node ports are kept for ports whose number did
    /// not change. Generation bumps only when the spec changed.
    pub fn update(&self, mut service: Service) -> Result<Service, ClusterError> {
        let mut state = self.lock();

        let identity = ResourceIdentity::new(
            service
                .metadata
                .namespace
                .clone()
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            service.metadata.name.clone().unwrap_or_default(),
        );
        let existing = state
            .services
            .get(&identity)
            .cloned()
            .ok_or_else(|| ClusterError::NotFound {
                identity: identity.id(),
            })?;

        let previous_spec = existing.spec.clone().unwrap_or_default();
        let mut spec = service.spec.take().unwrap_or_default();
        let status = self.default_spec(
            &mut state,
            &identity,
            &mut spec,
            Some(&previous_spec),
            existing.status.as_ref(),
        )?;

        let generation = existing.metadata.generation.unwrap_or(1);
        service.metadata = k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
            labels: service.metadata.labels.take(),
            annotations: service.metadata.annotations.take(),
            generation: Some(if spec == previous_spec {
                generation
            } else {
                generation + 1
            }),
            resource_version: Some(state.next_resource_version()),
            ..existing.metadata
        };
        service.spec = Some(spec);
        service.status = Some(status);

        debug!(identity = %identity, "Updated service");
        state.services.insert(identity, service.clone());
        Ok(service)
    }

    pub fn delete(&self, identity: &ResourceIdentity) -> Result<(), ClusterError> {
        match self.lock().services.remove(identity) {
            Some(_) => {
                debug!(identity = %identity, "Deleted service");
                Ok(())
            }
            None => Err(ClusterError::NotFound {
                identity: identity.id(),
            }),
        }
    }

    /// Validate `spec`, fill in defaults and allocations, and compute the status
    fn default_spec(
        &self,
        state: &mut ClusterState,
        identity: &ResourceIdentity,
        spec: &mut ServiceSpec,
        previous: Option<&ServiceSpec>,
        previous_status: Option<&ServiceStatus>,
    ) -> Result<ServiceStatus, ClusterError> {
        let invalid = |message: &str| ClusterError::Invalid {
            identity: identity.id(),
            message: message.to_string(),
        };

        let service_type = match spec.type_.as_deref() {
            None => ServiceType::ClusterIp,
            Some(value) => ServiceType::parse(value)
                .ok_or_else(|| invalid(&format!("spec.type: Unsupported value: \"{value}\"")))?,
        };
        spec.type_ = Some(service_type.as_str().to_string());

        if service_type == ServiceType::ExternalName {
            if spec.external_name.as_deref().unwrap_or_default().is_empty() {
                return Err(invalid("spec.externalName: Required value"));
            }
        } else if spec.ports.as_ref().is_none_or(Vec::is_empty) {
            return Err(invalid("spec.ports: Required value"));
        }

        if spec.session_affinity.is_none() {
            spec.session_affinity = Some(SessionAffinity::None.as_str().to_string());
        }

        if service_type.allocates_node_ports() {
            if spec.external_traffic_policy.is_none() {
                spec.external_traffic_policy =
                    Some(ExternalTrafficPolicy::Cluster.as_str().to_string());
            }
        } else if spec.external_traffic_policy.is_some() {
            return Err(invalid(
                "spec.externalTrafficPolicy: may only be set when `type` is 'NodePort' or 'LoadBalancer'",
            ));
        }

        // cluster IP
        if service_type == ServiceType::ExternalName {
            spec.cluster_ip = None;
            spec.cluster_ips = None;
        } else {
            let ip = previous
                .and_then(|p| p.cluster_ip.clone())
                .or_else(|| spec.cluster_ip.clone())
                .unwrap_or_else(|| state.allocate_cluster_ip());
            spec.cluster_ips = Some(vec![ip.clone()]);
            spec.cluster_ip = Some(ip);
        }

        // ports
        let mut taken = state.node_ports_in_use(identity);
        let previous_node_ports: BTreeMap<i32, i32> = previous
            .and_then(|p| p.ports.as_ref())
            .into_iter()
            .flatten()
            .filter_map(|port| port.node_port.map(|node_port| (port.port, node_port)))
            .collect();
        for port in spec.ports.iter_mut().flatten() {
            if port.protocol.is_none() {
                port.protocol = Some(DEFAULT_PROTOCOL.to_string());
            }
            if port.target_port.is_none() {
                port.target_port = Some(IntOrString::Int(port.port));
            }
            if !service_type.allocates_node_ports() {
                if port.node_port.is_some_and(|p| p != 0) {
                    return Err(invalid(
                        "spec.ports.nodePort: Forbidden: may not be used when `type` is 'ClusterIP'",
                    ));
                }
                port.node_port = None;
                continue;
            }
            port.node_port = match port.node_port.filter(|p| *p != 0) {
                Some(requested) => {
                    if !(NODE_PORT_RANGE_START..=NODE_PORT_RANGE_END).contains(&requested) {
                        return Err(invalid(
                            "spec.ports.nodePort: Invalid value: provided port is not in the valid range",
                        ));
                    }
                    if !taken.insert(requested) {
                        return Err(invalid(
                            "spec.ports.nodePort: Invalid value: provided port is already allocated",
                        ));
                    }
                    Some(requested)
                }
                None => match previous_node_ports.get(&port.port) {
                    Some(kept) if taken.insert(*kept) => Some(*kept),
                    _ => Some(state.allocate_node_port(&mut taken)?),
                },
            };
        }

        // health-check node port
        let local_load_balancer = service_type == ServiceType::LoadBalancer
            && spec.external_traffic_policy.as_deref()
                == Some(ExternalTrafficPolicy::Local.as_str());
        if local_load_balancer {
            let requested = spec.health_check_node_port.filter(|p| *p != 0);
            let kept = previous.and_then(|p| p.health_check_node_port).filter(|p| *p != 0);
            spec.health_check_node_port = Some(match requested.or(kept) {
                Some(port) if taken.insert(port) => port,
                Some(_) => {
                    return Err(invalid(
                        "spec.healthCheckNodePort: Invalid value: provided port is already allocated",
                    ))
                }
                None => state.allocate_node_port(&mut taken)?,
            });
        } else if spec.health_check_node_port.is_some_and(|p| p != 0) {
            return Err(invalid(
                "spec.healthCheckNodePort: Invalid value: may only be set when `type` is 'LoadBalancer' and `externalTrafficPolicy` is 'Local'",
            ));
        } else {
            spec.health_check_node_port = None;
        }

        // status
        let ingress = if service_type == ServiceType::LoadBalancer && self.load_balancers {
            let kept = previous_status
                .and_then(|s| s.load_balancer.as_ref())
                .and_then(|lb| lb.ingress.clone())
                .filter(|ingress| !ingress.is_empty());
            Some(kept.unwrap_or_else(|| {
                vec![LoadBalancerIngress {
                    ip: Some(state.allocate_ingress_ip()),
                    ..Default::default()
                }]
            }))
        } else {
            None
        };

        Ok(ServiceStatus {
            load_balancer: Some(LoadBalancerStatus {
                ingress,
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}

#[async_trait]
impl ServiceLookup for InMemoryCluster {
    async fn get(&self, identity: &ResourceIdentity) -> Result<Service, LookupError> {
        let state = self.lock();
        if let Some(message) = &state.lookup_failure {
            return Err(LookupError::Transport(message.clone()));
        }
        state
            .services
            .get(identity)
            .cloned()
            .ok_or(LookupError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::variants;

    fn create(cluster: &InMemoryCluster, fixture: crate::fixture::ServiceFixture) -> Service {
        cluster.create(fixture.to_manifest("default")).unwrap()
    }

    fn spec(service: &Service) -> &ServiceSpec {
        service.spec.as_ref().unwrap()
    }

    #[test]
    fn test_create_applies_defaults() {
        let cluster = InMemoryCluster::default();
        let service = create(&cluster, variants::basic("svc"));
        let spec = spec(&service);
        assert_eq!(spec.type_.as_deref(), Some("ClusterIP"));
        assert_eq!(spec.session_affinity.as_deref(), Some("None"));
        assert!(spec.cluster_ip.is_some());
        assert_eq!(spec.external_traffic_policy, None);

        let port = &spec.ports.as_ref().unwrap()[0];
        assert_eq!(port.protocol.as_deref(), Some("TCP"));
        assert_eq!(port.node_port, None);
        assert_eq!(service.metadata.generation, Some(1));
        assert!(service.metadata.uid.is_some());
    }

    #[test]
    fn test_target_port_defaults_to_port() {
        let cluster = InMemoryCluster::default();
        let service = create(&cluster, variants::no_target_port("svc"));
        let ports = spec(&service).ports.as_ref().unwrap();
        assert_eq!(ports[0].target_port, Some(IntOrString::Int(80)));
        assert_eq!(ports[1].target_port, Some(IntOrString::Int(443)));
        assert!(ports.iter().all(|p| p.node_port.is_some()));
    }

    #[test]
    fn test_load_balancer_gets_ingress_only_when_enabled() {
        let cluster = InMemoryCluster::new(true);
        let service = create(&cluster, variants::load_balancer("svc"));
        let ingress = service.status.unwrap().load_balancer.unwrap().ingress.unwrap();
        assert!(ingress[0].ip.is_some());
        let stored = cluster
            .fetch(&ResourceIdentity::new("default", "svc"))
            .unwrap();
        assert_eq!(spec(&stored).external_traffic_policy.as_deref(), Some("Cluster"));

        let cluster = InMemoryCluster::new(false);
        let service = create(&cluster, variants::load_balancer("svc"));
        assert!(service.status.unwrap().load_balancer.unwrap().ingress.is_none());
    }

    #[test]
    fn test_generated_name_gets_suffix() {
        let cluster = InMemoryCluster::default();
        let service = create(&cluster, variants::generated_name("gen-"));
        let name = service.metadata.name.unwrap();
        assert!(name.starts_with("gen-"));
        assert_eq!(name.len(), "gen-".len() + GENERATED_NAME_SUFFIX_LEN);
        assert_eq!(service.metadata.generate_name.as_deref(), Some("gen-"));
    }

    #[test]
    fn test_update_keeps_uid_and_bumps_generation_on_spec_change() {
        let cluster = InMemoryCluster::default();
        let created = create(&cluster, variants::basic("svc"));
        let updated = cluster
            .update(variants::modified("svc").to_manifest("default"))
            .unwrap();
        assert_eq!(updated.metadata.uid, created.metadata.uid);
        assert_eq!(updated.metadata.generation, Some(2));
        assert_eq!(spec(&updated).cluster_ip, spec(&created).cluster_ip);
        assert_ne!(
            updated.metadata.resource_version,
            created.metadata.resource_version
        );

        // metadata-only change keeps the generation
        let relabeled = cluster
            .update(
                variants::modified("svc")
                    .label("extra", "x")
                    .to_manifest("default"),
            )
            .unwrap();
        assert_eq!(relabeled.metadata.generation, Some(2));
        assert_eq!(relabeled.metadata.labels.unwrap()["extra"], "x");
    }

    #[test]
    fn test_update_keeps_node_port_for_unchanged_port() {
        let cluster = InMemoryCluster::default();
        let created = create(&cluster, variants::node_port("svc"));
        let before = spec(&created).ports.clone().unwrap();
        let updated = cluster
            .update(variants::node_port("svc").to_manifest("default"))
            .unwrap();
        assert_eq!(spec(&updated).ports.clone().unwrap(), before);
    }

    #[test]
    fn test_health_check_node_port_rules() {
        let cluster = InMemoryCluster::default();
        let service = create(&cluster, variants::load_balancer_healthcheck("svc", 31111));
        assert_eq!(spec(&service).health_check_node_port, Some(31111));

        let updated = cluster
            .update(variants::load_balancer_healthcheck("svc", 31112).to_manifest("default"))
            .unwrap();
        assert_eq!(spec(&updated).health_check_node_port, Some(31112));

        let err = cluster
            .create(
                variants::basic("other")
                    .health_check_node_port(31113)
                    .to_manifest("default"),
            )
            .unwrap_err();
        assert!(matches!(err, ClusterError::Invalid { .. }));
    }

    #[test]
    fn test_external_name_has_no_cluster_ip_and_needs_target() {
        let cluster = InMemoryCluster::default();
        let service = create(&cluster, variants::external_name("svc"));
        assert_eq!(spec(&service).cluster_ip, None);

        let err = cluster
            .create(
                crate::fixture::ServiceFixture::named("bad")
                    .service_type(ServiceType::ExternalName)
                    .to_manifest("default"),
            )
            .unwrap_err();
        assert!(err.to_string().contains("spec.externalName"));
    }

    #[test]
    fn test_create_rejects_duplicates_and_missing_ports() {
        let cluster = InMemoryCluster::default();
        create(&cluster, variants::basic("svc"));
        assert!(matches!(
            cluster.create(variants::basic("svc").to_manifest("default")),
            Err(ClusterError::AlreadyExists { .. })
        ));
        assert!(cluster
            .create(crate::fixture::ServiceFixture::named("bare").to_manifest("default"))
            .is_err());
        assert_eq!(cluster.len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_fault_injection() {
        let cluster = InMemoryCluster::default();
        create(&cluster, variants::basic("svc"));
        let identity = ResourceIdentity::new("default", "svc");
        assert!(ServiceLookup::get(&cluster, &identity).await.is_ok());

        cluster.fail_lookups("connection reset by peer");
        assert_eq!(
            ServiceLookup::get(&cluster, &identity).await.unwrap_err(),
            LookupError::Transport("connection reset by peer".to_string())
        );

        cluster.restore_lookups();
        cluster.delete(&identity).unwrap();
        assert_eq!(
            ServiceLookup::get(&cluster, &identity).await.unwrap_err(),
            LookupError::NotFound
        );
        assert!(cluster.delete(&identity).is_err());
    }
}

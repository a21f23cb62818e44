//! # Simulated Lifecycle Driver
//!
//! Converges fixtures onto an [`InMemoryCluster`] the way the declarative engine
//! would: create on first apply, update in place afterwards, delete and recreate when
//! an identifying field (name, namespace, generate-name) changes.

use super::cluster::{ClusterError, InMemoryCluster};
use crate::constants::SERVICE_RESOURCE_KIND;
use crate::error::HarnessError;
use crate::fixture::FixtureDocument;
use crate::identity::ResourceIdentity;
use crate::resource::{flatten, ObservedResource};
use crate::scenario::LifecycleDriver;
use crate::state::{TrackedResource, TrackedState};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use std::sync::Arc;
use tracing::{debug, info};

/// [`LifecycleDriver`] over an in-memory cluster
#[derive(Debug, Clone)]
pub struct SimulatedDriver {
    cluster: Arc<InMemoryCluster>,
    namespace: String,
}

impl SimulatedDriver {
    /// `namespace` applies to fixtures that do not set one
    pub fn new(cluster: Arc<InMemoryCluster>, namespace: impl Into<String>) -> Self {
        Self {
            cluster,
            namespace: namespace.into(),
        }
    }

    pub fn cluster(&self) -> &Arc<InMemoryCluster> {
        &self.cluster
    }
}

fn driver_error(address: &str, error: impl std::fmt::Display) -> HarnessError {
    HarnessError::Driver {
        address: address.to_string(),
        message: error.to_string(),
    }
}

/// Whether applying `desired` over the tracked object requires a new object
fn forces_replacement(
    desired: &Service,
    current: &ResourceIdentity,
    tracked: &TrackedResource,
) -> bool {
    let meta = &desired.metadata;
    let namespace_changed = meta.namespace.as_deref() != Some(current.namespace.as_str());
    let name_changed = meta
        .name
        .as_deref()
        .is_some_and(|name| name != current.name);
    let generate_name_changed = meta.generate_name.as_deref().unwrap_or_default()
        != tracked
            .attribute("metadata.0.generate_name")
            .unwrap_or_default();
    namespace_changed || name_changed || generate_name_changed
}

#[async_trait]
impl LifecycleDriver for SimulatedDriver {
    async fn apply(
        &self,
        document: &FixtureDocument,
        state: &mut TrackedState,
    ) -> Result<(), HarnessError> {
        let fixture = &document.service;
        let address = fixture.address();
        let mut desired = fixture.to_manifest(&self.namespace);

        let applied = match state.get(&address) {
            Some(tracked) => {
                let current = ResourceIdentity::parse(&tracked.id)?;
                if forces_replacement(&desired, &current, tracked) {
                    info!(
                        address = %address,
                        from = %current,
                        "Identifying field changed, replacing"
                    );
                    match self.cluster.delete(&current) {
                        Ok(()) | Err(ClusterError::NotFound { .. }) => {}
                        Err(e) => return Err(driver_error(&address, e)),
                    }
                    self.cluster.create(desired)
                } else {
                    // generated names stay as the server assigned them
                    desired.metadata.name = Some(current.name.clone());
                    self.cluster.update(desired)
                }
            }
            None => self.cluster.create(desired),
        }
        .map_err(|e| driver_error(&address, e))?;

        let observed = ObservedResource::from(&applied);
        let mut attributes = flatten(&observed);
        if let Some(wait) = fixture.wait_for_load_balancer {
            attributes.insert("wait_for_load_balancer".to_string(), wait.to_string());
        }
        debug!(address = %address, id = %observed.identity(), "Recorded state");
        state.insert(
            address,
            TrackedResource {
                kind: SERVICE_RESOURCE_KIND.to_string(),
                id: observed.identity().id(),
                attributes,
            },
        );
        Ok(())
    }

    async fn import(&self, kind: &str, id: &str) -> Result<TrackedResource, HarnessError> {
        if kind != SERVICE_RESOURCE_KIND {
            return Err(driver_error(id, format!("cannot import resources of kind {kind}")));
        }
        let identity = ResourceIdentity::parse(id)?;
        let service = self.cluster.fetch(&identity).ok_or_else(|| {
            driver_error(
                id,
                ClusterError::NotFound {
                    identity: identity.id(),
                },
            )
        })?;
        let observed = ObservedResource::from(&service);
        Ok(TrackedResource {
            kind: kind.to_string(),
            id: observed.identity().id(),
            attributes: flatten(&observed),
        })
    }

    async fn destroy(&self, state: &mut TrackedState) -> Result<(), HarnessError> {
        let addresses: Vec<String> = state.resources.keys().cloned().collect();
        for address in addresses {
            let Some(resource) = state.get(&address) else {
                continue;
            };
            if resource.kind == SERVICE_RESOURCE_KIND {
                let identity = ResourceIdentity::parse(&resource.id)?;
                match self.cluster.delete(&identity) {
                    Ok(()) => debug!(address = %address, "Destroyed"),
                    Err(ClusterError::NotFound { .. }) => {
                        debug!(address = %address, "Already gone");
                    }
                    Err(e) => return Err(driver_error(&address, e)),
                }
            }
            state.remove(&address);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{variants, ServiceFixture};

    fn driver() -> SimulatedDriver {
        SimulatedDriver::new(Arc::new(InMemoryCluster::default()), "default")
    }

    #[tokio::test]
    async fn test_apply_records_state() {
        let driver = driver();
        let mut state = TrackedState::default();
        driver
            .apply(&variants::basic("svc").into(), &mut state)
            .await
            .unwrap();
        let tracked = state.get("kubernetes_service.test").unwrap();
        assert_eq!(tracked.id, "default/svc");
        assert_eq!(tracked.attribute("metadata.0.name"), Some("svc"));
        assert_eq!(tracked.attribute("wait_for_load_balancer"), None);
    }

    #[tokio::test]
    async fn test_wait_for_load_balancer_is_state_only() {
        let driver = driver();
        let mut state = TrackedState::default();
        let fixture = variants::load_balancer("svc").wait_for_load_balancer(true);
        driver.apply(&fixture.into(), &mut state).await.unwrap();
        let tracked = state.get("kubernetes_service.test").unwrap();
        assert_eq!(tracked.attribute("wait_for_load_balancer"), Some("true"));

        let imported = driver
            .import(SERVICE_RESOURCE_KIND, "default/svc")
            .await
            .unwrap();
        assert_eq!(imported.attribute("wait_for_load_balancer"), None);
    }

    #[tokio::test]
    async fn test_rename_replaces_object() {
        let driver = driver();
        let mut state = TrackedState::default();
        driver
            .apply(&variants::basic("one").into(), &mut state)
            .await
            .unwrap();
        let first_uid = state
            .get("kubernetes_service.test")
            .unwrap()
            .attribute("metadata.0.uid")
            .map(str::to_string);

        driver
            .apply(&variants::basic("two").into(), &mut state)
            .await
            .unwrap();
        let tracked = state.get("kubernetes_service.test").unwrap();
        assert_eq!(tracked.id, "default/two");
        assert_ne!(tracked.attribute("metadata.0.uid").map(str::to_string), first_uid);
        assert!(driver
            .cluster()
            .fetch(&ResourceIdentity::new("default", "one"))
            .is_none());
    }

    #[tokio::test]
    async fn test_generated_name_survives_reapply() {
        let driver = driver();
        let mut state = TrackedState::default();
        let fixture = ServiceFixture::generated("gen-").port(crate::fixture::PortSpec::new(80));
        driver.apply(&fixture.clone().into(), &mut state).await.unwrap();
        let first = state.get("kubernetes_service.test").unwrap().clone();
        driver.apply(&fixture.into(), &mut state).await.unwrap();
        let second = state.get("kubernetes_service.test").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(
            first.attribute("metadata.0.uid"),
            second.attribute("metadata.0.uid")
        );
    }

    #[tokio::test]
    async fn test_destroy_clears_state_and_cluster() {
        let driver = driver();
        let mut state = TrackedState::default();
        driver
            .apply(&variants::basic("svc").into(), &mut state)
            .await
            .unwrap();
        driver.destroy(&mut state).await.unwrap();
        assert!(state.is_empty());
        assert!(driver.cluster().is_empty());

        // destroying again is a no-op
        driver.destroy(&mut state).await.unwrap();
    }

    #[tokio::test]
    async fn test_import_rejects_other_kinds() {
        let driver = driver();
        let err = driver
            .import("kubernetes_pod", "default/p")
            .await
            .unwrap_err();
        assert_eq!(err.as_str(), "driver");
    }
}

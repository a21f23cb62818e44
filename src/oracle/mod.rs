//! # Existence/Destruction Oracle
//!
//! Answers "does this service exist remotely right now?" by asking the API directly,
//! independent of anything the declarative engine believes.
//!
//! Lookups go through the [`ServiceLookup`] seam: [`KubeServiceLookup`] talks to a live
//! cluster, the in-memory cluster in [`crate::simulated`] backs tests.

mod live;

pub use live::KubeServiceLookup;

use crate::constants::SERVICE_RESOURCE_KIND;
use crate::error::HarnessError;
use crate::identity::ResourceIdentity;
use crate::observability::metrics;
use crate::resource::ObservedResource;
use crate::state::TrackedState;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Outcome of a failed raw lookup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The API reported that no such object exists
    #[error("not found")]
    NotFound,
    /// Any other failure: connectivity, authorization, server errors
    #[error("{0}")]
    Transport(String),
}

/// Direct read access to Services by `{namespace, name}`
#[async_trait]
pub trait ServiceLookup: Send + Sync {
    async fn get(&self, identity: &ResourceIdentity) -> Result<Service, LookupError>;
}

/// How a destroy confirmation treats lookup failures other than not-found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DestroyCheckMode {
    /// Only a not-found answer confirms destruction
    #[default]
    Strict,
    /// Any lookup failure counts as confirmation and is logged
    Lenient,
}

/// Existence and destruction checks against the remote API
#[derive(Clone)]
pub struct ServiceOracle {
    lookup: Arc<dyn ServiceLookup>,
    mode: DestroyCheckMode,
}

impl std::fmt::Debug for ServiceOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceOracle")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl ServiceOracle {
    pub fn new(lookup: Arc<dyn ServiceLookup>, mode: DestroyCheckMode) -> Self {
        Self { lookup, mode }
    }

    pub fn mode(&self) -> DestroyCheckMode {
        self.mode
    }

    /// Fetch the live object and snapshot it
    ///
    /// Fails with `NotFound` when the API reports absence or returns an object whose
    /// own `{namespace, name}` differs from `identity`, and with `TransportError` for
    /// every other lookup failure.
    pub async fn exists(
        &self,
        identity: &ResourceIdentity,
    ) -> Result<ObservedResource, HarnessError> {
        match self.lookup.get(identity).await {
            Ok(service) => {
                let observed = ObservedResource::from(&service);
                if observed.identity() != *identity {
                    metrics::increment_lookups("not_found");
                    debug!(
                        requested = %identity,
                        returned = %observed.identity(),
                        "Lookup returned a different object"
                    );
                    return Err(HarnessError::NotFound {
                        identity: identity.id(),
                    });
                }
                metrics::increment_lookups("found");
                debug!(identity = %identity, uid = %observed.uid(), "Service exists");
                Ok(observed)
            }
            Err(LookupError::NotFound) => {
                metrics::increment_lookups("not_found");
                Err(HarnessError::NotFound {
                    identity: identity.id(),
                })
            }
            Err(LookupError::Transport(message)) => {
                metrics::increment_lookups("transport_error");
                Err(HarnessError::TransportError {
                    identity: identity.id(),
                    message,
                })
            }
        }
    }

    /// Confirm every tracked Service is gone from the API
    ///
    /// Resources of other kinds are skipped. Stops at the first failure.
    pub async fn confirm_destroyed(&self, state: &TrackedState) -> Result<(), HarnessError> {
        for (address, resource) in &state.resources {
            if resource.kind != SERVICE_RESOURCE_KIND {
                continue;
            }

            let identity = ResourceIdentity::parse(&resource.id)?;
            match self.lookup.get(&identity).await {
                Ok(service) => {
                    metrics::increment_lookups("found");
                    if ObservedResource::from(&service).identity() == identity {
                        return Err(HarnessError::UnexpectedlyExists {
                            identity: identity.id(),
                        });
                    }
                    debug!(
                        address = %address,
                        identity = %identity,
                        "Lookup returned a different object, treating as destroyed"
                    );
                }
                Err(LookupError::NotFound) => {
                    metrics::increment_lookups("not_found");
                    debug!(address = %address, identity = %identity, "Destruction confirmed");
                }
                Err(LookupError::Transport(message)) => {
                    metrics::increment_lookups("transport_error");
                    match self.mode {
                        DestroyCheckMode::Strict => {
                            return Err(HarnessError::TransportError {
                                identity: identity.id(),
                                message,
                            });
                        }
                        DestroyCheckMode::Lenient => {
                            warn!(
                                address = %address,
                                identity = %identity,
                                error = %message,
                                "Lookup failed during destroy check, accepting as destroyed"
                            );
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    /// Answers every lookup with the same canned result
    struct StaticLookup(Result<Service, LookupError>);

    #[async_trait]
    impl ServiceLookup for StaticLookup {
        async fn get(&self, _identity: &ResourceIdentity) -> Result<Service, LookupError> {
            self.0.clone()
        }
    }

    fn service(namespace: &str, name: &str) -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                uid: Some("uid-1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn oracle(result: Result<Service, LookupError>, mode: DestroyCheckMode) -> ServiceOracle {
        ServiceOracle::new(Arc::new(StaticLookup(result)), mode)
    }

    fn tracked(id: &str) -> TrackedState {
        TrackedState::from_ids([("kubernetes_service.test", SERVICE_RESOURCE_KIND, id)])
    }

    #[tokio::test]
    async fn test_exists_returns_snapshot() {
        let oracle = oracle(Ok(service("default", "a")), DestroyCheckMode::Strict);
        let observed = oracle
            .exists(&ResourceIdentity::new("default", "a"))
            .await
            .unwrap();
        assert_eq!(observed.uid(), "uid-1");
    }

    #[tokio::test]
    async fn test_exists_rejects_identity_mismatch() {
        let oracle = oracle(Ok(service("default", "b")), DestroyCheckMode::Strict);
        let err = oracle
            .exists(&ResourceIdentity::new("default", "a"))
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::NotFound { identity } if identity == "default/a"));
    }

    #[tokio::test]
    async fn test_exists_surfaces_transport_errors() {
        let oracle = oracle(
            Err(LookupError::Transport("connection refused".to_string())),
            DestroyCheckMode::Lenient,
        );
        let err = oracle
            .exists(&ResourceIdentity::new("default", "a"))
            .await
            .unwrap_err();
        assert_eq!(err.as_str(), "transport_error");
    }

    #[tokio::test]
    async fn test_confirm_destroyed_detects_survivor() {
        let oracle = oracle(Ok(service("default", "a")), DestroyCheckMode::Strict);
        let err = oracle.confirm_destroyed(&tracked("default/a")).await.unwrap_err();
        assert_eq!(err.to_string(), "service still exists: default/a");
    }

    #[tokio::test]
    async fn test_confirm_destroyed_modes_on_transport_failure() {
        let failure = Err(LookupError::Transport("forbidden".to_string()));
        let strict = oracle(failure.clone(), DestroyCheckMode::Strict);
        assert!(matches!(
            strict.confirm_destroyed(&tracked("default/a")).await,
            Err(HarnessError::TransportError { .. })
        ));

        let lenient = oracle(failure, DestroyCheckMode::Lenient);
        assert!(lenient.confirm_destroyed(&tracked("default/a")).await.is_ok());
    }

    #[tokio::test]
    async fn test_confirm_destroyed_skips_other_kinds_and_rejects_bad_ids() {
        let oracle = oracle(Ok(service("default", "a")), DestroyCheckMode::Strict);
        let other = TrackedState::from_ids([("kubernetes_pod.p", "kubernetes_pod", "default/a")]);
        assert!(oracle.confirm_destroyed(&other).await.is_ok());

        let err = oracle.confirm_destroyed(&tracked("no-separator")).await.unwrap_err();
        assert_eq!(err.as_str(), "invalid_identifier");
    }

    #[tokio::test]
    async fn test_confirm_destroyed_on_not_found() {
        let oracle = oracle(Err(LookupError::NotFound), DestroyCheckMode::Strict);
        assert!(oracle.confirm_destroyed(&tracked("default/a")).await.is_ok());
        assert!(oracle.confirm_destroyed(&TrackedState::default()).await.is_ok());
    }
}

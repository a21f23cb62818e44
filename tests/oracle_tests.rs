//! # Existence Oracle Tests
//!
//! Exercises [`ServiceOracle`] against the in-memory cluster.
//!
//! These tests verify:
//! - `exists` snapshots live objects and reports absence as `NotFound`
//! - Transport failures are never mistaken for absence by `exists`
//! - Strict and lenient destroy confirmation
//! - Non-Service resources are ignored by destroy confirmation

use service_lifecycle_harness::constants::SERVICE_RESOURCE_KIND;
use service_lifecycle_harness::fixture::variants;
use service_lifecycle_harness::oracle::{DestroyCheckMode, ServiceLookup, ServiceOracle};
use service_lifecycle_harness::simulated::InMemoryCluster;
use service_lifecycle_harness::state::TrackedState;
use service_lifecycle_harness::{HarnessError, ResourceIdentity};
use std::sync::Arc;

fn oracle(cluster: &Arc<InMemoryCluster>, mode: DestroyCheckMode) -> ServiceOracle {
    let lookup: Arc<dyn ServiceLookup> = Arc::clone(cluster) as Arc<dyn ServiceLookup>;
    ServiceOracle::new(lookup, mode)
}

fn tracked(ids: &[&str]) -> TrackedState {
    TrackedState::from_ids(
        ids.iter()
            .enumerate()
            .map(|(index, id)| {
                (
                    format!("kubernetes_service.r{index}"),
                    SERVICE_RESOURCE_KIND,
                    *id,
                )
            }),
    )
}

#[tokio::test]
async fn test_exists_returns_live_snapshot() {
    let cluster = Arc::new(InMemoryCluster::default());
    let created = cluster
        .create(variants::basic("svc").to_manifest("default"))
        .unwrap();

    let observed = oracle(&cluster, DestroyCheckMode::Strict)
        .exists(&ResourceIdentity::new("default", "svc"))
        .await
        .unwrap();

    assert_eq!(Some(observed.uid()), created.metadata.uid.as_deref());
    assert_eq!(observed.metadata.labels.len(), 3);
    assert_eq!(observed.spec.service_type, "ClusterIP");
    assert_eq!(observed.spec.ports.len(), 1);
    assert_eq!(observed.spec.ports[0].port, 8080);
    assert!(!observed.spec.cluster_ip.is_empty());
}

#[tokio::test]
async fn test_exists_reports_absence_as_not_found() {
    let cluster = Arc::new(InMemoryCluster::default());
    let err = oracle(&cluster, DestroyCheckMode::Strict)
        .exists(&ResourceIdentity::new("default", "missing"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, HarnessError::NotFound { ref identity } if identity == "default/missing")
    );
}

#[tokio::test]
async fn test_exists_is_namespace_scoped() {
    let cluster = Arc::new(InMemoryCluster::default());
    cluster
        .create(variants::basic("svc").to_manifest("apps"))
        .unwrap();
    let err = oracle(&cluster, DestroyCheckMode::Strict)
        .exists(&ResourceIdentity::new("default", "svc"))
        .await
        .unwrap_err();
    assert_eq!(err.as_str(), "not_found");
}

#[tokio::test]
async fn test_exists_surfaces_transport_failures() {
    let cluster = Arc::new(InMemoryCluster::default());
    cluster
        .create(variants::basic("svc").to_manifest("default"))
        .unwrap();
    cluster.fail_lookups("connection refused");

    // the mode only affects destroy confirmation
    for mode in [DestroyCheckMode::Strict, DestroyCheckMode::Lenient] {
        let err = oracle(&cluster, mode)
            .exists(&ResourceIdentity::new("default", "svc"))
            .await
            .unwrap_err();
        match err {
            HarnessError::TransportError { identity, message } => {
                assert_eq!(identity, "default/svc");
                assert_eq!(message, "connection refused");
            }
            other => panic!("expected a transport error, got {other:?}"),
        }
    }

    cluster.restore_lookups();
    assert!(oracle(&cluster, DestroyCheckMode::Strict)
        .exists(&ResourceIdentity::new("default", "svc"))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_confirm_destroyed_passes_when_everything_is_gone() {
    let cluster = Arc::new(InMemoryCluster::default());
    cluster
        .create(variants::basic("svc").to_manifest("default"))
        .unwrap();
    cluster
        .delete(&ResourceIdentity::new("default", "svc"))
        .unwrap();

    oracle(&cluster, DestroyCheckMode::Strict)
        .confirm_destroyed(&tracked(&["default/svc", "default/never-created"]))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_confirm_destroyed_reports_survivors() {
    let cluster = Arc::new(InMemoryCluster::default());
    cluster
        .create(variants::basic("svc").to_manifest("default"))
        .unwrap();

    let err = oracle(&cluster, DestroyCheckMode::Lenient)
        .confirm_destroyed(&tracked(&["default/svc"]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::UnexpectedlyExists { ref identity } if identity == "default/svc"
    ));
    assert_eq!(err.to_string(), "service still exists: default/svc");
}

#[tokio::test]
async fn test_strict_destroy_check_rejects_transport_failures() {
    let cluster = Arc::new(InMemoryCluster::default());
    cluster.fail_lookups("i/o timeout");

    let err = oracle(&cluster, DestroyCheckMode::Strict)
        .confirm_destroyed(&tracked(&["default/svc"]))
        .await
        .unwrap_err();
    assert_eq!(err.as_str(), "transport_error");
}

#[tokio::test]
async fn test_lenient_destroy_check_accepts_transport_failures() {
    let cluster = Arc::new(InMemoryCluster::default());
    cluster
        .create(variants::basic("svc").to_manifest("default"))
        .unwrap();
    cluster.fail_lookups("i/o timeout");

    // the object still exists, but lenient mode cannot tell
    oracle(&cluster, DestroyCheckMode::Lenient)
        .confirm_destroyed(&tracked(&["default/svc"]))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_confirm_destroyed_skips_other_kinds() {
    let cluster = Arc::new(InMemoryCluster::default());
    cluster.fail_lookups("should not be called");

    let state = TrackedState::from_ids([(
        "kubernetes_namespace.test",
        "kubernetes_namespace",
        "not-even-an-identifier",
    )]);
    oracle(&cluster, DestroyCheckMode::Strict)
        .confirm_destroyed(&state)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_confirm_destroyed_rejects_malformed_ids() {
    let cluster = Arc::new(InMemoryCluster::default());
    let err = oracle(&cluster, DestroyCheckMode::Strict)
        .confirm_destroyed(&tracked(&["no-separator"]))
        .await
        .unwrap_err();
    assert_eq!(err.as_str(), "invalid_identifier");
}

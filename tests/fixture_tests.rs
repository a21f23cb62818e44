//! # Fixture Generator Tests
//!
//! These tests verify:
//! - Rendering is deterministic for every variant
//! - Variant parameters land in the rendered configuration
//! - Provider preambles and provider references
//! - Manifests mirror the rendered fixture

use service_lifecycle_harness::fixture::{variants, FixtureDocument, ProviderRequirements};
use service_lifecycle_harness::HarnessConfig;

fn all_variants(name: &str) -> Vec<service_lifecycle_harness::fixture::ServiceFixture> {
    vec![
        variants::basic(name),
        variants::modified(name),
        variants::load_balancer(name),
        variants::load_balancer_modified(name),
        variants::load_balancer_annotations_aws(name),
        variants::load_balancer_annotations_aws_modified(name),
        variants::load_balancer_healthcheck(name, 31111),
        variants::node_port(name),
        variants::string_target_port(name),
        variants::no_target_port(name),
        variants::external_name(name),
        variants::generated_name(name),
        variants::regression("kubernetes-local", name),
        variants::state_upgrade_v0("kubernetes-released", name),
    ]
}

#[test]
fn test_every_variant_renders_deterministically() {
    let first: Vec<String> = all_variants("svc").iter().map(|f| f.render()).collect();
    let second: Vec<String> = all_variants("svc").iter().map(|f| f.render()).collect();
    assert_eq!(first, second);
}

#[test]
fn test_every_variant_is_a_single_service_block() {
    for fixture in all_variants("svc") {
        let text = fixture.render();
        assert!(text.starts_with("resource \"kubernetes_service\" \"test\" {\n"));
        assert!(text.ends_with("}\n"));
        assert_eq!(text.matches("resource \"").count(), 1);
    }
}

#[test]
fn test_names_differ_only_in_name() {
    let one = variants::basic("alpha").render();
    let two = variants::basic("bravo").render();
    assert_ne!(one, two);
    assert_eq!(one.replace("\"alpha\"", "\"bravo\""), two);
}

#[test]
fn test_basic_variant_content() {
    let text = variants::basic("svc").render();
    assert!(text.contains("TestAnnotationOne = \"one\""));
    assert!(text.contains("TestAnnotationTwo = \"two\""));
    assert!(text.contains("TestLabelThree = \"three\""));
    assert!(text.contains("name = \"svc\""));
    assert!(text.contains("port        = 8080"));
    assert!(text.contains("target_port = 80"));
    assert!(!text.contains("type"));
}

#[test]
fn test_modified_variant_content() {
    let text = variants::modified("svc").render();
    assert!(text.contains("Different         = \"1234\""));
    assert!(!text.contains("TestAnnotationTwo"));
    assert!(!text.contains("TestLabelTwo"));
    assert!(text.contains("port        = 8081"));
    assert!(text.contains("publish_not_ready_addresses = true"));
}

#[test]
fn test_load_balancer_variant_lists() {
    let text = variants::load_balancer("svc").render();
    assert!(text.contains("[\"10.0.0.3\", \"10.0.0.4\"]"));
    assert!(text.contains("[\"10.0.0.5/32\", \"10.0.0.6/32\"]"));
    assert!(text.contains("\"ext-name-svc\""));
    assert!(text.contains("App = \"MyApp\""));
    assert!(text.contains("    type = \"LoadBalancer\"\n"));
    assert!(!text.contains("external_traffic_policy"));

    let modified = variants::load_balancer_modified("svc").render();
    assert!(modified.contains("external_traffic_policy"));
    assert!(modified.contains("\"Local\""));
    assert!(modified.contains("NewSelector = \"NewValue\""));
    assert!(modified.contains("port        = 9999"));
}

#[test]
fn test_aws_annotations_are_quoted_keys() {
    let text = variants::load_balancer_annotations_aws("svc").render();
    assert!(text.contains(
        "\"service.beta.kubernetes.io/aws-load-balancer-connection-idle-timeout\" = \"300\""
    ));
    assert!(!text.contains("cross-zone"));

    let modified = variants::load_balancer_annotations_aws_modified("svc").render();
    let idle_timeout = modified
        .lines()
        .find(|line| line.contains("connection-idle-timeout"))
        .unwrap();
    assert!(idle_timeout.trim_end().ends_with("= \"60\""));
    assert!(modified.contains("cross-zone-load-balancing-enabled\" = \"true\""));
}

#[test]
fn test_healthcheck_port_is_parameterised() {
    let a = variants::load_balancer_healthcheck("svc", 31111).render();
    let b = variants::load_balancer_healthcheck("svc", 31112).render();
    assert!(a.contains("= 31111"));
    assert!(b.contains("= 31112"));
    assert_eq!(a.replace("31111", "31112"), b);
}

#[test]
fn test_node_port_variant_has_two_named_ports() {
    let text = variants::node_port("svc").render();
    assert_eq!(text.matches("    port {\n").count(), 2);
    assert!(text.contains("name        = \"first\""));
    assert!(text.contains("name        = \"second\""));
    assert!(text.contains("\"ClientIP\""));
    assert!(text.contains("\"12.0.0.125\""));
    assert!(text.contains("    type = \"NodePort\"\n"));
}

#[test]
fn test_target_port_forms() {
    let named = variants::string_target_port("svc").render();
    assert!(named.contains("target_port = \"http-server\""));

    let none = variants::no_target_port("svc").render();
    assert!(!none.contains("target_port"));
    assert!(none.contains("port = 443"));
}

#[test]
fn test_external_name_and_generated_name() {
    let external = variants::external_name("svc").render();
    assert!(external.contains("external_name = \"terraform.io\""));
    assert!(external.contains("\"ExternalName\""));

    let generated = variants::generated_name("tf-acc-test-gen-").render();
    assert!(generated.contains("generate_name = \"tf-acc-test-gen-\""));
    assert!(!generated.contains("    name "));
}

#[test]
fn test_provider_documents() {
    let config = HarnessConfig::default();
    let regression = FixtureDocument::new(variants::regression(&config.local_provider, "svc"))
        .with_providers(ProviderRequirements::released_and_local(&config));
    let text = regression.render();
    assert!(text.starts_with("terraform {\n"));
    assert!(text.contains("version = \"1.13.3\""));
    assert!(text.contains("  provider = kubernetes-local\n"));
    assert_eq!(text.matches("resource \"").count(), 1);

    let upgrade = variants::state_upgrade_v0(&config.released_provider, "svc").render();
    assert!(upgrade.contains("  provider = \"kubernetes-released\"\n"));
}

#[test]
fn test_manifest_mirrors_fixture() {
    let service = variants::node_port("svc").to_manifest("apps");
    assert_eq!(service.metadata.namespace.as_deref(), Some("apps"));
    let spec = service.spec.unwrap();
    assert_eq!(spec.type_.as_deref(), Some("NodePort"));
    assert_eq!(spec.session_affinity.as_deref(), Some("ClientIP"));
    let ports = spec.ports.unwrap();
    assert_eq!(ports.len(), 2);
    assert_eq!(ports[1].name.as_deref(), Some("second"));
    assert_eq!(ports[1].port, 10333);
}

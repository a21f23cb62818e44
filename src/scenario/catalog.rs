//! # Scenario Catalog
//!
//! The lifecycle scenarios for `kubernetes_service`, expressed as data. Every call
//! draws fresh random names, so two catalogs never collide on the same cluster.

use super::{Scenario, Step};
use crate::config::{Capability, HarnessConfig};
use crate::constants::{DEFAULT_GENERATED_NAME_PREFIX, DEFAULT_HEALTHCHECK_NODE_PORT};
use crate::fixture::{variants, FixtureDocument, ProviderRequirements, ServiceFixture};
use crate::resource::PortBinding;
use crate::verify::Check;

/// Names of every catalog scenario, in run order
pub const SCENARIO_NAMES: [&str; 11] = [
    "basic",
    "load_balancer",
    "load_balancer_healthcheck",
    "load_balancer_annotations_aws",
    "node_port",
    "no_target_port",
    "string_target_port",
    "external_name",
    "generated_name",
    "regression",
    "state_upgrade_v0_load_balancer_ingress",
];

/// Build every catalog scenario
pub fn all(config: &HarnessConfig) -> Vec<Scenario> {
    SCENARIO_NAMES
        .iter()
        .filter_map(|name| by_name(name, config))
        .collect()
}

/// Build one scenario by name
pub fn by_name(name: &str, config: &HarnessConfig) -> Option<Scenario> {
    let scenario = match name {
        "basic" => basic(config),
        "load_balancer" => load_balancer(config),
        "load_balancer_healthcheck" => load_balancer_healthcheck(config),
        "load_balancer_annotations_aws" => load_balancer_annotations_aws(config),
        "node_port" => node_port(config),
        "no_target_port" => no_target_port(config),
        "string_target_port" => string_target_port(config),
        "external_name" => external_name(config),
        "generated_name" => generated_name(config),
        "regression" => regression(config),
        "state_upgrade_v0_load_balancer_ingress" => state_upgrade_v0(config),
        _ => return None,
    };
    Some(scenario)
}

const ADDRESS: &str = "kubernetes_service.test";

fn in_namespace(fixture: ServiceFixture, config: &HarnessConfig) -> ServiceFixture {
    fixture.namespace(config.namespace.clone())
}

/// Server-assigned metadata every managed service carries
fn assigned_metadata() -> Vec<Check> {
    vec![
        Check::is_set("metadata.0.generation"),
        Check::is_set("metadata.0.resource_version"),
        Check::is_set("metadata.0.uid"),
    ]
}

/// Checks for the single-port ClusterIP shape of `basic`/`modified`/`regression`
fn cluster_ip_checks(name: &str, port: i32, publish_not_ready: bool) -> Vec<Check> {
    let mut checks = vec![Check::equals("metadata.0.name", name)];
    checks.extend(assigned_metadata());
    checks.extend([
        Check::equals("spec.#", 1),
        Check::equals("spec.0.port.#", 1),
        Check::is_set("spec.0.cluster_ip"),
        Check::equals("spec.0.port.0.name", ""),
        Check::equals("spec.0.port.0.node_port", 0),
        Check::equals("spec.0.port.0.port", port),
        Check::equals("spec.0.port.0.protocol", "TCP"),
        Check::equals("spec.0.port.0.target_port", 80),
        Check::equals("spec.0.session_affinity", "None"),
        Check::equals("spec.0.type", "ClusterIP"),
        Check::equals("spec.0.publish_not_ready_addresses", publish_not_ready),
        Check::ports(vec![PortBinding::tcp(port, 80)]),
    ]);
    checks
}

fn load_balancer_lists(initial: bool) -> Vec<Check> {
    let (ips, ranges) = if initial {
        (["10.0.0.3", "10.0.0.4"], ["10.0.0.5/32", "10.0.0.6/32"])
    } else {
        (["10.0.0.4", "10.0.0.5"], ["10.0.0.1/32", "10.0.0.2/32"])
    };
    vec![
        Check::equals("spec.0.external_ips.#", 2),
        Check::equals("spec.0.external_ips.0", ips[0]),
        Check::equals("spec.0.external_ips.1", ips[1]),
        Check::equals("spec.0.load_balancer_source_ranges.#", 2),
        Check::equals("spec.0.load_balancer_source_ranges.0", ranges[0]),
        Check::equals("spec.0.load_balancer_source_ranges.1", ranges[1]),
    ]
}

/// Checks shared by the load-balancer fixtures before modification
fn load_balancer_checks(name: &str) -> Vec<Check> {
    let mut checks = vec![
        Check::equals("metadata.0.name", name),
        Check::equals("spec.#", 1),
        Check::equals("spec.0.port.#", 1),
        Check::is_set("spec.0.port.0.node_port"),
        Check::equals("spec.0.port.0.port", 8888),
        Check::equals("spec.0.port.0.protocol", "TCP"),
        Check::equals("spec.0.port.0.target_port", 80),
        Check::is_set("spec.0.cluster_ip"),
        Check::equals("spec.0.external_name", format!("ext-name-{name}")),
    ];
    checks.extend(load_balancer_lists(true));
    checks.extend([
        Check::equals("spec.0.selector.%", 1),
        Check::equals("spec.0.selector.App", "MyApp"),
        Check::equals("spec.0.type", "LoadBalancer"),
        Check::ports(vec![PortBinding::tcp(8888, 80)]),
    ]);
    checks
}

/// Checks shared by the load-balancer fixtures after modification
fn load_balancer_modified_checks(name: &str) -> Vec<Check> {
    let mut checks = vec![
        Check::equals("metadata.0.name", name),
        Check::equals("spec.#", 1),
        Check::is_set("spec.0.cluster_ip"),
        Check::equals("spec.0.external_name", format!("ext-name-modified-{name}")),
    ];
    checks.extend(load_balancer_lists(false));
    checks.extend([
        Check::equals("spec.0.port.#", 1),
        Check::is_set("spec.0.port.0.node_port"),
        Check::equals("spec.0.port.0.port", 9999),
        Check::equals("spec.0.port.0.protocol", "TCP"),
        Check::equals("spec.0.port.0.target_port", 81),
        Check::equals("spec.0.selector.%", 2),
        Check::equals("spec.0.selector.App", "MyModifiedApp"),
        Check::equals("spec.0.selector.NewSelector", "NewValue"),
        Check::equals("spec.0.type", "LoadBalancer"),
        Check::ports(vec![PortBinding::tcp(9999, 81)]),
    ]);
    checks
}

/// Create, import, modify in place, revert
pub fn basic(config: &HarnessConfig) -> Scenario {
    let name = config.random_name();
    Scenario::new("basic")
        .step(
            Step::apply(in_namespace(variants::basic(&name), config))
                .checks(cluster_ip_checks(&name, 8080, false))
                .aggregate()
                .retain_as("initial"),
        )
        .step(Step::import_verify(
            ADDRESS,
            ["metadata.0.resource_version", "wait_for_load_balancer"],
        ))
        .step(
            Step::apply(in_namespace(variants::modified(&name), config))
                .checks(cluster_ip_checks(&name, 8081, true))
                .check(Check::same_instance_as("initial"))
                .aggregate(),
        )
        .step(
            Step::apply(in_namespace(variants::basic(&name), config))
                .checks(cluster_ip_checks(&name, 8080, false))
                .check(Check::same_instance_as("initial"))
                .aggregate(),
        )
}

pub fn load_balancer(config: &HarnessConfig) -> Scenario {
    let name = config.random_name();
    Scenario::new("load_balancer")
        .requires(Capability::LoadBalancers)
        .step(
            Step::apply(in_namespace(variants::load_balancer(&name), config))
                .checks(load_balancer_checks(&name))
                .check(Check::equals("spec.0.external_traffic_policy", "Cluster"))
                .check(Check::is_set("status.0.load_balancer.0.ingress.0.ip"))
                .aggregate()
                .retain_as("initial"),
        )
        .step(
            Step::apply(in_namespace(variants::load_balancer_modified(&name), config))
                .checks(load_balancer_modified_checks(&name))
                .check(Check::equals("spec.0.external_traffic_policy", "Local"))
                .check(Check::same_instance_as("initial"))
                .aggregate(),
        )
}

/// Change the health-check node port of a node-local load balancer
pub fn load_balancer_healthcheck(config: &HarnessConfig) -> Scenario {
    let name = config.random_name();
    let step = |node_port: i32| {
        Step::apply(in_namespace(
            variants::load_balancer_healthcheck(&name, node_port),
            config,
        ))
        .check(Check::equals("spec.0.external_traffic_policy", "Local"))
        .check(Check::equals("spec.0.type", "LoadBalancer"))
        .check(Check::equals("spec.0.health_check_node_port", node_port))
        .aggregate()
    };
    Scenario::new("load_balancer_healthcheck")
        .requires(Capability::LoadBalancers)
        .step(step(DEFAULT_HEALTHCHECK_NODE_PORT))
        .step(step(DEFAULT_HEALTHCHECK_NODE_PORT + 1))
}

pub fn load_balancer_annotations_aws(config: &HarnessConfig) -> Scenario {
    let name = config.random_name();
    let annotation = |key: &str| format!("metadata.0.annotations.service.beta.kubernetes.io/{key}");
    Scenario::new("load_balancer_annotations_aws")
        .requires(Capability::LoadBalancers)
        .step(
            Step::apply(in_namespace(variants::load_balancer_annotations_aws(&name), config))
                .check(Check::equals("metadata.0.annotations.%", 3))
                .check(Check::equals(annotation("aws-load-balancer-backend-protocol"), "http"))
                .check(Check::equals(
                    annotation("aws-load-balancer-connection-idle-timeout"),
                    "300",
                ))
                .check(Check::equals(annotation("aws-load-balancer-ssl-ports"), "*"))
                .checks(load_balancer_checks(&name))
                .aggregate(),
        )
        .step(
            Step::apply(in_namespace(
                variants::load_balancer_annotations_aws_modified(&name),
                config,
            ))
            .check(Check::equals("metadata.0.annotations.%", 4))
            .check(Check::equals(annotation("aws-load-balancer-backend-protocol"), "http"))
            .check(Check::equals(
                annotation("aws-load-balancer-connection-idle-timeout"),
                "60",
            ))
            .check(Check::equals(annotation("aws-load-balancer-ssl-ports"), "*"))
            .check(Check::equals(
                annotation("aws-load-balancer-cross-zone-load-balancing-enabled"),
                "true",
            ))
            .checks(load_balancer_modified_checks(&name))
            .aggregate(),
        )
}

pub fn node_port(config: &HarnessConfig) -> Scenario {
    let name = config.random_name();
    Scenario::new("node_port").step(
        Step::apply(in_namespace(variants::node_port(&name), config))
            .checks([
                Check::equals("metadata.0.name", &name),
                Check::equals("spec.#", 1),
                Check::is_set("spec.0.cluster_ip"),
                Check::equals("spec.0.external_ips.#", 2),
                Check::equals("spec.0.external_ips.0", "10.0.0.4"),
                Check::equals("spec.0.external_ips.1", "10.0.0.5"),
                Check::equals("spec.0.external_name", format!("ext-name-{name}")),
                Check::equals("spec.0.load_balancer_ip", "12.0.0.125"),
                Check::equals("spec.0.port.#", 2),
                Check::equals("spec.0.port.0.name", "first"),
                Check::is_set("spec.0.port.0.node_port"),
                Check::equals("spec.0.port.0.port", 10222),
                Check::equals("spec.0.port.0.protocol", "TCP"),
                Check::equals("spec.0.port.0.target_port", 22),
                Check::equals("spec.0.port.1.name", "second"),
                Check::is_set("spec.0.port.1.node_port"),
                Check::equals("spec.0.port.1.port", 10333),
                Check::equals("spec.0.port.1.protocol", "TCP"),
                Check::equals("spec.0.port.1.target_port", 33),
                Check::equals("spec.0.selector.%", 1),
                Check::equals("spec.0.selector.App", "MyApp"),
                Check::equals("spec.0.session_affinity", "ClientIP"),
                Check::equals("spec.0.type", "NodePort"),
                Check::ports(vec![
                    PortBinding::tcp(10222, 22).named("first"),
                    PortBinding::tcp(10333, 33).named("second"),
                ]),
            ])
            .aggregate(),
    )
}

/// Ports without a target port default to the exposed port
pub fn no_target_port(config: &HarnessConfig) -> Scenario {
    let name = config.random_name();
    Scenario::new("no_target_port")
        .requires(Capability::LoadBalancers)
        .step(
            Step::apply(in_namespace(variants::no_target_port(&name), config))
                .checks([
                    Check::equals("metadata.0.name", &name),
                    Check::equals("spec.#", 1),
                    Check::is_set("spec.0.cluster_ip"),
                    Check::equals("spec.0.external_ips.#", 0),
                    Check::equals("spec.0.port.#", 2),
                    Check::equals("spec.0.port.0.name", "http"),
                    Check::is_set("spec.0.port.0.node_port"),
                    Check::equals("spec.0.port.0.port", 80),
                    Check::equals("spec.0.port.0.protocol", "TCP"),
                    Check::equals("spec.0.port.0.target_port", 80),
                    Check::equals("spec.0.port.1.name", "https"),
                    Check::is_set("spec.0.port.1.node_port"),
                    Check::equals("spec.0.port.1.port", 443),
                    Check::equals("spec.0.port.1.protocol", "TCP"),
                    Check::equals("spec.0.port.1.target_port", 443),
                    Check::equals("spec.0.selector.%", 1),
                    Check::equals("spec.0.selector.App", "MyOtherApp"),
                    Check::equals("spec.0.session_affinity", "None"),
                    Check::equals("spec.0.type", "LoadBalancer"),
                    Check::ports(vec![
                        PortBinding::tcp(80, 80).named("http"),
                        PortBinding::tcp(443, 443).named("https"),
                    ]),
                ])
                .aggregate(),
        )
}

pub fn string_target_port(config: &HarnessConfig) -> Scenario {
    let name = config.random_name();
    Scenario::new("string_target_port")
        .requires(Capability::LoadBalancers)
        .step(
            Step::apply(in_namespace(variants::string_target_port(&name), config))
                .check(Check::ports(vec![PortBinding::tcp(8080, "http-server")])),
        )
}

pub fn external_name(config: &HarnessConfig) -> Scenario {
    let name = config.random_name();
    Scenario::new("external_name").step(
        Step::apply(in_namespace(variants::external_name(&name), config))
            .checks([
                Check::equals("metadata.0.name", &name),
                Check::equals("spec.#", 1),
                Check::equals("spec.0.cluster_ip", ""),
                Check::equals("spec.0.external_ips.#", 0),
                Check::equals("spec.0.external_name", "terraform.io"),
                Check::equals("spec.0.load_balancer_ip", ""),
                Check::equals("spec.0.load_balancer_source_ranges.#", 0),
                Check::equals("spec.0.port.#", 0),
                Check::equals("spec.0.selector.%", 0),
                Check::equals("spec.0.session_affinity", "None"),
                Check::equals("spec.0.type", "ExternalName"),
                Check::ports(Vec::new()),
            ])
            .aggregate(),
    )
}

/// Name assigned by the API server from a fixed prefix
pub fn generated_name(config: &HarnessConfig) -> Scenario {
    let prefix = DEFAULT_GENERATED_NAME_PREFIX;
    let mut checks = vec![
        Check::equals("metadata.0.annotations.%", 0),
        Check::equals("metadata.0.labels.%", 0),
        Check::equals("metadata.0.generate_name", prefix),
        Check::has_prefix("metadata.0.name", prefix),
    ];
    checks.extend(assigned_metadata());
    Scenario::new("generated_name")
        .step(
            Step::apply(in_namespace(variants::generated_name(prefix), config))
                .checks(checks)
                .aggregate(),
        )
        .step(Step::import_verify(ADDRESS, ["metadata.0.resource_version"]))
}

fn with_providers(fixture: ServiceFixture, config: &HarnessConfig) -> FixtureDocument {
    FixtureDocument::new(in_namespace(fixture, config))
        .with_providers(ProviderRequirements::released_and_local(config))
}

/// Released provider creates, local provider takes over without replacing
pub fn regression(config: &HarnessConfig) -> Scenario {
    let name = config.random_name();
    Scenario::new("regression")
        .step(
            Step::apply(with_providers(
                variants::regression(&config.released_provider, &name),
                config,
            ))
            .checks(cluster_ip_checks(&name, 8080, false))
            .aggregate()
            .retain_as("released"),
        )
        .step(
            Step::apply(with_providers(
                variants::regression(&config.local_provider, &name),
                config,
            ))
            .checks(cluster_ip_checks(&name, 8080, false))
            .check(Check::same_instance_as("released"))
            .aggregate(),
        )
}

/// Load-balancer state written by the released provider survives the upgrade
pub fn state_upgrade_v0(config: &HarnessConfig) -> Scenario {
    let name = config.random_name();
    Scenario::new("state_upgrade_v0_load_balancer_ingress")
        .requires(Capability::Eks)
        .step(
            Step::apply(with_providers(
                variants::state_upgrade_v0(&config.released_provider, &name),
                config,
            ))
            .check(Check::equals("metadata.0.name", &name))
            .check(Check::equals("spec.0.type", "LoadBalancer"))
            .aggregate()
            .retain_as("released"),
        )
        .step(
            Step::apply(with_providers(
                variants::state_upgrade_v0(&config.local_provider, &name),
                config,
            ))
            .check(Check::equals("spec.0.type", "LoadBalancer"))
            .check(Check::same_instance_as("released"))
            .aggregate(),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builds_every_named_scenario() {
        let config = HarnessConfig::default();
        let scenarios = all(&config);
        let names: Vec<&str> = scenarios.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, SCENARIO_NAMES);
        assert!(by_name("no-such-scenario", &config).is_none());
    }

    #[test]
    fn test_capability_requirements() {
        let config = HarnessConfig::default();
        assert!(basic(&config).requires.is_empty());
        assert_eq!(load_balancer(&config).requires, vec![Capability::LoadBalancers]);
        assert_eq!(state_upgrade_v0(&config).requires, vec![Capability::Eks]);
    }

    #[test]
    fn test_scenarios_get_fresh_names() {
        let config = HarnessConfig::default();
        let name_of = |scenario: &Scenario| match &scenario.steps[0] {
            Step::Apply(apply) => apply.document.service.metadata.name.clone(),
            Step::ImportVerify(_) => panic!("first step must apply"),
        };
        assert_ne!(name_of(&basic(&config)), name_of(&basic(&config)));
    }

    #[test]
    fn test_regression_switches_provider() {
        let config = HarnessConfig::default();
        let scenario = regression(&config);
        let providers: Vec<String> = scenario
            .steps
            .iter()
            .filter_map(|step| match step {
                Step::Apply(apply) => apply
                    .document
                    .service
                    .provider
                    .as_ref()
                    .map(|p| p.alias().to_string()),
                Step::ImportVerify(_) => None,
            })
            .collect();
        assert_eq!(providers, vec!["kubernetes-released", "kubernetes-local"]);
    }
}

//! # Fixture Variants
//!
//! The service fixtures the lifecycle scenarios apply. Each variant is a plain
//! function of its parameters; the same arguments always produce the same fixture.

use super::{PortSpec, ProviderRef, ServiceFixture};
use crate::resource::{ExternalTrafficPolicy, ServiceType, SessionAffinity};

const AWS_BACKEND_PROTOCOL: &str = "service.beta.kubernetes.io/aws-load-balancer-backend-protocol";
const AWS_IDLE_TIMEOUT: &str =
    "service.beta.kubernetes.io/aws-load-balancer-connection-idle-timeout";
const AWS_SSL_PORTS: &str = "service.beta.kubernetes.io/aws-load-balancer-ssl-ports";
const AWS_CROSS_ZONE: &str =
    "service.beta.kubernetes.io/aws-load-balancer-cross-zone-load-balancing-enabled";

/// ClusterIP service with two annotations, three labels and `8080 -> 80`
pub fn basic(name: &str) -> ServiceFixture {
    ServiceFixture::named(name)
        .annotation("TestAnnotationOne", "one")
        .annotation("TestAnnotationTwo", "two")
        .label("TestLabelOne", "one")
        .label("TestLabelTwo", "two")
        .label("TestLabelThree", "three")
        .port(PortSpec::new(8080).target(80))
}

/// [`basic`] with changed metadata, port `8081` and not-ready addresses published
pub fn modified(name: &str) -> ServiceFixture {
    ServiceFixture::named(name)
        .annotation("TestAnnotationOne", "one")
        .annotation("Different", "1234")
        .label("TestLabelOne", "one")
        .label("TestLabelThree", "three")
        .port(PortSpec::new(8081).target(80))
        .publish_not_ready_addresses(true)
}

fn load_balancer_base(name: &str) -> ServiceFixture {
    ServiceFixture::named(name)
        .external_name(format!("ext-name-{name}"))
        .external_ips(["10.0.0.3", "10.0.0.4"])
        .load_balancer_source_ranges(["10.0.0.5/32", "10.0.0.6/32"])
        .selector("App", "MyApp")
        .port(PortSpec::new(8888).target(80))
        .service_type(ServiceType::LoadBalancer)
}

fn load_balancer_modified_base(name: &str) -> ServiceFixture {
    ServiceFixture::named(name)
        .external_name(format!("ext-name-modified-{name}"))
        .external_ips(["10.0.0.4", "10.0.0.5"])
        .load_balancer_source_ranges(["10.0.0.1/32", "10.0.0.2/32"])
        .selector("App", "MyModifiedApp")
        .selector("NewSelector", "NewValue")
        .port(PortSpec::new(9999).target(81))
        .service_type(ServiceType::LoadBalancer)
}

/// LoadBalancer service with external IPs, source ranges and one selector
pub fn load_balancer(name: &str) -> ServiceFixture {
    load_balancer_base(name)
}

/// [`load_balancer`] with every list and the port changed, traffic kept node-local
pub fn load_balancer_modified(name: &str) -> ServiceFixture {
    load_balancer_modified_base(name).external_traffic_policy(ExternalTrafficPolicy::Local)
}

/// [`load_balancer`] carrying AWS load-balancer annotations
pub fn load_balancer_annotations_aws(name: &str) -> ServiceFixture {
    load_balancer_base(name)
        .annotation(AWS_BACKEND_PROTOCOL, "http")
        .annotation(AWS_IDLE_TIMEOUT, "300")
        .annotation(AWS_SSL_PORTS, "*")
}

/// Modified AWS variant: shorter idle timeout, cross-zone balancing enabled
pub fn load_balancer_annotations_aws_modified(name: &str) -> ServiceFixture {
    load_balancer_modified_base(name)
        .annotation(AWS_BACKEND_PROTOCOL, "http")
        .annotation(AWS_IDLE_TIMEOUT, "60")
        .annotation(AWS_SSL_PORTS, "*")
        .annotation(AWS_CROSS_ZONE, "true")
}

/// Node-local LoadBalancer with a fixed health-check node port
pub fn load_balancer_healthcheck(name: &str, node_port: i32) -> ServiceFixture {
    load_balancer_base(name)
        .external_traffic_policy(ExternalTrafficPolicy::Local)
        .health_check_node_port(node_port)
}

/// NodePort service with two named ports and client-IP affinity
pub fn node_port(name: &str) -> ServiceFixture {
    ServiceFixture::named(name)
        .external_name(format!("ext-name-{name}"))
        .external_ips(["10.0.0.4", "10.0.0.5"])
        .load_balancer_ip("12.0.0.125")
        .selector("App", "MyApp")
        .session_affinity(SessionAffinity::ClientIp)
        .port(PortSpec::new(10222).named("first").target(22))
        .port(PortSpec::new(10333).named("second").target(33))
        .service_type(ServiceType::NodePort)
}

/// LoadBalancer targeting a named container port
pub fn string_target_port(name: &str) -> ServiceFixture {
    ServiceFixture::named(name)
        .label("app", "helloweb")
        .label("tier", "frontend")
        .service_type(ServiceType::LoadBalancer)
        .selector("app", "helloweb")
        .selector("tier", "frontend")
        .port(PortSpec::new(8080).target("http-server"))
}

/// LoadBalancer with two named ports and no target ports
pub fn no_target_port(name: &str) -> ServiceFixture {
    ServiceFixture::named(name)
        .selector("App", "MyOtherApp")
        .port(PortSpec::new(80).named("http"))
        .port(PortSpec::new(443).named("https"))
        .service_type(ServiceType::LoadBalancer)
}

/// ExternalName service pointing at `terraform.io`
pub fn external_name(name: &str) -> ServiceFixture {
    ServiceFixture::named(name)
        .service_type(ServiceType::ExternalName)
        .external_name("terraform.io")
}

/// Service named by the API server from `prefix`
pub fn generated_name(prefix: &str) -> ServiceFixture {
    ServiceFixture::generated(prefix).port(PortSpec::new(8080).target(80))
}

/// [`basic`] bound to a provider alias
pub fn regression(provider: &str, name: &str) -> ServiceFixture {
    basic(name).provider(ProviderRef::Reference(provider.to_string()))
}

/// LoadBalancer written with the legacy quoted provider reference
pub fn state_upgrade_v0(provider: &str, name: &str) -> ServiceFixture {
    ServiceFixture::named(name)
        .provider(ProviderRef::Quoted(provider.to_string()))
        .service_type(ServiceType::LoadBalancer)
        .port(PortSpec::new(8080).target(80))
}

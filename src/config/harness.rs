//! # Harness Settings
//!
//! Namespaces, naming, provider aliases and environment capabilities.

use crate::identity::random_suffix;
use crate::oracle::DestroyCheckMode;

/// Environment capability a scenario may depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// The cluster can provision external load balancers
    LoadBalancers,
    /// The cluster is an EKS cluster
    Eks,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::LoadBalancers => "load_balancers",
            Capability::Eks => "eks",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Harness configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Namespace applied to fixtures that do not set one
    pub namespace: String,
    /// Prefix for randomly named test resources
    pub name_prefix: String,
    /// Length of the random suffix appended to `name_prefix`
    pub random_suffix_len: usize,
    /// Whether the target cluster can provision load balancers
    pub load_balancers_available: bool,
    /// Whether the target cluster is EKS
    pub running_in_eks: bool,
    /// Provider alias for the released provider build
    pub released_provider: String,
    /// Provider alias for the locally built provider
    pub local_provider: String,
    /// Version constraint pinned for the released provider
    pub released_provider_version: String,
    /// Only a not-found lookup confirms destruction when set
    pub strict_destroy_check: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            random_suffix_len: DEFAULT_RANDOM_SUFFIX_LEN,
            load_balancers_available: true,
            running_in_eks: false,
            released_provider: DEFAULT_RELEASED_PROVIDER.to_string(),
            local_provider: DEFAULT_LOCAL_PROVIDER.to_string(),
            released_provider_version: DEFAULT_RELEASED_PROVIDER_VERSION.to_string(),
            strict_destroy_check: true,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            namespace: env_var_or_default("HARNESS_NAMESPACE", defaults.namespace),
            name_prefix: env_var_or_default("HARNESS_NAME_PREFIX", defaults.name_prefix),
            random_suffix_len: env_var_or_default(
                "HARNESS_RANDOM_SUFFIX_LEN",
                defaults.random_suffix_len,
            ),
            load_balancers_available: env_var_or_default(
                "HARNESS_LOAD_BALANCERS",
                defaults.load_balancers_available,
            ),
            running_in_eks: env_var_or_default("HARNESS_EKS", defaults.running_in_eks),
            released_provider: env_var_or_default(
                "HARNESS_RELEASED_PROVIDER",
                defaults.released_provider,
            ),
            local_provider: env_var_or_default("HARNESS_LOCAL_PROVIDER", defaults.local_provider),
            released_provider_version: env_var_or_default(
                "HARNESS_RELEASED_PROVIDER_VERSION",
                defaults.released_provider_version,
            ),
            strict_destroy_check: env_var_or_default(
                "HARNESS_STRICT_DESTROY",
                defaults.strict_destroy_check,
            ),
        }
    }

    /// Whether the target environment provides `capability`
    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::LoadBalancers => self.load_balancers_available,
            Capability::Eks => self.running_in_eks,
        }
    }

    /// Destroy confirmation mode derived from `strict_destroy_check`
    pub fn destroy_check_mode(&self) -> DestroyCheckMode {
        if self.strict_destroy_check {
            DestroyCheckMode::Strict
        } else {
            DestroyCheckMode::Lenient
        }
    }

    /// Fresh resource name: `<prefix>-<random suffix>`
    pub fn random_name(&self) -> String {
        format!(
            "{}-{}",
            self.name_prefix,
            random_suffix(self.random_suffix_len)
        )
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.namespace, "default");
        assert_eq!(config.name_prefix, "tf-acc-test");
        assert!(config.supports(Capability::LoadBalancers));
        assert!(!config.supports(Capability::Eks));
        assert_eq!(config.destroy_check_mode(), DestroyCheckMode::Strict);
    }

    #[test]
    fn test_random_name_shape() {
        let config = HarnessConfig::default();
        let name = config.random_name();
        assert!(name.starts_with("tf-acc-test-"));
        assert_eq!(name.len(), "tf-acc-test-".len() + 10);
        assert_ne!(name, config.random_name());
    }

    #[test]
    fn test_lenient_destroy_mode() {
        let config = HarnessConfig {
            strict_destroy_check: false,
            ..HarnessConfig::default()
        };
        assert_eq!(config.destroy_check_mode(), DestroyCheckMode::Lenient);
    }

    #[test]
    fn test_env_var_or_default_unset() {
        assert_eq!(
            env_var_or_default("HARNESS_TEST_SURELY_UNSET_VARIABLE", 7_usize),
            7
        );
    }
}

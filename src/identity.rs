//! # Resource Identity
//!
//! `{namespace, name}` pairs and the opaque `namespace/name` IDs the declarative
//! engine stores for them.

use crate::constants::IDENTIFIER_SEPARATOR;
use crate::error::HarnessError;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Unique external identifier of a namespaced object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceIdentity {
    pub namespace: String,
    pub name: String,
}

impl ResourceIdentity {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parse an opaque `namespace/name` ID
    ///
    /// Splitting must yield exactly two non-empty components.
    pub fn parse(id: &str) -> Result<Self, HarnessError> {
        let parts: Vec<&str> = id.split(IDENTIFIER_SEPARATOR).collect();
        match parts.as_slice() {
            [namespace, name] if !namespace.is_empty() && !name.is_empty() => {
                Ok(Self::new(*namespace, *name))
            }
            [_, _] => Err(HarnessError::InvalidIdentifier {
                id: id.to_string(),
                reason: "namespace and name must both be non-empty".to_string(),
            }),
            _ => Err(HarnessError::InvalidIdentifier {
                id: id.to_string(),
                reason: format!(
                    "expected exactly 2 components separated by '{IDENTIFIER_SEPARATOR}', found {}",
                    parts.len()
                ),
            }),
        }
    }

    /// Opaque ID form, `namespace/name`
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.namespace, IDENTIFIER_SEPARATOR, self.name)
    }
}

impl FromStr for ResourceIdentity {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Random lowercase alphanumeric string of `len` characters
pub fn random_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(SUFFIX_CHARSET[rng.random_range(0..SUFFIX_CHARSET.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_id() {
        let identity = ResourceIdentity::parse("default/tf-acc-test-abc").unwrap();
        assert_eq!(identity.namespace, "default");
        assert_eq!(identity.name, "tf-acc-test-abc");
        assert_eq!(identity.id(), "default/tf-acc-test-abc");
    }

    #[test]
    fn test_parse_rejects_wrong_component_count() {
        for id in ["just-a-name", "a/b/c", ""] {
            let err = ResourceIdentity::parse(id).unwrap_err();
            assert_eq!(err.as_str(), "invalid_identifier", "id {id:?}");
        }
    }

    #[test]
    fn test_parse_rejects_empty_components() {
        for id in ["/name", "namespace/", "/"] {
            assert!(matches!(
                ResourceIdentity::parse(id),
                Err(HarnessError::InvalidIdentifier { .. })
            ));
        }
    }

    #[test]
    fn test_from_str_round_trip() {
        let identity: ResourceIdentity = "kube-system/dns".parse().unwrap();
        assert_eq!(identity, ResourceIdentity::new("kube-system", "dns"));
        assert_eq!(identity.to_string(), "kube-system/dns");
    }

    #[test]
    fn test_random_suffix_is_lowercase_alphanumeric() {
        for len in [0, 5, 10, 40] {
            let suffix = random_suffix(len);
            assert_eq!(suffix.len(), len);
            assert!(suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn test_random_suffix_covers_letters_and_digits() {
        let seen: std::collections::BTreeSet<char> =
            (0..2000).flat_map(|_| random_suffix(10).chars().collect::<Vec<_>>()).collect();
        assert_eq!(seen.len(), SUFFIX_CHARSET.len(), "seen {seen:?}");
        assert!(seen.contains(&'z'));
        assert!(seen.iter().any(|c| ('g'..='z').contains(c)));
    }
}

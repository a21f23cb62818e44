//! # Tracked State
//!
//! What the declarative engine believes it manages: one entry per resource address,
//! holding the kind, the opaque ID and the flattened attributes.

use crate::resource::Attributes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One resource in the engine's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedResource {
    /// Resource kind, e.g. `kubernetes_service`
    pub kind: String,
    /// Opaque ID, `namespace/name` for namespaced kinds
    pub id: String,
    pub attributes: Attributes,
}

impl TrackedResource {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Engine state keyed by resource address (`kubernetes_service.test`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedState {
    pub resources: BTreeMap<String, TrackedResource>,
}

impl TrackedState {
    pub fn get(&self, address: &str) -> Option<&TrackedResource> {
        self.resources.get(address)
    }

    pub fn insert(&mut self, address: impl Into<String>, resource: TrackedResource) {
        self.resources.insert(address.into(), resource);
    }

    pub fn remove(&mut self, address: &str) -> Option<TrackedResource> {
        self.resources.remove(address)
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Build a state from `(address, kind, id)` triples with empty attributes
    pub fn from_ids<I, A, K, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (A, K, S)>,
        A: Into<String>,
        K: Into<String>,
        S: Into<String>,
    {
        let resources = entries
            .into_iter()
            .map(|(address, kind, id)| {
                (
                    address.into(),
                    TrackedResource {
                        kind: kind.into(),
                        id: id.into(),
                        attributes: Attributes::new(),
                    },
                )
            })
            .collect();
        Self { resources }
    }
}

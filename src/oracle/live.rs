//! Live-cluster lookups through `kube::Api<Service>`.

use super::{LookupError, ServiceLookup};
use crate::identity::ResourceIdentity;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use kube::{Api, Client};

/// [`ServiceLookup`] backed by a Kubernetes API client
#[derive(Clone)]
pub struct KubeServiceLookup {
    client: Client,
}

impl std::fmt::Debug for KubeServiceLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeServiceLookup").finish_non_exhaustive()
    }
}

impl KubeServiceLookup {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ServiceLookup for KubeServiceLookup {
    async fn get(&self, identity: &ResourceIdentity) -> Result<Service, LookupError> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), &identity.namespace);
        match api.get(&identity.name).await {
            Ok(service) => Ok(service),
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => Err(LookupError::NotFound),
            Err(e) => Err(LookupError::Transport(e.to_string())),
        }
    }
}

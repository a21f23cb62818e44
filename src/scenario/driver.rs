//! The lifecycle driver seam.

use crate::error::HarnessError;
use crate::fixture::FixtureDocument;
use crate::state::{TrackedResource, TrackedState};
use async_trait::async_trait;

/// Drives configuration documents through a declarative engine
///
/// Implementations own the engine; the harness only sees the resulting state.
#[async_trait]
pub trait LifecycleDriver: Send + Sync {
    /// Converge the remote system on `document` and update `state` to match
    async fn apply(
        &self,
        document: &FixtureDocument,
        state: &mut TrackedState,
    ) -> Result<(), HarnessError>;

    /// Read an existing remote object into a fresh state entry
    async fn import(&self, kind: &str, id: &str) -> Result<TrackedResource, HarnessError>;

    /// Delete every resource in `state` and clear it
    async fn destroy(&self, state: &mut TrackedState) -> Result<(), HarnessError>;
}

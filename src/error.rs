//! # Harness Error Types
//!
//! Every failure a lifecycle step can report. All variants are terminal for the
//! step that produced them; nothing here is retried.

use crate::resource::PortBinding;
use thiserror::Error;

/// Failure of a harness check or lifecycle step
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A scalar attribute did not hold the expected value
    #[error("attribute '{field}' expected {expected:?}, got {actual:?}")]
    AttributeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    /// Observed port list differs from the expected one (allocation fields ignored)
    #[error("service ports don't match.\nExpected: {expected:#?}\nGiven: {actual:#?}")]
    PortListMismatch {
        expected: Vec<PortBinding>,
        actual: Vec<PortBinding>,
    },

    /// The lookup reported absence, or returned a different object
    #[error("service {identity} not found")]
    NotFound { identity: String },

    /// The lookup failed for a reason other than absence
    #[error("lookup of service {identity} failed: {message}")]
    TransportError { identity: String, message: String },

    /// A destroyed service is still present
    #[error("service still exists: {identity}")]
    UnexpectedlyExists { identity: String },

    /// UID survived a change that should have replaced the object
    #[error("expecting new resource for service {uid}")]
    ExpectedReplace { uid: String },

    /// UID changed across a change that should have been applied in place
    #[error("expecting service UIDs to be the same: expected {before} got {after}")]
    ExpectedInPlace { before: String, after: String },

    /// Opaque resource ID is not `<namespace>/<name>`
    #[error("unexpected ID format ({id:?}), expected \"namespace/name\": {reason}")]
    InvalidIdentifier { id: String, reason: String },

    /// Several checks failed in an aggregating composition
    #[error("{}", describe_aggregate(.0))]
    Aggregate(Vec<HarnessError>),

    /// The lifecycle driver could not carry out a step
    #[error("lifecycle driver failed for {address}: {message}")]
    Driver { address: String, message: String },

    /// A continuity check referenced a snapshot no earlier step retained
    #[error("no snapshot retained under label {label:?}")]
    MissingSnapshot { label: String },
}

impl HarnessError {
    /// Short machine-readable name, used as a metrics label
    pub fn as_str(&self) -> &'static str {
        match self {
            HarnessError::AttributeMismatch { .. } => "attribute_mismatch",
            HarnessError::PortListMismatch { .. } => "port_list_mismatch",
            HarnessError::NotFound { .. } => "not_found",
            HarnessError::TransportError { .. } => "transport_error",
            HarnessError::UnexpectedlyExists { .. } => "unexpectedly_exists",
            HarnessError::ExpectedReplace { .. } => "expected_replace",
            HarnessError::ExpectedInPlace { .. } => "expected_in_place",
            HarnessError::InvalidIdentifier { .. } => "invalid_identifier",
            HarnessError::Aggregate(_) => "aggregate",
            HarnessError::Driver { .. } => "driver",
            HarnessError::MissingSnapshot { .. } => "missing_snapshot",
        }
    }

    /// Flatten nested aggregates into their individual failures
    pub fn into_failures(self) -> Vec<HarnessError> {
        match self {
            HarnessError::Aggregate(errors) => errors
                .into_iter()
                .flat_map(HarnessError::into_failures)
                .collect(),
            other => vec![other],
        }
    }
}

fn describe_aggregate(errors: &[HarnessError]) -> String {
    let mut out = format!("{} checks failed:", errors.len());
    for (index, error) in errors.iter().enumerate() {
        out.push_str(&format!("\n{}) {}", index + 1, error));
    }
    out
}

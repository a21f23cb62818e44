//! # State Verifier
//!
//! Checks a step's expectations against two sources: the declarative engine's
//! flattened attributes and the snapshot read straight from the API.
//!
//! A step declares a list of [`Check`]s and a [`CheckMode`]. Fail-fast composition
//! stops at the first failure; aggregate composition runs every check and reports
//! all failures together.

mod ports;

pub use ports::check_ports;

use crate::constants::UNSET_ATTRIBUTE;
use crate::continuity::check_continuity;
use crate::error::HarnessError;
use crate::observability::metrics;
use crate::resource::{Attributes, ObservedResource, PortBinding};
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

/// Snapshots retained by earlier steps, keyed by label
pub type Snapshots = BTreeMap<String, ObservedResource>;

/// One expectation of a lifecycle step
#[derive(Debug, Clone)]
pub enum Check {
    /// Attribute holds exactly this value
    Equals { field: String, expected: String },
    /// Attribute is present, non-empty and not `"0"`
    IsSet { field: String },
    /// Attribute starts with a literal prefix
    Prefix { field: String, prefix: String },
    /// Attribute matches a regular expression
    Matches { field: String, pattern: Regex },
    /// Observed port list equals this list, allocations ignored
    Ports(Vec<PortBinding>),
    /// UID continuity against a snapshot retained under `against`
    Continuity { against: String, expect_new: bool },
}

impl Check {
    pub fn equals(field: impl Into<String>, expected: impl ToString) -> Self {
        Check::Equals {
            field: field.into(),
            expected: expected.to_string(),
        }
    }

    pub fn is_set(field: impl Into<String>) -> Self {
        Check::IsSet {
            field: field.into(),
        }
    }

    /// Attribute starts with `prefix`, taken literally
    pub fn has_prefix(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Check::Prefix {
            field: field.into(),
            prefix: prefix.into(),
        }
    }

    /// Attribute matches a pre-compiled pattern
    pub fn matches(field: impl Into<String>, pattern: Regex) -> Self {
        Check::Matches {
            field: field.into(),
            pattern,
        }
    }

    pub fn ports(expected: Vec<PortBinding>) -> Self {
        Check::Ports(expected)
    }

    /// The object must be the one retained under `label`
    pub fn same_instance_as(label: impl Into<String>) -> Self {
        Check::Continuity {
            against: label.into(),
            expect_new: false,
        }
    }

    /// The object must have been recreated since `label` was retained
    pub fn replaced_since(label: impl Into<String>) -> Self {
        Check::Continuity {
            against: label.into(),
            expect_new: true,
        }
    }

    /// Short machine-readable name, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            Check::Equals { .. } => "equals",
            Check::IsSet { .. } => "is_set",
            Check::Prefix { .. } => "prefix",
            Check::Matches { .. } => "matches",
            Check::Ports(_) => "ports",
            Check::Continuity { .. } => "continuity",
        }
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> Result<(), HarnessError> {
        match self {
            Check::Equals { field, expected } => check_attribute(ctx.attributes, field, expected),
            Check::IsSet { field } => check_attribute_set(ctx.attributes, field),
            Check::Prefix { field, prefix } => {
                check_attribute_prefix(ctx.attributes, field, prefix)
            }
            Check::Matches { field, pattern } => {
                check_attribute_matches(ctx.attributes, field, pattern)
            }
            Check::Ports(expected) => check_ports(&ctx.observed.spec.ports, expected),
            Check::Continuity {
                against,
                expect_new,
            } => {
                let before =
                    ctx.snapshots
                        .get(against)
                        .ok_or_else(|| HarnessError::MissingSnapshot {
                            label: against.clone(),
                        })?;
                check_continuity(before, ctx.observed, *expect_new)
            }
        }
    }
}

/// Everything a check may look at
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    /// Flattened attributes the engine tracks for the resource
    pub attributes: &'a Attributes,
    /// Snapshot read from the API during this step
    pub observed: &'a ObservedResource,
    /// Snapshots retained by earlier steps
    pub snapshots: &'a Snapshots,
}

/// How a list of checks is composed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckMode {
    /// Stop at, and report, the first failure
    #[default]
    FailFast,
    /// Run every check and report all failures
    Aggregate,
}

/// Run `checks` in order under `mode`
///
/// In aggregate mode a single failure is returned as itself; two or more are wrapped
/// in [`HarnessError::Aggregate`].
pub fn run_checks(
    checks: &[Check],
    ctx: &CheckContext<'_>,
    mode: CheckMode,
) -> Result<(), HarnessError> {
    let mut failures = Vec::new();
    for check in checks {
        metrics::increment_checks(check.kind());
        if let Err(error) = check.evaluate(ctx) {
            metrics::increment_check_failures(check.kind());
            debug!(kind = check.kind(), error = %error, "Check failed");
            match mode {
                CheckMode::FailFast => return Err(error),
                CheckMode::Aggregate => failures.push(error),
            }
        }
    }

    match failures.len() {
        0 => Ok(()),
        1 => Err(failures.remove(0)),
        _ => Err(HarnessError::Aggregate(failures)),
    }
}

fn actual_value(attributes: &Attributes, field: &str) -> String {
    attributes
        .get(field)
        .cloned()
        .unwrap_or_else(|| UNSET_ATTRIBUTE.to_string())
}

/// Exact string equality on one attribute
pub fn check_attribute(
    attributes: &Attributes,
    field: &str,
    expected: &str,
) -> Result<(), HarnessError> {
    match attributes.get(field) {
        Some(actual) if actual == expected => Ok(()),
        _ => Err(HarnessError::AttributeMismatch {
            field: field.to_string(),
            expected: expected.to_string(),
            actual: actual_value(attributes, field),
        }),
    }
}

/// Attribute is present, non-empty and not `"0"`
pub fn check_attribute_set(attributes: &Attributes, field: &str) -> Result<(), HarnessError> {
    match attributes.get(field).map(String::as_str) {
        Some(value) if !value.is_empty() && value != "0" => Ok(()),
        _ => Err(HarnessError::AttributeMismatch {
            field: field.to_string(),
            expected: "<set>".to_string(),
            actual: actual_value(attributes, field),
        }),
    }
}

/// Attribute starts with `prefix`
pub fn check_attribute_prefix(
    attributes: &Attributes,
    field: &str,
    prefix: &str,
) -> Result<(), HarnessError> {
    match attributes.get(field) {
        Some(actual) if actual.starts_with(prefix) => Ok(()),
        _ => Err(HarnessError::AttributeMismatch {
            field: field.to_string(),
            expected: format!("prefix {prefix:?}"),
            actual: actual_value(attributes, field),
        }),
    }
}

/// Attribute matches `pattern`
pub fn check_attribute_matches(
    attributes: &Attributes,
    field: &str,
    pattern: &Regex,
) -> Result<(), HarnessError> {
    match attributes.get(field) {
        Some(actual) if pattern.is_match(actual) => Ok(()),
        _ => Err(HarnessError::AttributeMismatch {
            field: field.to_string(),
            expected: format!("match /{}/", pattern.as_str()),
            actual: actual_value(attributes, field),
        }),
    }
}

/// Compare re-imported attributes with the tracked ones
///
/// Keys starting with any `ignore` entry are skipped. Every differing key yields an
/// `AttributeMismatch` with the tracked value as expected; more than one mismatch is
/// reported as an aggregate.
pub fn check_import_state(
    tracked: &Attributes,
    imported: &Attributes,
    ignore: &[String],
) -> Result<(), HarnessError> {
    let ignored = |key: &str| ignore.iter().any(|prefix| key.starts_with(prefix.as_str()));

    let mut keys: Vec<&String> = tracked.keys().chain(imported.keys()).collect();
    keys.sort();
    keys.dedup();

    let mut failures: Vec<HarnessError> = keys
        .into_iter()
        .filter(|key| !ignored(key))
        .filter(|key| tracked.get(*key) != imported.get(*key))
        .map(|key| HarnessError::AttributeMismatch {
            field: key.clone(),
            expected: actual_value(tracked, key),
            actual: actual_value(imported, key),
        })
        .collect();

    match failures.len() {
        0 => Ok(()),
        1 => Err(failures.remove(0)),
        _ => Err(HarnessError::Aggregate(failures)),
    }
}

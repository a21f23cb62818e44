//! # Lifecycle Scenarios
//!
//! A scenario is an ordered list of steps run against one logical resource: apply a
//! fixture and check the result, or re-import the resource and compare. After the
//! last step the runner destroys everything and confirms the destruction directly
//! against the API.
//!
//! Each scenario carries its own names, tracked state and snapshots; nothing is
//! shared between scenarios.

pub mod catalog;
mod driver;
mod runner;

pub use driver::LifecycleDriver;
pub use runner::{LifecycleRunner, ScenarioContext, ScenarioOutcome, ScenarioReport};

use crate::config::Capability;
use crate::fixture::FixtureDocument;
use crate::verify::{Check, CheckMode};

/// Apply a fixture, then verify the outcome
#[derive(Debug, Clone)]
pub struct ApplyStep {
    pub document: FixtureDocument,
    pub checks: Vec<Check>,
    pub mode: CheckMode,
    /// Keep this step's snapshot under a label for later continuity checks
    pub retain_as: Option<String>,
}

impl ApplyStep {
    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    pub fn checks(mut self, checks: impl IntoIterator<Item = Check>) -> Self {
        self.checks.extend(checks);
        self
    }

    /// Report every failing check instead of the first
    pub fn aggregate(mut self) -> Self {
        self.mode = CheckMode::Aggregate;
        self
    }

    pub fn retain_as(mut self, label: impl Into<String>) -> Self {
        self.retain_as = Some(label.into());
        self
    }
}

/// Re-import a tracked resource by ID and compare attributes
#[derive(Debug, Clone)]
pub struct ImportStep {
    pub address: String,
    /// Attribute key prefixes excluded from the comparison
    pub ignore: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum Step {
    Apply(ApplyStep),
    ImportVerify(ImportStep),
}

impl Step {
    pub fn apply(document: impl Into<FixtureDocument>) -> ApplyStep {
        ApplyStep {
            document: document.into(),
            checks: Vec::new(),
            mode: CheckMode::default(),
            retain_as: None,
        }
    }

    pub fn import_verify<I, S>(address: impl Into<String>, ignore: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Step::ImportVerify(ImportStep {
            address: address.into(),
            ignore: ignore.into_iter().map(Into::into).collect(),
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Apply(_) => "apply",
            Step::ImportVerify(_) => "import_verify",
        }
    }
}

impl From<ApplyStep> for Step {
    fn from(step: ApplyStep) -> Self {
        Step::Apply(step)
    }
}

/// Named sequence of lifecycle steps
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    /// Capabilities the environment must provide, else the scenario is skipped
    pub requires: Vec<Capability>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requires: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn requires(mut self, capability: Capability) -> Self {
        self.requires.push(capability);
        self
    }

    pub fn step(mut self, step: impl Into<Step>) -> Self {
        self.steps.push(step.into());
        self
    }
}

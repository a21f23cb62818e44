//! # Scenario Runner
//!
//! Executes a [`Scenario`] step by step against a [`LifecycleDriver`], reading the
//! remote object through the oracle after every apply.

use super::{ApplyStep, ImportStep, LifecycleDriver, Scenario, Step};
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::identity::ResourceIdentity;
use crate::observability::metrics;
use crate::oracle::ServiceOracle;
use crate::state::{TrackedResource, TrackedState};
use crate::verify::{check_import_state, run_checks, CheckContext, Snapshots};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// How a scenario ended, when it did not fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "reason")]
pub enum ScenarioOutcome {
    Passed,
    /// Required capability missing from the environment
    Skipped(String),
}

impl ScenarioOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioOutcome::Passed => "passed",
            ScenarioOutcome::Skipped(_) => "skipped",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    #[serde(flatten)]
    pub outcome: ScenarioOutcome,
    pub steps_run: usize,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u128,
}

/// Per-scenario mutable context
///
/// Created fresh for each run and dropped when the run ends.
#[derive(Debug, Default)]
pub struct ScenarioContext {
    pub state: TrackedState,
    pub snapshots: Snapshots,
}

/// Runs scenarios with a driver, an oracle and the harness settings
#[derive(Clone)]
pub struct LifecycleRunner {
    driver: Arc<dyn LifecycleDriver>,
    oracle: ServiceOracle,
    config: HarnessConfig,
}

impl std::fmt::Debug for LifecycleRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleRunner")
            .field("oracle", &self.oracle)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LifecycleRunner {
    pub fn new(
        driver: Arc<dyn LifecycleDriver>,
        oracle: ServiceOracle,
        config: HarnessConfig,
    ) -> Self {
        Self {
            driver,
            oracle,
            config,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run one scenario to completion
    ///
    /// Whatever happens in the steps, everything applied is destroyed and the
    /// destruction confirmed before returning. A step failure takes precedence over
    /// a failure during teardown.
    pub async fn run(&self, scenario: &Scenario) -> Result<ScenarioReport, HarnessError> {
        let span = info_span!("scenario.run", scenario.name = %scenario.name);
        let started_at = Utc::now();
        let start = Instant::now();

        async move {
            if let Some(missing) = scenario
                .requires
                .iter()
                .find(|capability| !self.config.supports(**capability))
            {
                let reason = format!("environment does not provide {missing}");
                info!(reason = %reason, "Skipping scenario");
                metrics::increment_scenarios("skipped");
                return Ok(ScenarioReport {
                    name: scenario.name.clone(),
                    outcome: ScenarioOutcome::Skipped(reason),
                    steps_run: 0,
                    started_at,
                    duration_ms: start.elapsed().as_millis(),
                });
            }

            let mut ctx = ScenarioContext::default();
            let mut steps_run = 0;
            let mut result = Ok(());
            for (index, step) in scenario.steps.iter().enumerate() {
                let step_span =
                    info_span!("scenario.step", step.index = index, step.kind = step.as_str());
                result = self.run_step(step, &mut ctx).instrument(step_span).await;
                steps_run += 1;
                if let Err(e) = &result {
                    error!(step = index, error = %e, "Step failed");
                    break;
                }
            }

            let teardown = self.teardown(&mut ctx).await;
            let outcome = match (result, teardown) {
                (Err(e), teardown) => {
                    if let Err(teardown_err) = teardown {
                        warn!(error = %teardown_err, "Teardown failed after step failure");
                    }
                    Err(e)
                }
                (Ok(()), Err(e)) => Err(e),
                (Ok(()), Ok(())) => Ok(()),
            };

            match outcome {
                Ok(()) => {
                    metrics::increment_scenarios("passed");
                    info!(steps = steps_run, "Scenario passed");
                    Ok(ScenarioReport {
                        name: scenario.name.clone(),
                        outcome: ScenarioOutcome::Passed,
                        steps_run,
                        started_at,
                        duration_ms: start.elapsed().as_millis(),
                    })
                }
                Err(e) => {
                    metrics::increment_scenarios("failed");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_step(&self, step: &Step, ctx: &mut ScenarioContext) -> Result<(), HarnessError> {
        match step {
            Step::Apply(apply) => self.run_apply(apply, ctx).await,
            Step::ImportVerify(import) => self.run_import(import, ctx).await,
        }
    }

    async fn run_apply(
        &self,
        step: &ApplyStep,
        ctx: &mut ScenarioContext,
    ) -> Result<(), HarnessError> {
        let address = step.document.service.address();
        self.driver.apply(&step.document, &mut ctx.state).await?;

        let tracked = tracked_resource(&ctx.state, &address)?;
        let identity = ResourceIdentity::parse(&tracked.id)?;
        let observed = self.oracle.exists(&identity).await?;
        debug!(address = %address, identity = %identity, uid = %observed.uid(), "Applied");

        let check_ctx = CheckContext {
            attributes: &tracked.attributes,
            observed: &observed,
            snapshots: &ctx.snapshots,
        };
        run_checks(&step.checks, &check_ctx, step.mode)?;

        if let Some(label) = &step.retain_as {
            ctx.snapshots.insert(label.clone(), observed);
        }
        Ok(())
    }

    async fn run_import(
        &self,
        step: &ImportStep,
        ctx: &mut ScenarioContext,
    ) -> Result<(), HarnessError> {
        let tracked = tracked_resource(&ctx.state, &step.address)?;
        let imported = self.driver.import(&tracked.kind, &tracked.id).await?;
        debug!(address = %step.address, id = %tracked.id, "Imported");
        check_import_state(&tracked.attributes, &imported.attributes, &step.ignore)
    }

    async fn teardown(&self, ctx: &mut ScenarioContext) -> Result<(), HarnessError> {
        if ctx.state.is_empty() {
            return Ok(());
        }
        let applied = ctx.state.clone();
        self.driver.destroy(&mut ctx.state).await?;
        self.oracle.confirm_destroyed(&applied).await?;
        debug!(resources = applied.resources.len(), "Destruction confirmed");
        Ok(())
    }
}

fn tracked_resource(state: &TrackedState, address: &str) -> Result<TrackedResource, HarnessError> {
    state
        .get(address)
        .cloned()
        .ok_or_else(|| HarnessError::Driver {
            address: address.to_string(),
            message: "resource missing from tracked state".to_string(),
        })
}

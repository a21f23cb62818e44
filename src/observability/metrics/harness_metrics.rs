//! # Harness Metrics
//!
//! Counters for attribute/port/continuity checks, direct API lookups and scenario outcomes.

use crate::observability::metrics::registry::REGISTRY;
use anyhow::Result;
use prometheus::IntCounterVec;
use std::sync::LazyLock;

// Check metrics
static CHECKS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "service_harness_checks_total",
            "Total number of checks evaluated, by check kind",
        ),
        &["kind"],
    )
    .expect("Failed to create CHECKS_TOTAL metric - this should never happen")
});

static CHECK_FAILURES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "service_harness_check_failures_total",
            "Total number of failed checks, by check kind",
        ),
        &["kind"],
    )
    .expect("Failed to create CHECK_FAILURES_TOTAL metric - this should never happen")
});

// Oracle metrics
static LOOKUPS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "service_harness_lookups_total",
            "Total number of direct API lookups, by outcome (found, not_found, transport_error)",
        ),
        &["outcome"],
    )
    .expect("Failed to create LOOKUPS_TOTAL metric - this should never happen")
});

// Scenario metrics
static SCENARIOS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "service_harness_scenarios_total",
            "Total number of scenarios run, by outcome (passed, skipped, failed)",
        ),
        &["outcome"],
    )
    .expect("Failed to create SCENARIOS_TOTAL metric - this should never happen")
});

/// Register harness metrics with the registry
pub(crate) fn register_harness_metrics() -> Result<()> {
    REGISTRY.register(Box::new(CHECKS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CHECK_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(LOOKUPS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SCENARIOS_TOTAL.clone()))?;
    Ok(())
}

// Public functions for harness metrics

pub fn increment_checks(kind: &str) {
    CHECKS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_check_failures(kind: &str) {
    CHECK_FAILURES_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_lookups(outcome: &str) {
    LOOKUPS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn increment_scenarios(outcome: &str) {
    SCENARIOS_TOTAL.with_label_values(&[outcome]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_checks() {
        let before = CHECKS_TOTAL.with_label_values(&["equals"]).get();
        increment_checks("equals");
        let after = CHECKS_TOTAL.with_label_values(&["equals"]).get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_increment_check_failures_is_per_kind() {
        let ports_before = CHECK_FAILURES_TOTAL.with_label_values(&["ports"]).get();
        let set_before = CHECK_FAILURES_TOTAL.with_label_values(&["is_set"]).get();
        increment_check_failures("ports");
        assert_eq!(
            CHECK_FAILURES_TOTAL.with_label_values(&["ports"]).get(),
            ports_before + 1u64
        );
        assert_eq!(
            CHECK_FAILURES_TOTAL.with_label_values(&["is_set"]).get(),
            set_before
        );
    }

    #[test]
    fn test_increment_lookups_and_scenarios() {
        let before = LOOKUPS_TOTAL.with_label_values(&["not_found"]).get();
        increment_lookups("not_found");
        assert_eq!(
            LOOKUPS_TOTAL.with_label_values(&["not_found"]).get(),
            before + 1u64
        );

        let before = SCENARIOS_TOTAL.with_label_values(&["skipped"]).get();
        increment_scenarios("skipped");
        assert_eq!(
            SCENARIOS_TOTAL.with_label_values(&["skipped"]).get(),
            before + 1u64
        );
    }
}

//! Prometheus metrics for verification flows.
//!
//! [`CoordinatorMetrics`] owns a dedicated [`Registry`] that an embedding
//! service can encode into the Prometheus text exposition format.

use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, IntCounter, IntGauge,
    Opts, Registry,
};

use crate::FlowOutcome;

/// Counters per terminal state plus the number of flows in progress.
pub struct CoordinatorMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Flows accepted by `start`.
    pub flows_started: IntCounter,
    /// Flows whose self-payment was seen, recorded and applied.
    pub flows_confirmed: IntCounter,
    /// Flows whose attempt budget ran out.
    pub flows_timed_out: IntCounter,
    /// Flows cancelled before a terminal state.
    pub flows_cancelled: IntCounter,
    /// Flows that ended in an error.
    pub flows_failed: IntCounter,
    /// Start requests refused because the key was busy.
    pub flows_rejected_in_progress: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Flows currently signing or watching.
    pub active_flows: IntGauge,
}

impl CoordinatorMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        let flows_started = register_int_counter_with_registry!(
            Opts::new("selfproof_flows_started_total", "Verification flows started"),
            registry
        )
        .expect("failed to register flows_started counter");

        let flows_confirmed = register_int_counter_with_registry!(
            Opts::new(
                "selfproof_flows_confirmed_total",
                "Verification flows confirmed and recorded"
            ),
            registry
        )
        .expect("failed to register flows_confirmed counter");

        let flows_timed_out = register_int_counter_with_registry!(
            Opts::new(
                "selfproof_flows_timed_out_total",
                "Verification flows that exhausted their attempt budget"
            ),
            registry
        )
        .expect("failed to register flows_timed_out counter");

        let flows_cancelled = register_int_counter_with_registry!(
            Opts::new(
                "selfproof_flows_cancelled_total",
                "Verification flows cancelled by the caller"
            ),
            registry
        )
        .expect("failed to register flows_cancelled counter");

        let flows_failed = register_int_counter_with_registry!(
            Opts::new("selfproof_flows_failed_total", "Verification flows that failed"),
            registry
        )
        .expect("failed to register flows_failed counter");

        let flows_rejected_in_progress = register_int_counter_with_registry!(
            Opts::new(
                "selfproof_flows_rejected_in_progress_total",
                "Start requests refused because a flow for the key was running"
            ),
            registry
        )
        .expect("failed to register flows_rejected_in_progress counter");

        let active_flows = register_int_gauge_with_registry!(
            Opts::new("selfproof_active_flows", "Verification flows in progress"),
            registry
        )
        .expect("failed to register active_flows gauge");

        Self {
            registry,
            flows_started,
            flows_confirmed,
            flows_timed_out,
            flows_cancelled,
            flows_failed,
            flows_rejected_in_progress,
            active_flows,
        }
    }

    pub(crate) fn record_outcome(&self, outcome: &FlowOutcome) {
        match outcome {
            FlowOutcome::Confirmed { .. } => self.flows_confirmed.inc(),
            FlowOutcome::TimedOut { .. } => self.flows_timed_out.inc(),
            FlowOutcome::Cancelled => self.flows_cancelled.inc(),
            FlowOutcome::Failed(_) => self.flows_failed.inc(),
        }
    }
}

impl Default for CoordinatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_metric_is_registered() {
        let metrics = CoordinatorMetrics::new();
        metrics.flows_started.inc();
        metrics.active_flows.set(2);
        let names: Vec<String> = metrics
            .registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert_eq!(names.len(), 7);
        assert!(names.contains(&"selfproof_active_flows".to_string()));
    }

    #[test]
    fn outcomes_land_in_their_counter() {
        let metrics = CoordinatorMetrics::new();
        metrics.record_outcome(&FlowOutcome::Cancelled);
        metrics.record_outcome(&FlowOutcome::TimedOut { attempts: 200 });
        metrics.record_outcome(&FlowOutcome::TimedOut { attempts: 200 });
        assert_eq!(metrics.flows_cancelled.get(), 1);
        assert_eq!(metrics.flows_timed_out.get(), 2);
        assert_eq!(metrics.flows_confirmed.get(), 0);
    }
}

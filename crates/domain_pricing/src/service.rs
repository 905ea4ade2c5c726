//! Evaluation service
//!
//! The composition root of the engine. One call runs the whole pipeline
//! against a snapshot:
//!
//! ```text
//! scenario + snapshot ─► ZoneResolver ─► RuleMatcher ─► RuleCompositor
//!                                                      │
//!            EvaluationResult ◄─ EvaluationReporter ◄─ PriceClamp
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use core_kernel::{BusinessId, Currency, RuleId};

use crate::clamp::PriceClamp;
use crate::compositor::RuleCompositor;
use crate::error::PricingError;
use crate::matcher::RuleMatcher;
use crate::ports::{DistanceService, UsageRecorder};
use crate::report::{EvaluationReporter, EvaluationResult};
use crate::resolver::{lookup_drive_time, ZoneResolver};
use crate::scenario::QuoteScenario;
use crate::snapshot::SnapshotStore;

/// Engine-level settings
#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    /// Upper bound on the drive-time lookup
    pub drive_time_timeout: Duration,
    pub currency: Currency,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            drive_time_timeout: Duration::from_millis(1500),
            currency: Currency::USD,
        }
    }
}

/// Fire-and-forget channel in front of a [`UsageRecorder`]
///
/// `record` never waits: when the queue is full the increment is dropped and
/// logged. A background task drains the queue.
#[derive(Clone)]
pub struct UsageDispatcher {
    sender: mpsc::Sender<RuleId>,
}

impl UsageDispatcher {
    /// Spawns the draining task; must be called inside a tokio runtime
    pub fn spawn(recorder: Arc<dyn UsageRecorder>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<RuleId>(capacity.max(1));
        let handle = tokio::spawn(async move {
            while let Some(rule_id) = receiver.recv().await {
                if let Err(e) = recorder.increment(rule_id).await {
                    warn!(%rule_id, error = %e, "Failed to record rule usage");
                }
            }
            debug!("Usage dispatcher stopped");
        });
        (Self { sender }, handle)
    }

    pub fn record(&self, rule_id: RuleId) {
        if let Err(e) = self.sender.try_send(rule_id) {
            warn!(%rule_id, error = %e, "Dropped rule usage increment");
        }
    }
}

/// Runs evaluations against cached snapshots
pub struct EvaluationService {
    snapshots: Arc<SnapshotStore>,
    distance: Arc<dyn DistanceService>,
    usage: UsageDispatcher,
    config: EvaluationConfig,
}

impl EvaluationService {
    pub fn new(
        snapshots: Arc<SnapshotStore>,
        distance: Arc<dyn DistanceService>,
        usage: UsageDispatcher,
        config: EvaluationConfig,
    ) -> Self {
        Self {
            snapshots,
            distance,
            usage,
            config,
        }
    }

    pub fn snapshots(&self) -> &Arc<SnapshotStore> {
        &self.snapshots
    }

    /// Prices a scenario for a business
    ///
    /// # Errors
    ///
    /// * `PricingError::Validation` - the scenario is malformed, or pricing
    ///   it leaves the decimal range
    /// * `PricingError::SnapshotUnavailable` - no pricing data could be loaded
    #[instrument(skip(self, scenario), fields(services = scenario.services.len()))]
    pub async fn evaluate(
        &self,
        scenario: &QuoteScenario,
        business_id: BusinessId,
    ) -> Result<EvaluationResult, PricingError> {
        scenario.validate()?;

        let handle = self.snapshots.get(business_id).await?;
        let snapshot = handle.snapshot.as_ref();
        let info = snapshot.info(handle.stale);
        let reporter = EvaluationReporter::new(self.config.currency);
        let zone_config = snapshot.zone_config.as_ref();

        let drive_time = lookup_drive_time(
            self.distance.as_ref(),
            scenario,
            zone_config,
            self.config.drive_time_timeout,
        )
        .await;
        let resolution = ZoneResolver::resolve(scenario, zone_config, &snapshot.postal_index, &drive_time);

        if !resolution.serviceable {
            info!(
                %business_id,
                snapshot_version = snapshot.version,
                reason = resolution.reason.as_deref().unwrap_or_default(),
                upstream_unavailable = resolution.upstream_unavailable,
                "Scenario not serviceable"
            );
            return Ok(reporter.unserviceable(business_id, info, scenario, &resolution)?);
        }

        let outcome = RuleMatcher::match_rules(scenario, &snapshot.rules);
        let composed = RuleCompositor::compose(scenario, &outcome.matched, &resolution, zone_config)?;
        let bounds = PriceClamp::collect_bounds(&outcome.matched, &resolution, zone_config);
        let clamped = PriceClamp::clamp(composed.total, &bounds);

        let applied = outcome.matched.len();
        let rejected = outcome.rejected.len();
        let result = reporter.report(business_id, info, &composed, &clamped, outcome.rejected, &resolution)?;

        for rule_id in result.applied_rule_ids() {
            self.usage.record(rule_id);
        }

        info!(
            %business_id,
            snapshot_version = result.snapshot_version,
            snapshot_stale = result.snapshot_stale,
            applied,
            rejected,
            original_total = %result.original_total,
            adjusted_total = %result.adjusted_total,
            "Scenario evaluated"
        );

        Ok(result)
    }
}

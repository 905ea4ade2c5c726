//! Evaluation results
//!
//! The reporter is the only place amounts are rounded. Everything upstream
//! works on full-precision decimals.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use core_kernel::{percent_of, BusinessId, Currency, Money, MoneyError, RuleId, ZoneId};

use crate::clamp::ClampOutcome;
use crate::compositor::{ComposedPricing, TierSource};
use crate::matcher::RejectedRule;
use crate::resolver::ZoneResolution;
use crate::rule::RuleType;
use crate::scenario::{QuoteScenario, ServiceType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedRule {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub rule_type: RuleType,
    pub adjustment_amount: Decimal,
    /// e.g. `-$11.75 (-10%)`
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnappliedRule {
    pub rule_id: RuleId,
    pub name: String,
    pub rule_type: RuleType,
    pub reason: String,
}

impl From<RejectedRule> for UnappliedRule {
    fn from(rejected: RejectedRule) -> Self {
        Self {
            rule_id: rejected.rule_id,
            name: rejected.name,
            rule_type: rejected.rule_type,
            reason: rejected.reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustedService {
    pub name: String,
    pub service_type: ServiceType,
    pub original_total: Decimal,
    pub adjusted_total: Decimal,
    pub difference: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierAdjustmentEntry {
    pub source: TierSource,
    pub label: String,
    pub adjustment_amount: Decimal,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneOutcome {
    pub zone_id: Option<ZoneId>,
    pub zone_name: Option<String>,
    pub serviceable: bool,
    pub reason: Option<String>,
    pub drive_time_minutes: Option<u32>,
    /// Code of the postal tier that priced the quote
    pub postal_tier: Option<String>,
}

impl From<&ZoneResolution> for ZoneOutcome {
    fn from(resolution: &ZoneResolution) -> Self {
        Self {
            zone_id: resolution.zone.as_ref().map(|z| z.zone_id),
            zone_name: resolution.zone.as_ref().map(|z| z.name.clone()),
            serviceable: resolution.serviceable,
            reason: resolution.reason.clone(),
            drive_time_minutes: resolution.drive_time_minutes,
            postal_tier: resolution.postal_rule.as_ref().map(|p| p.code.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClampTrace {
    pub minimum: Option<Decimal>,
    pub maximum: Option<Decimal>,
    pub adjustment: Decimal,
}

/// Snapshot metadata attached to every result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub version: u64,
    pub fetched_at: DateTime<Utc>,
    pub stale: bool,
}

/// The explainable outcome of one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub business_id: BusinessId,
    pub currency: Currency,
    pub original_total: Decimal,
    pub adjusted_total: Decimal,
    pub total_adjustment: Decimal,
    pub percentage_change: Decimal,
    pub applied_rules: Vec<AppliedRule>,
    pub unapplied_rules: Vec<UnappliedRule>,
    pub adjusted_services: Vec<AdjustedService>,
    pub tier_adjustments: Vec<TierAdjustmentEntry>,
    pub zone_resolved: ZoneOutcome,
    pub clamp: ClampTrace,
    pub snapshot_version: u64,
    pub snapshot_fetched_at: DateTime<Utc>,
    pub snapshot_stale: bool,
    pub upstream_unavailable: bool,
    pub warnings: Vec<String>,
}

impl EvaluationResult {
    /// Ids of the rules that changed the price
    pub fn applied_rule_ids(&self) -> Vec<RuleId> {
        self.applied_rules.iter().map(|r| r.rule_id).collect()
    }
}

pub const UPSTREAM_UNAVAILABLE_WARNING: &str = "drive-time lookup unavailable; zone pricing skipped";

/// Formats and aggregates; performs no pricing decisions
#[derive(Debug, Clone, Copy)]
pub struct EvaluationReporter {
    currency: Currency,
}

impl EvaluationReporter {
    pub fn new(currency: Currency) -> Self {
        Self { currency }
    }

    fn round(&self, amount: Decimal) -> Decimal {
        Money::new(amount, self.currency).round_to_currency().amount()
    }

    /// Renders a signed amount with its percentage, e.g. `-$11.75 (-10%)`
    pub fn impact(&self, amount: Decimal, percentage: Decimal) -> String {
        let money = Money::new(amount, self.currency).round_to_currency();
        let pct = percentage
            .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
            .normalize();
        let sign = if pct > Decimal::ZERO { "+" } else { "" };
        let pct_text = if pct.is_zero() { "0".to_string() } else { pct.to_string() };
        format!("{} ({}{}%)", money.format_signed(), sign, pct_text)
    }

    pub fn report(
        &self,
        business_id: BusinessId,
        snapshot: SnapshotInfo,
        composed: &ComposedPricing,
        clamped: &ClampOutcome,
        rejected: Vec<RejectedRule>,
        resolution: &ZoneResolution,
    ) -> Result<EvaluationResult, MoneyError> {
        let original_total = self.round(composed.original_total);
        let adjusted_total = self.round(clamped.total);
        let total_adjustment = adjusted_total - original_total;

        let applied_rules = composed
            .rule_impacts
            .iter()
            .map(|impact| AppliedRule {
                rule_id: impact.rule_id,
                rule_name: impact.rule_name.clone(),
                rule_type: impact.rule_type,
                adjustment_amount: self.round(impact.amount),
                impact: self.impact(impact.amount, impact.percentage),
            })
            .collect();

        let adjusted_services = composed
            .services
            .iter()
            .map(|s| {
                let original = self.round(s.original);
                let adjusted = self.round(s.adjusted);
                AdjustedService {
                    name: s.name.clone(),
                    service_type: s.service_type,
                    original_total: original,
                    adjusted_total: adjusted,
                    difference: adjusted - original,
                }
            })
            .collect();

        let tier_adjustments = composed
            .tier_adjustments
            .iter()
            .map(|t| TierAdjustmentEntry {
                source: t.source,
                label: t.label.clone(),
                adjustment_amount: self.round(t.amount),
                impact: self.impact(t.amount, t.percentage),
            })
            .collect();

        let mut warnings = composed.warnings.clone();
        warnings.extend(clamped.warnings.iter().cloned());
        if resolution.upstream_unavailable {
            warnings.push(UPSTREAM_UNAVAILABLE_WARNING.to_string());
        }

        Ok(EvaluationResult {
            business_id,
            currency: self.currency,
            original_total,
            adjusted_total,
            total_adjustment,
            percentage_change: self.percentage_change(total_adjustment, original_total)?,
            applied_rules,
            unapplied_rules: rejected.into_iter().map(UnappliedRule::from).collect(),
            adjusted_services,
            tier_adjustments,
            zone_resolved: ZoneOutcome::from(resolution),
            clamp: ClampTrace {
                minimum: clamped.effective_minimum,
                maximum: clamped.effective_maximum,
                adjustment: self.round(clamped.adjustment),
            },
            snapshot_version: snapshot.version,
            snapshot_fetched_at: snapshot.fetched_at,
            snapshot_stale: snapshot.stale,
            upstream_unavailable: resolution.upstream_unavailable,
            warnings,
        })
    }

    /// An unserviceable scenario is priced as-is with an empty rule trace
    pub fn unserviceable(
        &self,
        business_id: BusinessId,
        snapshot: SnapshotInfo,
        scenario: &QuoteScenario,
        resolution: &ZoneResolution,
    ) -> Result<EvaluationResult, MoneyError> {
        let original_total = self.round(scenario.original_total()?);
        let mut warnings = Vec::new();
        if resolution.upstream_unavailable {
            warnings.push(UPSTREAM_UNAVAILABLE_WARNING.to_string());
        }

        let adjusted_services = scenario
            .services
            .iter()
            .map(|s| -> Result<AdjustedService, MoneyError> {
                let total = self.round(s.subtotal()?);
                Ok(AdjustedService {
                    name: s.name.clone(),
                    service_type: s.service_type,
                    original_total: total,
                    adjusted_total: total,
                    difference: Decimal::ZERO,
                })
            })
            .collect::<Result<Vec<_>, MoneyError>>()?;

        Ok(EvaluationResult {
            business_id,
            currency: self.currency,
            original_total,
            adjusted_total: original_total,
            total_adjustment: Decimal::ZERO,
            percentage_change: Decimal::ZERO,
            applied_rules: Vec::new(),
            unapplied_rules: Vec::new(),
            adjusted_services,
            tier_adjustments: Vec::new(),
            zone_resolved: ZoneOutcome::from(resolution),
            clamp: ClampTrace::default(),
            snapshot_version: snapshot.version,
            snapshot_fetched_at: snapshot.fetched_at,
            snapshot_stale: snapshot.stale,
            upstream_unavailable: resolution.upstream_unavailable,
            warnings,
        })
    }

    fn percentage_change(&self, adjustment: Decimal, original: Decimal) -> Result<Decimal, MoneyError> {
        Ok(percent_of(adjustment, original)?.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
    }
}

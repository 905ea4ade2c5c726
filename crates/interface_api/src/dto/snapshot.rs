//! Snapshot DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;

use core_kernel::{BusinessId, RuleId, ZoneId};
use domain_pricing::{PricingSnapshot, RuleType};

/// What the engine currently prices a business with
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    pub business_id: BusinessId,
    pub version: u64,
    pub fetched_at: DateTime<Utc>,
    pub age_secs: u64,
    pub stale: bool,
    pub rules: Vec<RuleSummary>,
    pub zones: Vec<ZoneSummary>,
    pub postal_tiers: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSummary {
    pub rule_id: RuleId,
    pub name: String,
    pub rule_type: RuleType,
    pub priority: i32,
    pub is_active: bool,
    pub applied_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSummary {
    pub zone_id: ZoneId,
    pub name: String,
    pub min_drive_time_minutes: u32,
    pub max_drive_time_minutes: Option<u32>,
    pub is_active: bool,
}

impl SnapshotResponse {
    pub fn new(snapshot: &PricingSnapshot, stale: bool) -> Self {
        Self {
            business_id: snapshot.business_id,
            version: snapshot.version,
            fetched_at: snapshot.fetched_at,
            age_secs: snapshot.age(Utc::now()).as_secs(),
            stale,
            rules: snapshot
                .rules
                .iter()
                .map(|rule| RuleSummary {
                    rule_id: rule.id,
                    name: rule.name.clone(),
                    rule_type: rule.rule_type(),
                    priority: rule.priority,
                    is_active: rule.is_active,
                    applied_count: rule.applied_count,
                })
                .collect(),
            zones: snapshot
                .zone_config
                .iter()
                .flat_map(|config| config.zones.iter())
                .map(|zone| ZoneSummary {
                    zone_id: zone.zone_id,
                    name: zone.name.clone(),
                    min_drive_time_minutes: zone.min_drive_time_minutes,
                    max_drive_time_minutes: zone.max_drive_time_minutes,
                    is_active: zone.is_active,
                })
                .collect(),
            postal_tiers: snapshot.postal_index.len(),
        }
    }
}

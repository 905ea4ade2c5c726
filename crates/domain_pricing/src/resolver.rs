//! Zone resolution
//!
//! Resolution is split in two. [`lookup_drive_time`] performs the only
//! blocking call in an evaluation, under an explicit timeout, and folds every
//! failure into [`DriveTimeLookup::Unavailable`]. [`ZoneResolver::resolve`]
//! is then a pure function of the scenario, the snapshot and that lookup.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ports::DistanceService;
use crate::scenario::QuoteScenario;
use crate::zone::{PostalIndex, PostalPricingRule, ServiceZone, ZoneConfig};

pub const OUTSIDE_SERVICE_AREA: &str = "outside service area";

/// Outcome of the drive-time lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveTimeLookup {
    /// No coordinates or no zone configuration; nothing to look up
    NotRequested,
    Minutes(u32),
    /// The distance service failed or timed out
    Unavailable(String),
}

/// Where a scenario landed geographically
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneResolution {
    pub zone: Option<ServiceZone>,
    pub postal_rule: Option<PostalPricingRule>,
    pub serviceable: bool,
    pub reason: Option<String>,
    pub drive_time_minutes: Option<u32>,
    /// The distance service could not answer
    pub upstream_unavailable: bool,
}

impl ZoneResolution {
    fn serviceable(postal_rule: Option<PostalPricingRule>) -> Self {
        Self {
            zone: None,
            postal_rule,
            serviceable: true,
            reason: None,
            drive_time_minutes: None,
            upstream_unavailable: false,
        }
    }
}

/// Fetches drive-time minutes from the shop to the scenario's coordinates
pub async fn lookup_drive_time(
    distance: &dyn DistanceService,
    scenario: &QuoteScenario,
    zone_config: Option<&ZoneConfig>,
    timeout: Duration,
) -> DriveTimeLookup {
    let (Some(destination), Some(config)) = (scenario.coordinates, zone_config) else {
        return DriveTimeLookup::NotRequested;
    };

    match tokio::time::timeout(timeout, distance.drive_time_minutes(config.shop_location, destination)).await {
        Ok(Ok(minutes)) => {
            debug!(minutes, %destination, "Drive time resolved");
            DriveTimeLookup::Minutes(minutes)
        }
        Ok(Err(e)) => {
            warn!(error = %e, %destination, "Drive-time lookup failed");
            DriveTimeLookup::Unavailable(e.to_string())
        }
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis() as u64, %destination, "Drive-time lookup timed out");
            DriveTimeLookup::Unavailable(format!("timed out after {}ms", timeout.as_millis()))
        }
    }
}

/// Resolves a scenario to a service zone and a postal tier
pub struct ZoneResolver;

impl ZoneResolver {
    pub fn resolve(
        scenario: &QuoteScenario,
        zone_config: Option<&ZoneConfig>,
        postal_index: &PostalIndex,
        drive_time: &DriveTimeLookup,
    ) -> ZoneResolution {
        let postal_rule = scenario
            .normalized_postal_code()
            .and_then(|code| postal_index.find(&code, scenario.country.as_deref()))
            .cloned();

        let Some(config) = zone_config else {
            return ZoneResolution::serviceable(postal_rule);
        };

        match drive_time {
            DriveTimeLookup::NotRequested => ZoneResolution::serviceable(postal_rule),
            DriveTimeLookup::Minutes(minutes) => {
                let minutes = *minutes;
                let zone = if minutes > config.max_service_distance_minutes {
                    None
                } else {
                    select_zone(config, minutes)
                };
                let serviceable = zone.is_some();
                ZoneResolution {
                    zone: zone.cloned(),
                    postal_rule,
                    serviceable,
                    reason: (!serviceable).then(|| OUTSIDE_SERVICE_AREA.to_string()),
                    drive_time_minutes: Some(minutes),
                    upstream_unavailable: false,
                }
            }
            DriveTimeLookup::Unavailable(cause) => {
                // A postal tier alone is enough to quote
                let serviceable = postal_rule.is_some();
                ZoneResolution {
                    zone: None,
                    postal_rule,
                    serviceable,
                    reason: (!serviceable).then(|| format!("drive time unavailable: {}", cause)),
                    drive_time_minutes: None,
                    upstream_unavailable: true,
                }
            }
        }
    }
}

/// Highest priority wins among active zones containing the drive time,
/// ties go to the lower zone id
fn select_zone(config: &ZoneConfig, minutes: u32) -> Option<&ServiceZone> {
    config
        .zones
        .iter()
        .filter(|z| z.is_active && z.contains(minutes))
        .min_by(|a, b| b.priority.cmp(&a.priority).then(a.zone_id.cmp(&b.zone_id)))
}

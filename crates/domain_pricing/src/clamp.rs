//! Minimum and maximum charge enforcement

use rust_decimal::Decimal;

use crate::resolver::ZoneResolution;
use crate::rule::PricingRule;
use crate::zone::ZoneConfig;

/// One source of charge bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeBounds {
    pub source: String,
    pub minimum: Option<Decimal>,
    pub maximum: Option<Decimal>,
}

impl ChargeBounds {
    pub fn new(source: impl Into<String>, minimum: Option<Decimal>, maximum: Option<Decimal>) -> Self {
        Self {
            source: source.into(),
            minimum,
            maximum,
        }
    }

    fn is_empty(&self) -> bool {
        self.minimum.is_none() && self.maximum.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClampOutcome {
    pub total: Decimal,
    pub effective_minimum: Option<Decimal>,
    pub effective_maximum: Option<Decimal>,
    /// `total − input`; positive when a minimum lifted the price
    pub adjustment: Decimal,
    pub warnings: Vec<String>,
}

pub struct PriceClamp;

impl PriceClamp {
    /// Gathers bounds from matched rules, the resolved zone's configuration
    /// and the resolved postal tier
    pub fn collect_bounds(
        matched: &[&PricingRule],
        resolution: &ZoneResolution,
        zone_config: Option<&ZoneConfig>,
    ) -> Vec<ChargeBounds> {
        let mut bounds: Vec<ChargeBounds> = matched
            .iter()
            .map(|rule| {
                ChargeBounds::new(
                    format!("rule {}", rule.name),
                    rule.adjustment.minimum_charge,
                    rule.adjustment.maximum_charge,
                )
            })
            .collect();

        if let (Some(zone), Some(config)) = (&resolution.zone, zone_config) {
            bounds.push(ChargeBounds::new(format!("zone {}", zone.name), config.minimum_charge, None));
        }
        if let Some(postal) = &resolution.postal_rule {
            bounds.push(ChargeBounds::new(
                format!("zip code {}", postal.code),
                postal.minimum_price,
                postal.maximum_price,
            ));
        }

        bounds.retain(|b| !b.is_empty());
        bounds
    }

    /// Effective minimum is the largest minimum, effective maximum the
    /// smallest maximum. Inverted bounds are ignored with a warning. The
    /// result is never negative.
    pub fn clamp(total: Decimal, bounds: &[ChargeBounds]) -> ClampOutcome {
        let minimum = bounds.iter().filter_map(|b| b.minimum).max();
        let maximum = bounds.iter().filter_map(|b| b.maximum).min();
        let mut warnings = Vec::new();

        let clamped = match (minimum, maximum) {
            (Some(min), Some(max)) if min > max => {
                warnings.push(format!(
                    "minimum charge {} exceeds maximum charge {}; charge bounds ignored",
                    min.normalize(),
                    max.normalize()
                ));
                total
            }
            _ => {
                let lifted = minimum.map_or(total, |min| total.max(min));
                maximum.map_or(lifted, |max| lifted.min(max))
            }
        };
        let clamped = clamped.max(Decimal::ZERO);

        ClampOutcome {
            total: clamped,
            effective_minimum: minimum,
            effective_maximum: maximum,
            adjustment: clamped - total,
            warnings,
        }
    }
}

//! Service zones and postal pricing tiers
//!
//! Zones are drive-time bands measured from the business's shop location.
//! Postal tiers are flat records keyed by postal code and country. Both are
//! read-only to the engine.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::ZoneId;

use crate::error::RuleDefinitionError;
use crate::scenario::{normalize_postal_code, GeoPoint, ServiceType};

/// A drive-time band, `[minDriveTimeMinutes, maxDriveTimeMinutes)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceZone {
    pub zone_id: ZoneId,
    pub name: String,
    pub min_drive_time_minutes: u32,
    /// `None` means no upper bound
    pub max_drive_time_minutes: Option<u32>,
    pub surcharge_percentage: Decimal,
    #[serde(default)]
    pub priority: i32,
    pub is_active: bool,
}

impl ServiceZone {
    pub fn contains(&self, minutes: u32) -> bool {
        minutes >= self.min_drive_time_minutes
            && self.max_drive_time_minutes.map_or(true, |max| minutes < max)
    }
}

/// Per-service availability and fees within zones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneServiceRule {
    pub service_type: ServiceType,
    pub available_in_zones: BTreeSet<ZoneId>,
    #[serde(default)]
    pub additional_fee_percentage: Decimal,
}

/// A business's geofencing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneConfig {
    pub shop_location: GeoPoint,
    pub base_rate_per_1000_sq_ft: Decimal,
    #[serde(default)]
    pub minimum_charge: Option<Decimal>,
    pub max_service_distance_minutes: u32,
    #[serde(default)]
    pub zones: Vec<ServiceZone>,
    #[serde(default)]
    pub service_rules: Vec<ZoneServiceRule>,
}

impl ZoneConfig {
    /// The availability rule for a service type, if one is configured
    pub fn service_rule(&self, service_type: ServiceType) -> Option<&ZoneServiceRule> {
        self.service_rules.iter().find(|r| r.service_type == service_type)
    }

    /// Unit price derived from the base rate
    pub fn base_unit_price(&self) -> Decimal {
        self.base_rate_per_1000_sq_ft / Decimal::ONE_THOUSAND
    }

    pub fn validate(&self) -> Result<(), RuleDefinitionError> {
        if !self.shop_location.is_valid() {
            return Err(RuleDefinitionError::InvalidZoneConfig(format!(
                "shop location {} is not a valid coordinate",
                self.shop_location
            )));
        }
        if self.base_rate_per_1000_sq_ft < Decimal::ZERO {
            return Err(RuleDefinitionError::InvalidZoneConfig(
                "base rate must not be negative".to_string(),
            ));
        }
        for zone in &self.zones {
            if let Some(max) = zone.max_drive_time_minutes {
                if max <= zone.min_drive_time_minutes {
                    return Err(RuleDefinitionError::InvalidZoneConfig(format!(
                        "zone '{}' has an empty drive-time band [{}, {})",
                        zone.name, zone.min_drive_time_minutes, max
                    )));
                }
            }
            if zone.surcharge_percentage < -Decimal::ONE_HUNDRED {
                return Err(RuleDefinitionError::InvalidZoneConfig(format!(
                    "zone '{}' surcharge {}% would make prices negative",
                    zone.name, zone.surcharge_percentage
                )));
            }
        }
        for rule in &self.service_rules {
            if rule.additional_fee_percentage < -Decimal::ONE_HUNDRED {
                return Err(RuleDefinitionError::InvalidZoneConfig(format!(
                    "{} fee {}% would make prices negative",
                    rule.service_type, rule.additional_fee_percentage
                )));
            }
        }
        Ok(())
    }
}

/// A postal-code pricing tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalPricingRule {
    pub code: String,
    pub country: String,
    #[serde(default)]
    pub base_price: Decimal,
    #[serde(default)]
    pub price_per_sq_ft: Option<Decimal>,
    #[serde(default)]
    pub surcharge_percentage: Decimal,
    #[serde(default)]
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub minimum_price: Option<Decimal>,
    #[serde(default)]
    pub maximum_price: Option<Decimal>,
    pub is_active: bool,
}

impl PostalPricingRule {
    pub fn new(code: impl AsRef<str>, country: impl AsRef<str>) -> Self {
        Self {
            code: normalize_postal_code(code.as_ref()),
            country: country.as_ref().trim().to_ascii_uppercase(),
            base_price: Decimal::ZERO,
            price_per_sq_ft: None,
            surcharge_percentage: Decimal::ZERO,
            discount_percentage: Decimal::ZERO,
            minimum_price: None,
            maximum_price: None,
            is_active: true,
        }
    }

    pub fn validate(&self) -> Result<(), RuleDefinitionError> {
        let negative = |v: Decimal| v.is_sign_negative() && !v.is_zero();
        if normalize_postal_code(&self.code).is_empty() {
            return Err(RuleDefinitionError::postal(&self.code, "postal code is blank"));
        }
        if negative(self.base_price) || self.price_per_sq_ft.map_or(false, negative) {
            return Err(RuleDefinitionError::postal(&self.code, "prices must not be negative"));
        }
        if negative(self.surcharge_percentage) {
            return Err(RuleDefinitionError::postal(&self.code, "surcharge must not be negative"));
        }
        if negative(self.discount_percentage) || self.discount_percentage > Decimal::ONE_HUNDRED {
            return Err(RuleDefinitionError::postal(
                &self.code,
                format!("discount {}% is outside 0..=100", self.discount_percentage),
            ));
        }
        Ok(())
    }
}

/// Active postal tiers keyed by normalized code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostalIndex {
    entries: BTreeMap<String, Vec<PostalPricingRule>>,
}

impl PostalIndex {
    /// Builds the index, dropping inactive records
    pub fn from_records(records: impl IntoIterator<Item = PostalPricingRule>) -> Self {
        let mut entries: BTreeMap<String, Vec<PostalPricingRule>> = BTreeMap::new();
        for record in records.into_iter().filter(|r| r.is_active) {
            entries
                .entry(normalize_postal_code(&record.code))
                .or_default()
                .push(record);
        }
        for records in entries.values_mut() {
            records.sort_by(|a, b| a.country.cmp(&b.country));
        }
        Self { entries }
    }

    /// Exact match on code; without a country the lowest country code wins
    pub fn find(&self, code: &str, country: Option<&str>) -> Option<&PostalPricingRule> {
        let candidates = self.entries.get(&normalize_postal_code(code))?;
        match country.map(|c| c.trim()).filter(|c| !c.is_empty()) {
            Some(country) => candidates
                .iter()
                .find(|r| r.country.eq_ignore_ascii_case(country)),
            None => candidates.first(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zone_band_is_half_open() {
        let zone = ServiceZone {
            zone_id: ZoneId::from_u128(1),
            name: "Inner".to_string(),
            min_drive_time_minutes: 0,
            max_drive_time_minutes: Some(20),
            surcharge_percentage: dec!(0),
            priority: 0,
            is_active: true,
        };
        assert!(zone.contains(0));
        assert!(zone.contains(19));
        assert!(!zone.contains(20));
    }

    #[test]
    fn test_postal_index_country_selection() {
        let mut us = PostalPricingRule::new("90210", "US");
        us.base_price = dec!(5);
        let ca = PostalPricingRule::new("90210", "CA");
        let mut inactive = PostalPricingRule::new("10001", "US");
        inactive.is_active = false;

        let index = PostalIndex::from_records(vec![us, ca, inactive]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.find("90210", None).unwrap().country, "CA");
        assert_eq!(index.find(" 90210", Some("us")).unwrap().base_price, dec!(5));
        assert!(index.find("90210", Some("MX")).is_none());
        assert!(index.find("10001", None).is_none());
    }

    #[test]
    fn test_postal_validation() {
        let mut rule = PostalPricingRule::new("90210", "US");
        rule.discount_percentage = dec!(101);
        assert!(rule.validate().is_err());
    }
}

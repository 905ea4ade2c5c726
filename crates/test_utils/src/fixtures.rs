//! Pre-built Test Fixtures
//!
//! Ready-to-use pricing data. The sample scenario is the three-service,
//! 5,000 sq ft property in postal code 90210 worth $117.50 before any
//! adjustment; most tests start from it.

use chrono::NaiveDate;
use core_kernel::{BusinessId, RuleId, ZoneId};
use domain_pricing::{
    GeoPoint, PostalPricingRule, PriceAdjustment, PricingRule, QuoteScenario, RuleCondition,
    ServiceLine, ServiceType, ServiceZone, ZoneConfig, ZoneServiceRule,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fixed identifiers so assertions can name them
pub struct IdFixtures;

impl IdFixtures {
    pub fn business_id() -> BusinessId {
        BusinessId::from_u128(0x0b1d_0000_0000_0000_0000_0000_0000_0001)
    }

    pub fn rule_id(n: u128) -> RuleId {
        RuleId::from_u128(0x0a1e_0000_0000_0000_0000_0000_0000_0000 + n)
    }

    pub fn zone_id(n: u128) -> ZoneId {
        ZoneId::from_u128(0x020e_0000_0000_0000_0000_0000_0000_0000 + n)
    }
}

/// Fixture for dates
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Mid-April 2024, inside the spring promotion window
    pub fn quote_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 15).expect("valid date")
    }

    pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }
}

/// Fixture for locations
pub struct GeoFixtures;

impl GeoFixtures {
    pub fn shop() -> GeoPoint {
        GeoPoint::new(34.0522, -118.2437)
    }

    pub fn customer() -> GeoPoint {
        GeoPoint::new(34.0901, -118.4065)
    }
}

/// Fixture for quote scenarios
pub struct ScenarioFixtures;

impl ScenarioFixtures {
    /// Lawn 3000 @ 0.02 + Driveway 1500 @ 0.03 + Sidewalk 500 @ 0.025 = $117.50
    pub fn sample_services() -> Vec<ServiceLine> {
        vec![
            ServiceLine::new("Lawn Treatment", ServiceType::LawnTreatment, dec!(3000), dec!(0.02)),
            ServiceLine::new("Driveway Cleaning", ServiceType::DrivewayCleaning, dec!(1500), dec!(0.03)),
            ServiceLine::new("Sidewalk Cleaning", ServiceType::SidewalkCleaning, dec!(500), dec!(0.025)),
        ]
    }

    /// Postal code 90210, no tags, 5000 sq ft
    pub fn sample() -> QuoteScenario {
        QuoteScenario {
            postal_code: Some("90210".to_string()),
            country: None,
            customer_tags: vec![],
            total_area: dec!(5000),
            services: Self::sample_services(),
            date: TemporalFixtures::quote_date(),
            coordinates: None,
        }
    }

    pub fn sample_total() -> Decimal {
        dec!(117.50)
    }
}

/// Fixture for pricing rules
pub struct RuleFixtures;

impl RuleFixtures {
    /// Customer rule for vip/premium tags, multiplier 1.0, 10% off
    pub fn vip_discount() -> PricingRule {
        PricingRule::new("VIP Discount", RuleCondition::customer(["vip", "premium"]))
            .with_id(IdFixtures::rule_id(1))
            .with_priority(10)
            .with_adjustment(PriceAdjustment::percentage_discount(dec!(10)))
    }

    /// Volume rule for properties of at least 8000 sq ft
    pub fn large_property() -> PricingRule {
        PricingRule::new("Large Property", RuleCondition::volume(Some(dec!(8000)), None))
            .with_id(IdFixtures::rule_id(2))
            .with_adjustment(PriceAdjustment::multiplier(dec!(0.9)))
    }

    /// Zone rule for two postal codes, $15 surcharge
    pub fn hills_surcharge() -> PricingRule {
        PricingRule::new("Hills Access Fee", RuleCondition::zone(["90210", "90211"]))
            .with_id(IdFixtures::rule_id(3))
            .with_adjustment(PriceAdjustment::surcharge(dec!(15)))
    }

    /// Service rule pricing mosquito treatment at a fixed unit price
    pub fn mosquito_special() -> PricingRule {
        PricingRule::new("Mosquito Special", RuleCondition::service([ServiceType::MosquitoTreatment]))
            .with_id(IdFixtures::rule_id(4))
            .with_adjustment(
                PriceAdjustment::default().with_fixed_unit_price(ServiceType::MosquitoTreatment, dec!(0.01)),
            )
    }
}

/// Fixture for zone configurations
pub struct ZoneFixtures;

impl ZoneFixtures {
    pub fn zone(n: u128, name: &str, min: u32, max: Option<u32>, surcharge: Decimal) -> ServiceZone {
        ServiceZone {
            zone_id: IdFixtures::zone_id(n),
            name: name.to_string(),
            min_drive_time_minutes: min,
            max_drive_time_minutes: max,
            surcharge_percentage: surcharge,
            priority: 0,
            is_active: true,
        }
    }

    /// Zones {0–20 min, 0%} and {20–40 min, 10%}, max 45 minutes
    pub fn two_bands() -> ZoneConfig {
        ZoneConfig {
            shop_location: GeoFixtures::shop(),
            base_rate_per_1000_sq_ft: dec!(20),
            minimum_charge: None,
            max_service_distance_minutes: 45,
            zones: vec![
                Self::zone(1, "Core", 0, Some(20), dec!(0)),
                Self::zone(2, "Outer", 20, Some(40), dec!(10)),
            ],
            service_rules: vec![],
        }
    }

    /// Driveway cleaning only offered in the core zone
    pub fn driveway_core_only() -> ZoneServiceRule {
        ZoneServiceRule {
            service_type: ServiceType::DrivewayCleaning,
            available_in_zones: [IdFixtures::zone_id(1)].into_iter().collect(),
            additional_fee_percentage: dec!(5),
        }
    }
}

/// Fixture for postal tiers
pub struct PostalFixtures;

impl PostalFixtures {
    /// A neutral 90210 tier: no price changes, $50 minimum
    pub fn beverly_hills() -> PostalPricingRule {
        let mut rule = PostalPricingRule::new("90210", "US");
        rule.minimum_price = Some(dec!(50));
        rule
    }
}

//! Evaluation Service Tests
//!
//! End-to-end evaluations against the in-memory ports:
//! - The five reference scenarios
//! - Input validation
//! - Degraded drive-time lookups
//! - Snapshot caching, versioning and staleness
//! - Fire-and-forget usage recording
//!
//! # Test Organization
//!
//! - `scenario_tests` - reference scenarios through `EvaluationService::evaluate`
//! - `validation_tests` - malformed input rejected before evaluation
//! - `degradation_tests` - distance service failures and timeouts
//! - `snapshot_tests` - snapshot reuse, refresh and stale fallback
//! - `usage_tests` - applied-count increments

use std::time::Duration;

use domain_pricing::report::UPSTREAM_UNAVAILABLE_WARNING;
use domain_pricing::{MockDistanceService, MockUsageRecorder, PricingError, ServiceType};
use rust_decimal_macros::dec;
use test_utils::{
    assert_explainability_complete, assert_non_negative, assert_rule_applied,
    assert_rule_rejected_with, assert_warning_contains, GeoFixtures, IdFixtures, PostalFixtures,
    RuleFixtures, ScenarioBuilder, ScenarioFixtures, TestEngineBuilder, ZoneFixtures,
};

fn all_rules() -> Vec<domain_pricing::PricingRule> {
    vec![
        RuleFixtures::vip_discount(),
        RuleFixtures::large_property(),
        RuleFixtures::mosquito_special(),
    ]
}

// ============================================================================
// SCENARIO TESTS
// ============================================================================

mod scenario_tests {
    use super::*;

    /// Scenario 1: nothing matches, the price is the raw subtotal
    #[tokio::test]
    async fn test_no_matching_rules() {
        let engine = TestEngineBuilder::new().with_rules(all_rules()).build().await;
        let result = engine
            .service
            .evaluate(&ScenarioFixtures::sample(), engine.business_id)
            .await
            .unwrap();

        assert_eq!(result.original_total, dec!(117.50));
        assert_eq!(result.adjusted_total, dec!(117.50));
        assert!(result.applied_rules.is_empty());
        assert_eq!(result.unapplied_rules.len(), 3);
        assert!(result.zone_resolved.serviceable);
        assert_explainability_complete(&result, 3);
    }

    /// Scenario 2: a VIP customer gets 10% off
    #[tokio::test]
    async fn test_vip_discount() {
        let engine = TestEngineBuilder::new().with_rules(all_rules()).build().await;
        let scenario = ScenarioBuilder::new().with_tags(["vip"]).build();
        let result = engine.service.evaluate(&scenario, engine.business_id).await.unwrap();

        assert_eq!(result.adjusted_total, dec!(105.75));
        assert_eq!(result.total_adjustment, dec!(-11.75));
        assert_rule_applied(&result, IdFixtures::rule_id(1));
        assert_eq!(result.applied_rules[0].impact, "-$11.75 (-10%)");
        assert_explainability_complete(&result, 3);
    }

    /// Scenario 3: the large-property rule explains its rejection
    #[tokio::test]
    async fn test_volume_rejection() {
        let engine = TestEngineBuilder::new().with_rules(all_rules()).build().await;
        let result = engine
            .service
            .evaluate(&ScenarioFixtures::sample(), engine.business_id)
            .await
            .unwrap();

        assert_rule_rejected_with(&result, IdFixtures::rule_id(2), "area 5000 outside [8000, ∞)");
    }

    /// Scenario 4: 35 minutes out, the outer band's 10% lands before the discount
    #[tokio::test]
    async fn test_outer_zone_surcharge() {
        let engine = TestEngineBuilder::new()
            .with_rules(all_rules())
            .with_zone_config(ZoneFixtures::two_bands())
            .with_distance(MockDistanceService::minutes(35))
            .build()
            .await;
        let scenario = ScenarioBuilder::new()
            .with_tags(["vip"])
            .with_coordinates(GeoFixtures::customer())
            .build();
        let result = engine.service.evaluate(&scenario, engine.business_id).await.unwrap();

        assert!(result.zone_resolved.serviceable);
        assert_eq!(result.zone_resolved.zone_id, Some(IdFixtures::zone_id(2)));
        assert_eq!(result.zone_resolved.drive_time_minutes, Some(35));
        assert_eq!(result.tier_adjustments.len(), 1);
        assert_eq!(result.tier_adjustments[0].adjustment_amount, dec!(11.75));
        assert_eq!(result.adjusted_total, dec!(116.32));
        assert_eq!(engine.distance.calls(), 1);
    }

    /// Scenario 5: an hour out is unserviceable and carries no rule trace
    #[tokio::test]
    async fn test_out_of_range() {
        let engine = TestEngineBuilder::new()
            .with_rules(all_rules())
            .with_zone_config(ZoneFixtures::two_bands())
            .with_distance(MockDistanceService::minutes(60))
            .build()
            .await;
        let scenario = ScenarioBuilder::new()
            .with_tags(["vip"])
            .with_coordinates(GeoFixtures::customer())
            .build();
        let result = engine.service.evaluate(&scenario, engine.business_id).await.unwrap();

        assert!(!result.zone_resolved.serviceable);
        assert_eq!(result.zone_resolved.reason.as_deref(), Some("outside service area"));
        assert_eq!(result.adjusted_total, result.original_total);
        assert!(result.applied_rules.is_empty());
        assert!(result.unapplied_rules.is_empty());
        assert!(!result.upstream_unavailable);
    }

    /// A postal minimum lifts a small quote and is traced
    #[tokio::test]
    async fn test_postal_minimum_applies() {
        let mut tier = PostalFixtures::beverly_hills();
        tier.minimum_price = Some(dec!(200));
        let engine = TestEngineBuilder::new().with_postal_tier(tier).build().await;
        let result = engine
            .service
            .evaluate(&ScenarioFixtures::sample(), engine.business_id)
            .await
            .unwrap();

        assert_eq!(result.adjusted_total, dec!(200));
        assert_eq!(result.clamp.minimum, Some(dec!(200)));
        assert_eq!(result.clamp.adjustment, dec!(82.50));
        assert_eq!(result.zone_resolved.postal_tier.as_deref(), Some("90210"));
    }

    /// Conflicting bounds are ignored with a warning; evaluation still succeeds
    #[tokio::test]
    async fn test_misconfigured_bounds_warn() {
        let mut tier = PostalFixtures::beverly_hills();
        tier.maximum_price = Some(dec!(100));
        let rule = RuleFixtures::hills_surcharge().with_adjustment(
            domain_pricing::PriceAdjustment::surcharge(dec!(15)).with_minimum_charge(dec!(300)),
        );
        let engine = TestEngineBuilder::new()
            .with_rule(rule)
            .with_postal_tier(tier)
            .build()
            .await;
        let result = engine
            .service
            .evaluate(&ScenarioFixtures::sample(), engine.business_id)
            .await
            .unwrap();

        assert_eq!(result.adjusted_total, dec!(132.50));
        assert_warning_contains(&result, "charge bounds ignored");
    }

    /// A flat discount larger than the quote floors at zero
    #[tokio::test]
    async fn test_large_flat_discount_floors_at_zero() {
        let rule = RuleFixtures::hills_surcharge()
            .with_adjustment(domain_pricing::PriceAdjustment::flat_discount(dec!(1000)));
        let engine = TestEngineBuilder::new().with_rule(rule).build().await;
        let result = engine
            .service
            .evaluate(&ScenarioFixtures::sample(), engine.business_id)
            .await
            .unwrap();

        assert_eq!(result.adjusted_total, dec!(0));
        assert_eq!(result.percentage_change, dec!(-100));
        assert_non_negative(&result);
    }

    /// Unknown businesses price at the raw subtotal
    #[tokio::test]
    async fn test_unknown_business_has_empty_snapshot() {
        let engine = TestEngineBuilder::new().with_rules(all_rules()).build().await;
        let other = core_kernel::BusinessId::new();
        let result = engine.service.evaluate(&ScenarioFixtures::sample(), other).await.unwrap();

        assert_eq!(result.business_id, other);
        assert_eq!(result.adjusted_total, dec!(117.50));
        assert!(result.unapplied_rules.is_empty());
    }
}

// ============================================================================
// VALIDATION TESTS
// ============================================================================

mod validation_tests {
    use super::*;

    /// Empty service lists never reach the snapshot store
    #[tokio::test]
    async fn test_empty_services_rejected() {
        let engine = TestEngineBuilder::new().build().await;
        let scenario = ScenarioBuilder::new().with_services(vec![]).build();
        let err = engine.service.evaluate(&scenario, engine.business_id).await.unwrap_err();

        assert!(matches!(err, PricingError::Validation { ref field, .. } if field == "services"));
        assert_eq!(engine.rules.calls(), 0);
    }

    /// Negative areas are rejected with the offending field
    #[tokio::test]
    async fn test_negative_area_rejected() {
        let engine = TestEngineBuilder::new().build().await;
        let scenario = ScenarioBuilder::new()
            .with_services(vec![])
            .add_service("Lawn", ServiceType::LawnTreatment, dec!(-10), dec!(0.02))
            .build();
        let err = engine.service.evaluate(&scenario, engine.business_id).await.unwrap_err();

        assert!(matches!(err, PricingError::Validation { ref field, .. } if field == "services[0].area"));
    }

    /// Areas and unit prices past the accepted limits are rejected, not priced
    #[tokio::test]
    async fn test_oversized_service_rejected() {
        let engine = TestEngineBuilder::new().with_rules(all_rules()).build().await;
        let scenario = ScenarioBuilder::new()
            .with_services(vec![])
            .add_service("Estate", ServiceType::LawnMowing, dec!(100000000000000000000), dec!(10000000000))
            .build();
        let err = engine.service.evaluate(&scenario, engine.business_id).await.unwrap_err();

        assert!(matches!(err, PricingError::Validation { ref field, .. } if field == "services[0].area"));
        assert_eq!(engine.rules.calls(), 0);
    }

    /// Rules that compound past the decimal range fail the evaluation cleanly
    #[tokio::test]
    async fn test_overflowing_rules_are_a_validation_error() {
        let runaway = domain_pricing::PricingRule::new(
            "Runaway Multiplier",
            domain_pricing::RuleCondition::customer(["vip"]),
        )
        .with_adjustment(domain_pricing::PriceAdjustment::multiplier(dec!(1000000000000000000)));
        let engine = TestEngineBuilder::new().with_rule(runaway).build().await;
        let scenario = ScenarioBuilder::new()
            .with_tags(["vip"])
            .with_services(vec![])
            .add_service("Estate", ServiceType::LawnMowing, dec!(1000000000), dec!(1000000))
            .build();
        assert!(scenario.validate().is_ok());

        let err = engine.service.evaluate(&scenario, engine.business_id).await.unwrap_err();
        assert!(matches!(err, PricingError::Validation { ref field, .. } if field == "services"));
        assert!(!err.is_transient());
    }

    /// Unknown service types fail to parse
    #[test]
    fn test_unknown_service_type_rejected() {
        let err = "snow removal".parse::<ServiceType>().unwrap_err();
        assert!(matches!(err, PricingError::Validation { .. }));
        assert_eq!("Lawn Treatment".parse::<ServiceType>().unwrap(), ServiceType::LawnTreatment);
    }
}

// ============================================================================
// DEGRADATION TESTS
// ============================================================================

mod degradation_tests {
    use super::*;

    /// A failing distance service falls back to postal-only pricing
    #[tokio::test]
    async fn test_distance_failure_with_postal_tier() {
        let engine = TestEngineBuilder::new()
            .with_zone_config(ZoneFixtures::two_bands())
            .with_postal_tier(PostalFixtures::beverly_hills())
            .with_distance(MockDistanceService::failing())
            .build()
            .await;
        let scenario = ScenarioBuilder::new().with_coordinates(GeoFixtures::customer()).build();
        let result = engine.service.evaluate(&scenario, engine.business_id).await.unwrap();

        assert!(result.zone_resolved.serviceable);
        assert!(result.upstream_unavailable);
        assert!(result.zone_resolved.zone_id.is_none());
        assert_eq!(result.adjusted_total, dec!(117.50));
        assert!(result.warnings.iter().any(|w| w == UPSTREAM_UNAVAILABLE_WARNING));
    }

    /// Without a postal tier the failure makes the scenario unserviceable
    #[tokio::test]
    async fn test_distance_failure_without_postal_tier() {
        let engine = TestEngineBuilder::new()
            .with_zone_config(ZoneFixtures::two_bands())
            .with_distance(MockDistanceService::failing())
            .build()
            .await;
        let scenario = ScenarioBuilder::new().with_coordinates(GeoFixtures::customer()).build();
        let result = engine.service.evaluate(&scenario, engine.business_id).await.unwrap();

        assert!(!result.zone_resolved.serviceable);
        assert!(result.upstream_unavailable);
        assert!(result
            .zone_resolved
            .reason
            .as_deref()
            .is_some_and(|r| r.starts_with("drive time unavailable")));
    }

    /// A slow distance service is cut off by the configured timeout
    #[tokio::test]
    async fn test_slow_distance_service_times_out() {
        let engine = TestEngineBuilder::new()
            .with_zone_config(ZoneFixtures::two_bands())
            .with_postal_tier(PostalFixtures::beverly_hills())
            .with_distance(MockDistanceService::slow(Duration::from_secs(5), 10))
            .with_drive_time_timeout(Duration::from_millis(50))
            .build()
            .await;
        let scenario = ScenarioBuilder::new().with_coordinates(GeoFixtures::customer()).build();

        let started = std::time::Instant::now();
        let result = engine.service.evaluate(&scenario, engine.business_id).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(result.upstream_unavailable);
        assert!(result.zone_resolved.serviceable);
    }

    /// Scenarios without coordinates never call the distance service
    #[tokio::test]
    async fn test_no_coordinates_skips_lookup() {
        let engine = TestEngineBuilder::new()
            .with_zone_config(ZoneFixtures::two_bands())
            .with_distance(MockDistanceService::failing())
            .build()
            .await;
        let result = engine
            .service
            .evaluate(&ScenarioFixtures::sample(), engine.business_id)
            .await
            .unwrap();

        assert_eq!(engine.distance.calls(), 0);
        assert!(!result.upstream_unavailable);
        assert!(result.zone_resolved.serviceable);
    }
}

// ============================================================================
// SNAPSHOT TESTS
// ============================================================================

mod snapshot_tests {
    use super::*;

    /// Fresh snapshots are reused across evaluations
    #[tokio::test]
    async fn test_snapshot_reused_within_ttl() {
        let engine = TestEngineBuilder::new().with_rules(all_rules()).build().await;
        let scenario = ScenarioFixtures::sample();

        let first = engine.service.evaluate(&scenario, engine.business_id).await.unwrap();
        let second = engine.service.evaluate(&scenario, engine.business_id).await.unwrap();

        assert_eq!(first.snapshot_version, second.snapshot_version);
        assert_eq!(first.snapshot_fetched_at, second.snapshot_fetched_at);
        assert!(!second.snapshot_stale);
        assert_eq!(engine.rules.calls(), 1);
    }

    /// An explicit refresh bumps the version and picks up new rules
    #[tokio::test]
    async fn test_refresh_picks_up_changes() {
        let engine = TestEngineBuilder::new().build().await;
        let scenario = ScenarioBuilder::new().with_tags(["vip"]).build();

        let before = engine.service.evaluate(&scenario, engine.business_id).await.unwrap();
        assert_eq!(before.adjusted_total, dec!(117.50));

        engine.rules.set_rules(engine.business_id, vec![RuleFixtures::vip_discount()]).await;
        engine.snapshots.refresh(engine.business_id).await.unwrap();

        let after = engine.service.evaluate(&scenario, engine.business_id).await.unwrap();
        assert!(after.snapshot_version > before.snapshot_version);
        assert_eq!(after.adjusted_total, dec!(105.75));
    }

    /// A failed refresh serves the previous snapshot, flagged stale
    #[tokio::test]
    async fn test_stale_snapshot_on_refresh_failure() {
        let engine = TestEngineBuilder::new()
            .with_rules(all_rules())
            .with_ttl(Duration::ZERO)
            .build()
            .await;
        let scenario = ScenarioFixtures::sample();

        let fresh = engine.service.evaluate(&scenario, engine.business_id).await.unwrap();
        assert!(!fresh.snapshot_stale);

        engine.rules.set_failing(true);
        let stale = engine.service.evaluate(&scenario, engine.business_id).await.unwrap();
        assert!(stale.snapshot_stale);
        assert_eq!(stale.snapshot_version, fresh.snapshot_version);
        assert_eq!(stale.unapplied_rules.len(), 3);
    }

    /// With nothing cached, a repository failure is a hard error
    #[tokio::test]
    async fn test_cold_miss_failure_is_error() {
        let engine = TestEngineBuilder::new().build().await;
        engine.zones.set_failing(true);

        let err = engine
            .service
            .evaluate(&ScenarioFixtures::sample(), engine.business_id)
            .await
            .unwrap_err();
        assert!(matches!(err, PricingError::SnapshotUnavailable { .. }));
        assert!(err.is_transient());
    }
}

// ============================================================================
// USAGE TESTS
// ============================================================================

mod usage_tests {
    use super::*;

    /// Each applied rule is counted once per evaluation
    #[tokio::test]
    async fn test_applied_rules_are_counted() {
        let engine = TestEngineBuilder::new()
            .with_rules(vec![RuleFixtures::vip_discount(), RuleFixtures::hills_surcharge()])
            .build()
            .await;
        let scenario = ScenarioBuilder::new().with_tags(["vip"]).build();

        engine.service.evaluate(&scenario, engine.business_id).await.unwrap();
        engine.service.evaluate(&scenario, engine.business_id).await.unwrap();

        assert_eq!(engine.wait_for_usage(4).await, 4);
        assert_eq!(engine.usage.count(IdFixtures::rule_id(1)).await, 2);
        assert_eq!(engine.usage.count(IdFixtures::rule_id(3)).await, 2);
    }

    /// Rejected rules are never counted
    #[tokio::test]
    async fn test_rejected_rules_not_counted() {
        let engine = TestEngineBuilder::new().with_rules(all_rules()).build().await;
        engine
            .service
            .evaluate(&ScenarioFixtures::sample(), engine.business_id)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(engine.usage.total().await, 0);
    }

    /// A failing recorder never fails the evaluation
    #[tokio::test]
    async fn test_recorder_failure_is_swallowed() {
        let engine = TestEngineBuilder::new()
            .with_rule(RuleFixtures::vip_discount())
            .with_usage_recorder(MockUsageRecorder::failing())
            .build()
            .await;
        let scenario = ScenarioBuilder::new().with_tags(["vip"]).build();

        let result = engine.service.evaluate(&scenario, engine.business_id).await;
        assert!(result.is_ok());
    }
}

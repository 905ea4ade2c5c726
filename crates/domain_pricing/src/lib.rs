//! Pricing Domain
//!
//! The dynamic pricing and service-zone rule evaluation engine. It turns a
//! raw area-based subtotal into a final, explainable price:
//!
//! - **ZoneResolver**: drive-time zone and postal tier for the customer's location
//! - **RuleMatcher**: which rules apply, and why the others don't
//! - **RuleCompositor**: deterministic application of the matched adjustments
//! - **PriceClamp**: minimum and maximum charge enforcement
//! - **EvaluationReporter**: the result object with a full trace
//! - **EvaluationService**: runs the pipeline against a cached snapshot
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_pricing::{EvaluationService, SnapshotStore, SnapshotLoader, UsageDispatcher};
//!
//! let store = Arc::new(SnapshotStore::new(loader, Duration::from_secs(300)));
//! let (usage, _) = UsageDispatcher::spawn(recorder, 1024);
//! let service = EvaluationService::new(store, distance, usage, EvaluationConfig::default());
//!
//! let result = service.evaluate(&scenario, business_id).await?;
//! for rule in &result.applied_rules {
//!     println!("{}: {}", rule.rule_name, rule.impact);
//! }
//! ```

pub mod scenario;
pub mod rule;
pub mod zone;
pub mod resolver;
pub mod matcher;
pub mod compositor;
pub mod clamp;
pub mod report;
pub mod snapshot;
pub mod service;
pub mod ports;
pub mod adapters;
pub mod error;

pub use scenario::{GeoPoint, QuoteScenario, ServiceLine, ServiceType, MAX_AREA, MAX_UNIT_PRICE};
pub use rule::{Discount, PriceAdjustment, PricingRule, RuleCondition, RuleType};
pub use zone::{PostalIndex, PostalPricingRule, ServiceZone, ZoneConfig, ZoneServiceRule};
pub use resolver::{lookup_drive_time, DriveTimeLookup, ZoneResolution, ZoneResolver};
pub use matcher::{MatchOutcome, RejectedRule, RuleMatcher};
pub use compositor::{ComposedPricing, RuleCompositor, RuleImpact, TierAdjustment, TierSource};
pub use clamp::{ChargeBounds, ClampOutcome, PriceClamp};
pub use report::{
    AdjustedService, AppliedRule, EvaluationReporter, EvaluationResult, SnapshotInfo,
    TierAdjustmentEntry, UnappliedRule, ZoneOutcome,
};
pub use snapshot::{PricingSnapshot, SnapshotHandle, SnapshotLoader, SnapshotStore};
pub use service::{EvaluationConfig, EvaluationService, UsageDispatcher};
pub use ports::{DistanceService, PostalRepository, RuleRepository, UsageRecorder, ZoneRepository};
pub use error::{PricingError, RuleDefinitionError};

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{
    MockDistanceService, MockPostalRepository, MockRuleRepository, MockUsageRecorder,
    MockZoneRepository,
};

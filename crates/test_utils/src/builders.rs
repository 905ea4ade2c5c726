//! Test Data Builders
//!
//! Builders for scenarios and for a fully wired engine backed by the
//! in-memory mock ports. Tests specify only what they care about.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use core_kernel::{BusinessId, Currency};
use domain_pricing::{
    EvaluationConfig, EvaluationService, GeoPoint, MockDistanceService, MockPostalRepository,
    MockRuleRepository, MockUsageRecorder, MockZoneRepository, PostalPricingRule, PricingRule,
    QuoteScenario, ServiceLine, ServiceType, SnapshotLoader, SnapshotStore, UsageDispatcher,
    ZoneConfig,
};
use rust_decimal::Decimal;

use crate::fixtures::{IdFixtures, ScenarioFixtures};

/// Builder for quote scenarios, starting from the sample scenario
pub struct ScenarioBuilder {
    scenario: QuoteScenario,
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        Self {
            scenario: ScenarioFixtures::sample(),
        }
    }

    pub fn with_postal_code(mut self, code: impl Into<String>) -> Self {
        self.scenario.postal_code = Some(code.into());
        self
    }

    pub fn without_postal_code(mut self) -> Self {
        self.scenario.postal_code = None;
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.scenario.country = Some(country.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scenario.customer_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_total_area(mut self, area: Decimal) -> Self {
        self.scenario.total_area = area;
        self
    }

    pub fn with_services(mut self, services: Vec<ServiceLine>) -> Self {
        self.scenario.services = services;
        self
    }

    pub fn add_service(
        mut self,
        name: &str,
        service_type: ServiceType,
        area: Decimal,
        price_per_unit: Decimal,
    ) -> Self {
        self.scenario
            .services
            .push(ServiceLine::new(name, service_type, area, price_per_unit));
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.scenario.date = date;
        self
    }

    pub fn with_coordinates(mut self, point: GeoPoint) -> Self {
        self.scenario.coordinates = Some(point);
        self
    }

    pub fn build(self) -> QuoteScenario {
        self.scenario
    }
}

/// A wired engine and handles on its mock ports
pub struct TestEngine {
    pub service: EvaluationService,
    pub business_id: BusinessId,
    pub rules: Arc<MockRuleRepository>,
    pub zones: Arc<MockZoneRepository>,
    pub distance: Arc<MockDistanceService>,
    pub usage: Arc<MockUsageRecorder>,
    pub snapshots: Arc<SnapshotStore>,
}

impl TestEngine {
    /// Waits until the usage recorder has seen `expected` increments in total
    pub async fn wait_for_usage(&self, expected: u64) -> u64 {
        for _ in 0..100 {
            let total = self.usage.total().await;
            if total >= expected {
                return total;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.usage.total().await
    }
}

/// Builder for a [`TestEngine`]; must be built inside a tokio runtime
pub struct TestEngineBuilder {
    business_id: BusinessId,
    rules: Vec<PricingRule>,
    zone_config: Option<ZoneConfig>,
    postal: Vec<PostalPricingRule>,
    distance: MockDistanceService,
    usage: MockUsageRecorder,
    ttl: Duration,
    config: EvaluationConfig,
}

impl Default for TestEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEngineBuilder {
    pub fn new() -> Self {
        Self {
            business_id: IdFixtures::business_id(),
            rules: Vec::new(),
            zone_config: None,
            postal: Vec::new(),
            distance: MockDistanceService::minutes(10),
            usage: MockUsageRecorder::new(),
            ttl: Duration::from_secs(300),
            config: EvaluationConfig {
                drive_time_timeout: Duration::from_millis(200),
                currency: Currency::USD,
            },
        }
    }

    pub fn with_business_id(mut self, business_id: BusinessId) -> Self {
        self.business_id = business_id;
        self
    }

    pub fn with_rules(mut self, rules: Vec<PricingRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_rule(mut self, rule: PricingRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_zone_config(mut self, config: ZoneConfig) -> Self {
        self.zone_config = Some(config);
        self
    }

    pub fn with_postal_tier(mut self, tier: PostalPricingRule) -> Self {
        self.postal.push(tier);
        self
    }

    pub fn with_distance(mut self, distance: MockDistanceService) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_usage_recorder(mut self, usage: MockUsageRecorder) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_drive_time_timeout(mut self, timeout: Duration) -> Self {
        self.config.drive_time_timeout = timeout;
        self
    }

    pub async fn build(self) -> TestEngine {
        let rules = Arc::new(MockRuleRepository::with_rules(self.business_id, self.rules).await);
        let zones = Arc::new(match self.zone_config {
            Some(config) => MockZoneRepository::with_config(self.business_id, config).await,
            None => MockZoneRepository::new(),
        });
        let postal = Arc::new(MockPostalRepository::with_records(self.business_id, self.postal).await);
        let distance = Arc::new(self.distance);
        let usage = Arc::new(self.usage);

        let loader = SnapshotLoader::new(rules.clone(), zones.clone(), postal);
        let snapshots = Arc::new(SnapshotStore::new(loader, self.ttl));
        let (dispatcher, _) = UsageDispatcher::spawn(usage.clone(), 256);
        let service = EvaluationService::new(snapshots.clone(), distance.clone(), dispatcher, self.config);

        TestEngine {
            service,
            business_id: self.business_id,
            rules,
            zones,
            distance,
            usage,
            snapshots,
        }
    }
}

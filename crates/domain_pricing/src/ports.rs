//! Pricing Domain Ports
//!
//! The engine owns no storage and no geography. It reads rules, zone
//! configurations and postal tiers through repository ports, asks a
//! distance service for drive times, and reports rule usage through a
//! recorder. Adapters live in `infra_db` (PostgreSQL) and in
//! [`crate::adapters`] (HTTP drive-time service).
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_pricing::ports::{RuleRepository, ZoneRepository, PostalRepository};
//! use std::sync::Arc;
//!
//! let loader = SnapshotLoader::new(
//!     Arc::new(PgRuleRepository::new(pool.clone())),
//!     Arc::new(PgZoneRepository::new(pool.clone())),
//!     Arc::new(PgPostalRepository::new(pool)),
//! );
//! ```

use async_trait::async_trait;

use core_kernel::{BusinessId, DomainPort, HealthCheckable, PortError, RuleId};

use crate::rule::PricingRule;
use crate::scenario::GeoPoint;
use crate::zone::{PostalPricingRule, ZoneConfig};

/// Source of a business's pricing rules
#[async_trait]
pub trait RuleRepository: DomainPort {
    /// Returns every live (non-archived) rule of the business.
    ///
    /// Rules flagged inactive are included so the evaluation trace can
    /// report them as `rule inactive`.
    async fn list_active(&self, business_id: BusinessId) -> Result<Vec<PricingRule>, PortError>;
}

/// Source of a business's geofencing configuration
#[async_trait]
pub trait ZoneRepository: DomainPort {
    /// Returns `None` when the business has not configured zones
    async fn get(&self, business_id: BusinessId) -> Result<Option<ZoneConfig>, PortError>;
}

/// Source of postal pricing tiers
#[async_trait]
pub trait PostalRepository: DomainPort {
    /// Point lookup of an active tier by code, optionally narrowed by country
    async fn find(
        &self,
        business_id: BusinessId,
        code: &str,
        country: Option<&str>,
    ) -> Result<Option<PostalPricingRule>, PortError>;

    /// All active tiers of the business
    async fn list_active(&self, business_id: BusinessId) -> Result<Vec<PostalPricingRule>, PortError>;
}

/// Drive-time lookups; the caller applies its own timeout
#[async_trait]
pub trait DistanceService: DomainPort + HealthCheckable {
    async fn drive_time_minutes(&self, origin: GeoPoint, destination: GeoPoint) -> Result<u32, PortError>;
}

/// Write-behind usage counter
#[async_trait]
pub trait UsageRecorder: DomainPort {
    async fn increment(&self, rule_id: RuleId) -> Result<(), PortError>;
}

/// Mock implementations for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use core_kernel::{AdapterHealth, HealthCheckResult};
    use tokio::sync::RwLock;

    use crate::zone::PostalIndex;

    fn unavailable(service: &str) -> PortError {
        PortError::ServiceUnavailable {
            service: service.to_string(),
        }
    }

    /// In-memory rule store
    #[derive(Debug, Default)]
    pub struct MockRuleRepository {
        rules: Arc<RwLock<HashMap<BusinessId, Vec<PricingRule>>>>,
        failing: AtomicBool,
        calls: AtomicUsize,
    }

    impl MockRuleRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn with_rules(business_id: BusinessId, rules: Vec<PricingRule>) -> Self {
            let repo = Self::new();
            repo.set_rules(business_id, rules).await;
            repo
        }

        pub async fn set_rules(&self, business_id: BusinessId, rules: Vec<PricingRule>) {
            self.rules.write().await.insert(business_id, rules);
        }

        /// Makes subsequent calls fail with `ServiceUnavailable`
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DomainPort for MockRuleRepository {}

    #[async_trait]
    impl RuleRepository for MockRuleRepository {
        async fn list_active(&self, business_id: BusinessId) -> Result<Vec<PricingRule>, PortError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(unavailable("mock-rule-repository"));
            }
            Ok(self.rules.read().await.get(&business_id).cloned().unwrap_or_default())
        }
    }

    /// In-memory zone configuration store
    #[derive(Debug, Default)]
    pub struct MockZoneRepository {
        configs: Arc<RwLock<HashMap<BusinessId, ZoneConfig>>>,
        failing: AtomicBool,
    }

    impl MockZoneRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn with_config(business_id: BusinessId, config: ZoneConfig) -> Self {
            let repo = Self::new();
            repo.configs.write().await.insert(business_id, config);
            repo
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }
    }

    impl DomainPort for MockZoneRepository {}

    #[async_trait]
    impl ZoneRepository for MockZoneRepository {
        async fn get(&self, business_id: BusinessId) -> Result<Option<ZoneConfig>, PortError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(unavailable("mock-zone-repository"));
            }
            Ok(self.configs.read().await.get(&business_id).cloned())
        }
    }

    /// In-memory postal tier store
    #[derive(Debug, Default)]
    pub struct MockPostalRepository {
        records: Arc<RwLock<HashMap<BusinessId, Vec<PostalPricingRule>>>>,
    }

    impl MockPostalRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn with_records(business_id: BusinessId, records: Vec<PostalPricingRule>) -> Self {
            let repo = Self::new();
            repo.records.write().await.insert(business_id, records);
            repo
        }
    }

    impl DomainPort for MockPostalRepository {}

    #[async_trait]
    impl PostalRepository for MockPostalRepository {
        async fn find(
            &self,
            business_id: BusinessId,
            code: &str,
            country: Option<&str>,
        ) -> Result<Option<PostalPricingRule>, PortError> {
            let records = self.records.read().await;
            let index = PostalIndex::from_records(records.get(&business_id).cloned().unwrap_or_default());
            Ok(index.find(code, country).cloned())
        }

        async fn list_active(&self, business_id: BusinessId) -> Result<Vec<PostalPricingRule>, PortError> {
            Ok(self
                .records
                .read()
                .await
                .get(&business_id)
                .map(|records| records.iter().filter(|r| r.is_active).cloned().collect())
                .unwrap_or_default())
        }
    }

    #[derive(Debug, Clone)]
    enum DistanceBehavior {
        Minutes(u32),
        Fail,
        Slow(Duration, u32),
    }

    /// Distance service returning a scripted answer
    #[derive(Debug)]
    pub struct MockDistanceService {
        behavior: DistanceBehavior,
        calls: AtomicUsize,
    }

    impl MockDistanceService {
        pub fn minutes(minutes: u32) -> Self {
            Self {
                behavior: DistanceBehavior::Minutes(minutes),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing() -> Self {
            Self {
                behavior: DistanceBehavior::Fail,
                calls: AtomicUsize::new(0),
            }
        }

        /// Answers only after `delay`
        pub fn slow(delay: Duration, minutes: u32) -> Self {
            Self {
                behavior: DistanceBehavior::Slow(delay, minutes),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DomainPort for MockDistanceService {}

    #[async_trait]
    impl HealthCheckable for MockDistanceService {
        async fn health_check(&self) -> HealthCheckResult {
            match self.behavior {
                DistanceBehavior::Fail => HealthCheckResult::with_status(
                    "mock-distance-service",
                    AdapterHealth::Unhealthy,
                    0,
                    "scripted failure",
                ),
                _ => HealthCheckResult::healthy("mock-distance-service", 0),
            }
        }
    }

    #[async_trait]
    impl DistanceService for MockDistanceService {
        async fn drive_time_minutes(&self, _origin: GeoPoint, _destination: GeoPoint) -> Result<u32, PortError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                DistanceBehavior::Minutes(minutes) => Ok(*minutes),
                DistanceBehavior::Fail => Err(unavailable("mock-distance-service")),
                DistanceBehavior::Slow(delay, minutes) => {
                    tokio::time::sleep(*delay).await;
                    Ok(*minutes)
                }
            }
        }
    }

    /// Counts increments per rule
    #[derive(Debug, Default)]
    pub struct MockUsageRecorder {
        counts: Arc<RwLock<HashMap<RuleId, u64>>>,
        failing: AtomicBool,
    }

    impl MockUsageRecorder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            let recorder = Self::default();
            recorder.failing.store(true, Ordering::SeqCst);
            recorder
        }

        pub async fn count(&self, rule_id: RuleId) -> u64 {
            self.counts.read().await.get(&rule_id).copied().unwrap_or(0)
        }

        pub async fn total(&self) -> u64 {
            self.counts.read().await.values().sum()
        }
    }

    impl DomainPort for MockUsageRecorder {}

    #[async_trait]
    impl UsageRecorder for MockUsageRecorder {
        async fn increment(&self, rule_id: RuleId) -> Result<(), PortError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(unavailable("mock-usage-recorder"));
            }
            *self.counts.write().await.entry(rule_id).or_insert(0) += 1;
            Ok(())
        }
    }
}

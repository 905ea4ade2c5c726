//! Versioned pricing snapshots
//!
//! An evaluation never reads repositories directly. It borrows an
//! `Arc<PricingSnapshot>`: an immutable, point-in-time copy of a business's
//! rules, zone configuration and postal tiers. Refreshing builds a complete
//! new snapshot first and then swaps the pointer under a short write lock,
//! so in-flight evaluations keep the snapshot they started with.
//!
//! ```text
//! get(business) ──► cached & fresh ───────────────► Arc<PricingSnapshot>
//!        │
//!        ├────────► cached & older than TTL ──► refresh ──ok──► new Arc
//!        │                                         └──err──► old Arc, stale
//!        └────────► missing ──► refresh ──ok──► new Arc
//!                                  └──err──► PricingError::SnapshotUnavailable
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use core_kernel::{BusinessId, PortError};

use crate::error::PricingError;
use crate::ports::{PostalRepository, RuleRepository, ZoneRepository};
use crate::report::SnapshotInfo;
use crate::rule::PricingRule;
use crate::zone::{PostalIndex, ZoneConfig};

/// Immutable rule and zone data for one business
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSnapshot {
    pub version: u64,
    pub fetched_at: DateTime<Utc>,
    pub business_id: BusinessId,
    pub rules: Vec<PricingRule>,
    pub zone_config: Option<ZoneConfig>,
    pub postal_index: PostalIndex,
}

impl PricingSnapshot {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn info(&self, stale: bool) -> SnapshotInfo {
        SnapshotInfo {
            version: self.version,
            fetched_at: self.fetched_at,
            stale,
        }
    }
}

/// A snapshot as served to one caller
#[derive(Debug, Clone)]
pub struct SnapshotHandle {
    pub snapshot: Arc<PricingSnapshot>,
    /// A refresh was due but failed; this is the last good copy
    pub stale: bool,
}

/// Reads the three repositories that make up a snapshot
#[derive(Clone)]
pub struct SnapshotLoader {
    rules: Arc<dyn RuleRepository>,
    zones: Arc<dyn ZoneRepository>,
    postal: Arc<dyn PostalRepository>,
}

impl SnapshotLoader {
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        zones: Arc<dyn ZoneRepository>,
        postal: Arc<dyn PostalRepository>,
    ) -> Self {
        Self { rules, zones, postal }
    }

    pub async fn load(&self, business_id: BusinessId, version: u64) -> Result<PricingSnapshot, PortError> {
        let (rules, zone_config, postal) = tokio::try_join!(
            self.rules.list_active(business_id),
            self.zones.get(business_id),
            self.postal.list_active(business_id),
        )?;

        Ok(PricingSnapshot {
            version,
            fetched_at: Utc::now(),
            business_id,
            rules,
            zone_config,
            postal_index: PostalIndex::from_records(postal),
        })
    }
}

/// Per-business snapshot cache with copy-then-swap refresh
pub struct SnapshotStore {
    loader: SnapshotLoader,
    snapshots: RwLock<HashMap<BusinessId, Arc<PricingSnapshot>>>,
    version: AtomicU64,
    ttl: Duration,
}

impl SnapshotStore {
    pub fn new(loader: SnapshotLoader, ttl: Duration) -> Self {
        Self {
            loader,
            snapshots: RwLock::new(HashMap::new()),
            version: AtomicU64::new(0),
            ttl,
        }
    }

    /// Returns the cached snapshot, loading or refreshing it when needed
    pub async fn get(&self, business_id: BusinessId) -> Result<SnapshotHandle, PricingError> {
        match self.peek(business_id).await {
            Some(snapshot) if snapshot.age(Utc::now()) < self.ttl => Ok(SnapshotHandle {
                snapshot,
                stale: false,
            }),
            Some(previous) => match self.refresh(business_id).await {
                Ok(snapshot) => Ok(SnapshotHandle { snapshot, stale: false }),
                Err(e) => {
                    warn!(
                        %business_id,
                        version = previous.version,
                        error = %e,
                        "Snapshot refresh failed, serving stale snapshot"
                    );
                    Ok(SnapshotHandle {
                        snapshot: previous,
                        stale: true,
                    })
                }
            },
            None => match self.refresh(business_id).await {
                Ok(snapshot) => Ok(SnapshotHandle { snapshot, stale: false }),
                Err(PricingError::Repository(source)) => {
                    Err(PricingError::SnapshotUnavailable { business_id, source })
                }
                Err(other) => Err(other),
            },
        }
    }

    /// Loads a new snapshot and swaps it in
    pub async fn refresh(&self, business_id: BusinessId) -> Result<Arc<PricingSnapshot>, PricingError> {
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(self.loader.load(business_id, version).await?);

        // A slower concurrent refresh must not replace a newer snapshot
        let mut snapshots = self.snapshots.write().await;
        let current = snapshots
            .entry(business_id)
            .and_modify(|existing| {
                if existing.version < snapshot.version {
                    *existing = Arc::clone(&snapshot);
                }
            })
            .or_insert_with(|| Arc::clone(&snapshot))
            .clone();
        drop(snapshots);

        info!(
            %business_id,
            version = current.version,
            rules = current.rules.len(),
            postal_tiers = current.postal_index.len(),
            zones = current.zone_config.as_ref().map_or(0, |c| c.zones.len()),
            "Pricing snapshot refreshed"
        );
        Ok(current)
    }

    /// The cached snapshot without loading or refreshing
    pub async fn peek(&self, business_id: BusinessId) -> Option<Arc<PricingSnapshot>> {
        self.snapshots.read().await.get(&business_id).cloned()
    }

    /// Refreshes every cached snapshot older than the TTL
    pub async fn refresh_expired(&self) -> usize {
        let now = Utc::now();
        let expired: Vec<BusinessId> = self
            .snapshots
            .read()
            .await
            .values()
            .filter(|s| s.age(now) >= self.ttl)
            .map(|s| s.business_id)
            .collect();

        let mut refreshed = 0;
        for business_id in expired {
            match self.refresh(business_id).await {
                Ok(_) => refreshed += 1,
                Err(e) => warn!(%business_id, error = %e, "Background snapshot refresh failed"),
            }
        }
        refreshed
    }

    /// Starts a background task calling [`Self::refresh_expired`] every `interval`
    pub fn spawn_refresher(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let refreshed = self.refresh_expired().await;
                debug!(refreshed, "Snapshot refresher tick");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::{MockPostalRepository, MockRuleRepository, MockZoneRepository};
    use crate::rule::{PricingRule, RuleCondition};

    async fn store(ttl: Duration) -> (Arc<MockRuleRepository>, SnapshotStore, BusinessId) {
        let business_id = BusinessId::new();
        let rules = Arc::new(
            MockRuleRepository::with_rules(
                business_id,
                vec![PricingRule::new("VIP", RuleCondition::customer(["vip"]))],
            )
            .await,
        );
        let loader = SnapshotLoader::new(
            rules.clone(),
            Arc::new(MockZoneRepository::new()),
            Arc::new(MockPostalRepository::new()),
        );
        (rules, SnapshotStore::new(loader, ttl), business_id)
    }

    #[tokio::test]
    async fn test_fresh_snapshot_is_reused() {
        let (rules, store, business_id) = store(Duration::from_secs(300)).await;

        let first = store.get(business_id).await.unwrap();
        let second = store.get(business_id).await.unwrap();

        assert_eq!(first.snapshot.version, second.snapshot.version);
        assert!(Arc::ptr_eq(&first.snapshot, &second.snapshot));
        assert_eq!(rules.calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_snapshot_falls_back_to_stale_on_failure() {
        let (rules, store, business_id) = store(Duration::ZERO).await;

        let first = store.get(business_id).await.unwrap();
        rules.set_failing(true);
        let second = store.get(business_id).await.unwrap();

        assert!(second.stale);
        assert_eq!(second.snapshot.version, first.snapshot.version);
    }

    #[tokio::test]
    async fn test_cold_miss_failure_is_an_error() {
        let (rules, store, business_id) = store(Duration::from_secs(300)).await;
        rules.set_failing(true);

        let result = store.get(business_id).await;
        assert!(matches!(result, Err(PricingError::SnapshotUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_refresh_expired_swaps_in_new_snapshot() {
        let (rules, store, business_id) = store(Duration::from_millis(50)).await;
        let before = store.get(business_id).await.unwrap().snapshot;
        assert_eq!(store.refresh_expired().await, 0);

        rules
            .set_rules(business_id, vec![PricingRule::new("Spring", RuleCondition::customer(["spring"]))])
            .await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(store.refresh_expired().await, 1);

        let after = store.peek(business_id).await.unwrap();
        assert!(after.version > before.version);
        assert_eq!(after.rules[0].name, "Spring");
        // Readers holding the old snapshot keep a consistent view
        assert_eq!(before.rules.len(), 1);
        assert_eq!(before.rules[0].name, "VIP");
    }

    #[tokio::test]
    async fn test_refresh_expired_keeps_snapshot_on_failure() {
        let (rules, store, business_id) = store(Duration::ZERO).await;
        let before = store.get(business_id).await.unwrap().snapshot;
        rules.set_failing(true);

        assert_eq!(store.refresh_expired().await, 0);
        let kept = store.peek(business_id).await.unwrap();
        assert!(Arc::ptr_eq(&kept, &before));
    }

    #[tokio::test]
    async fn test_background_refresher_replaces_expired_snapshots() {
        let (rules, store, business_id) = store(Duration::from_millis(10)).await;
        let store = Arc::new(store);
        let before = store.get(business_id).await.unwrap().snapshot;
        rules
            .set_rules(business_id, vec![PricingRule::new("Spring", RuleCondition::customer(["spring"]))])
            .await;

        let handle = Arc::clone(&store).spawn_refresher(Duration::from_millis(10));
        let mut current = Arc::clone(&before);
        for _ in 0..200 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if let Some(snapshot) = store.peek(business_id).await {
                if snapshot.version > before.version {
                    current = snapshot;
                    break;
                }
            }
        }
        handle.abort();

        assert!(current.version > before.version);
        assert_eq!(current.rules[0].name, "Spring");
        assert_eq!(before.rules[0].name, "VIP");
    }

    #[tokio::test]
    async fn test_refresh_increments_version() {
        let (_, store, business_id) = store(Duration::from_secs(300)).await;
        let v1 = store.refresh(business_id).await.unwrap().version;
        let v2 = store.refresh(business_id).await.unwrap().version;
        assert!(v2 > v1);
    }
}

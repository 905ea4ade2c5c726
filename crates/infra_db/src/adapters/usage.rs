//! PostgreSQL Usage Recorder

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{DomainPort, PortError, RuleId};
use domain_pricing::UsageRecorder;

use crate::repositories::rules::RuleStore;

/// Increments `pricing_rules.applied_count` for each applied rule
#[derive(Debug, Clone)]
pub struct PostgresUsageRecorder {
    store: RuleStore,
}

impl PostgresUsageRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self {
            store: RuleStore::new(pool),
        }
    }
}

impl DomainPort for PostgresUsageRecorder {}

#[async_trait]
impl UsageRecorder for PostgresUsageRecorder {
    #[instrument(skip(self), fields(rule_id = %rule_id))]
    async fn increment(&self, rule_id: RuleId) -> Result<(), PortError> {
        self.store.increment_applied_count(*rule_id.as_uuid()).await?;
        debug!("Recorded rule usage");
        Ok(())
    }
}

//! PostgreSQL Postal Pricing Adapter

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use core_kernel::{BusinessId, DomainPort, PortError};
use domain_pricing::{PostalPricingRule, PostalRepository};

use crate::error::DatabaseError;
use crate::repositories::postal::{PostalPricingRow, PostalStore};

/// PostgreSQL-backed [`PostalRepository`]
#[derive(Debug, Clone)]
pub struct PostgresPostalAdapter {
    store: PostalStore,
}

impl PostgresPostalAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            store: PostalStore::new(pool),
        }
    }

    pub fn store(&self) -> &PostalStore {
        &self.store
    }

    pub async fn save(&self, business_id: BusinessId, tier: &PostalPricingRule) -> Result<(), PortError> {
        tier.validate().map_err(DatabaseError::from)?;
        self.store
            .insert(&PostalPricingRow {
                id: Uuid::now_v7(),
                business_id: *business_id.as_uuid(),
                code: tier.code.clone(),
                country: tier.country.clone(),
                base_price: tier.base_price,
                price_per_sq_ft: tier.price_per_sq_ft,
                surcharge_percentage: tier.surcharge_percentage,
                discount_percentage: tier.discount_percentage,
                minimum_price: tier.minimum_price,
                maximum_price: tier.maximum_price,
                is_active: tier.is_active,
            })
            .await?;
        Ok(())
    }
}

impl DomainPort for PostgresPostalAdapter {}

#[async_trait]
impl PostalRepository for PostgresPostalAdapter {
    #[instrument(skip(self), fields(business_id = %business_id))]
    async fn find(
        &self,
        business_id: BusinessId,
        code: &str,
        country: Option<&str>,
    ) -> Result<Option<PostalPricingRule>, PortError> {
        let row = self.store.find(*business_id.as_uuid(), code, country).await?;
        Ok(row.map(row_to_tier).transpose()?)
    }

    #[instrument(skip(self), fields(business_id = %business_id))]
    async fn list_active(&self, business_id: BusinessId) -> Result<Vec<PostalPricingRule>, PortError> {
        let rows = self.store.list_active(*business_id.as_uuid()).await?;
        let tiers = rows
            .into_iter()
            .map(row_to_tier)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tiers)
    }
}

/// Converts a stored row into a validated, normalized tier
pub fn row_to_tier(row: PostalPricingRow) -> Result<PostalPricingRule, DatabaseError> {
    let mut tier = PostalPricingRule::new(&row.code, &row.country);
    tier.base_price = row.base_price;
    tier.price_per_sq_ft = row.price_per_sq_ft;
    tier.surcharge_percentage = row.surcharge_percentage;
    tier.discount_percentage = row.discount_percentage;
    tier.minimum_price = row.minimum_price;
    tier.maximum_price = row.maximum_price;
    tier.is_active = row.is_active;
    tier.validate()?;
    Ok(tier)
}

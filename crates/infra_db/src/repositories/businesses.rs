//! Business registry store
//!
//! Every pricing table references `businesses`; rows are created before any
//! rule, zone or postal tier is stored for a business.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

#[derive(Debug, Clone)]
pub struct BusinessStore {
    pool: PgPool,
}

impl BusinessStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registers a business, renaming it if it already exists
    pub async fn upsert(&self, business_id: Uuid, name: &str) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO businesses (business_id, name) VALUES ($1, $2) \
             ON CONFLICT (business_id) DO UPDATE SET name = EXCLUDED.name",
        )
        .bind(business_id)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::classify)?;

        Ok(())
    }

    pub async fn exists(&self, business_id: Uuid) -> Result<bool, DatabaseError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM businesses WHERE business_id = $1)",
        )
        .bind(business_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

//! Postal pricing tier store

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostalPricingRow {
    pub id: Uuid,
    pub business_id: Uuid,
    pub code: String,
    pub country: String,
    pub base_price: Decimal,
    pub price_per_sq_ft: Option<Decimal>,
    pub surcharge_percentage: Decimal,
    pub discount_percentage: Decimal,
    pub minimum_price: Option<Decimal>,
    pub maximum_price: Option<Decimal>,
    pub is_active: bool,
}

const POSTAL_COLUMNS: &str = r#"
    id, business_id, code, country, base_price, price_per_sq_ft, surcharge_percentage,
    discount_percentage, minimum_price, maximum_price, is_active
"#;

/// Access to the `postal_pricing_rules` table
#[derive(Debug, Clone)]
pub struct PostalStore {
    pool: PgPool,
}

impl PostalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active tier for a code; without a country the lowest country code wins
    pub async fn find(
        &self,
        business_id: Uuid,
        code: &str,
        country: Option<&str>,
    ) -> Result<Option<PostalPricingRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM postal_pricing_rules \
             WHERE business_id = $1 AND is_active \
               AND upper(trim(code)) = upper(trim($2)) \
               AND ($3::text IS NULL OR upper(country) = upper(trim($3))) \
             ORDER BY upper(country) ASC \
             LIMIT 1",
            POSTAL_COLUMNS
        );
        let row = sqlx::query_as::<_, PostalPricingRow>(&sql)
            .bind(business_id)
            .bind(code)
            .bind(country)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn list_active(&self, business_id: Uuid) -> Result<Vec<PostalPricingRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM postal_pricing_rules \
             WHERE business_id = $1 AND is_active \
             ORDER BY code, country",
            POSTAL_COLUMNS
        );
        let rows = sqlx::query_as::<_, PostalPricingRow>(&sql)
            .bind(business_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn insert(&self, row: &PostalPricingRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO postal_pricing_rules (
                id, business_id, code, country, base_price, price_per_sq_ft,
                surcharge_percentage, discount_percentage, minimum_price, maximum_price, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(row.id)
        .bind(row.business_id)
        .bind(&row.code)
        .bind(&row.country)
        .bind(row.base_price)
        .bind(row.price_per_sq_ft)
        .bind(row.surcharge_percentage)
        .bind(row.discount_percentage)
        .bind(row.minimum_price)
        .bind(row.maximum_price)
        .bind(row.is_active)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::classify)?;

        Ok(())
    }
}

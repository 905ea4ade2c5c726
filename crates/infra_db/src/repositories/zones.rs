//! Zone configuration store
//!
//! A business's geofencing setup spans three tables: `zone_configs` (one
//! row per business), `service_zones` and `zone_service_rules`.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ZoneConfigRow {
    pub business_id: Uuid,
    pub shop_latitude: f64,
    pub shop_longitude: f64,
    pub base_rate_per_1000_sq_ft: Decimal,
    pub minimum_charge: Option<Decimal>,
    pub max_service_distance_minutes: i32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceZoneRow {
    pub zone_id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub min_drive_time_minutes: i32,
    pub max_drive_time_minutes: Option<i32>,
    pub surcharge_percentage: Decimal,
    pub priority: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ZoneServiceRuleRow {
    pub business_id: Uuid,
    pub service_type: String,
    pub available_in_zones: Vec<Uuid>,
    pub additional_fee_percentage: Decimal,
}

/// Access to the zone tables
#[derive(Debug, Clone)]
pub struct ZoneStore {
    pool: PgPool,
}

impl ZoneStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_config(&self, business_id: Uuid) -> Result<Option<ZoneConfigRow>, DatabaseError> {
        let row = sqlx::query_as::<_, ZoneConfigRow>(
            r#"
            SELECT business_id, shop_latitude, shop_longitude, base_rate_per_1000_sq_ft,
                   minimum_charge, max_service_distance_minutes
            FROM zone_configs
            WHERE business_id = $1
            "#,
        )
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Zones of a business, inactive ones included
    pub async fn list_zones(&self, business_id: Uuid) -> Result<Vec<ServiceZoneRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ServiceZoneRow>(
            r#"
            SELECT zone_id, business_id, name, min_drive_time_minutes, max_drive_time_minutes,
                   surcharge_percentage, priority, is_active
            FROM service_zones
            WHERE business_id = $1
            ORDER BY priority DESC, zone_id ASC
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn list_service_rules(&self, business_id: Uuid) -> Result<Vec<ZoneServiceRuleRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ZoneServiceRuleRow>(
            r#"
            SELECT business_id, service_type, available_in_zones, additional_fee_percentage
            FROM zone_service_rules
            WHERE business_id = $1
            ORDER BY service_type
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Inserts or replaces the business's zone configuration row
    pub async fn upsert_config(&self, config: &ZoneConfigRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO zone_configs (
                business_id, shop_latitude, shop_longitude, base_rate_per_1000_sq_ft,
                minimum_charge, max_service_distance_minutes
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (business_id) DO UPDATE SET
                shop_latitude = EXCLUDED.shop_latitude,
                shop_longitude = EXCLUDED.shop_longitude,
                base_rate_per_1000_sq_ft = EXCLUDED.base_rate_per_1000_sq_ft,
                minimum_charge = EXCLUDED.minimum_charge,
                max_service_distance_minutes = EXCLUDED.max_service_distance_minutes,
                updated_at = now()
            "#,
        )
        .bind(config.business_id)
        .bind(config.shop_latitude)
        .bind(config.shop_longitude)
        .bind(config.base_rate_per_1000_sq_ft)
        .bind(config.minimum_charge)
        .bind(config.max_service_distance_minutes)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::classify)?;

        Ok(())
    }

    pub async fn insert_zone(&self, zone: &ServiceZoneRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO service_zones (
                zone_id, business_id, name, min_drive_time_minutes, max_drive_time_minutes,
                surcharge_percentage, priority, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(zone.zone_id)
        .bind(zone.business_id)
        .bind(&zone.name)
        .bind(zone.min_drive_time_minutes)
        .bind(zone.max_drive_time_minutes)
        .bind(zone.surcharge_percentage)
        .bind(zone.priority)
        .bind(zone.is_active)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::classify)?;

        Ok(())
    }

    pub async fn insert_service_rule(&self, rule: &ZoneServiceRuleRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO zone_service_rules (
                business_id, service_type, available_in_zones, additional_fee_percentage
            )
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(rule.business_id)
        .bind(&rule.service_type)
        .bind(&rule.available_in_zones)
        .bind(rule.additional_fee_percentage)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::classify)?;

        Ok(())
    }
}

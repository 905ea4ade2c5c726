//! PostgreSQL Zone Adapter

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{BusinessId, DomainPort, PortError, ZoneId};
use domain_pricing::{GeoPoint, ServiceType, ServiceZone, ZoneConfig, ZoneRepository, ZoneServiceRule};

use crate::error::DatabaseError;
use crate::repositories::zones::{ServiceZoneRow, ZoneConfigRow, ZoneServiceRuleRow, ZoneStore};

/// PostgreSQL-backed [`ZoneRepository`]
#[derive(Debug, Clone)]
pub struct PostgresZoneAdapter {
    store: ZoneStore,
}

impl PostgresZoneAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            store: ZoneStore::new(pool),
        }
    }

    pub fn store(&self) -> &ZoneStore {
        &self.store
    }

    /// Persists a whole configuration: config row, zones and service rules
    pub async fn save(&self, business_id: BusinessId, config: &ZoneConfig) -> Result<(), PortError> {
        let business = *business_id.as_uuid();
        self.store
            .upsert_config(&ZoneConfigRow {
                business_id: business,
                shop_latitude: config.shop_location.latitude,
                shop_longitude: config.shop_location.longitude,
                base_rate_per_1000_sq_ft: config.base_rate_per_1000_sq_ft,
                minimum_charge: config.minimum_charge,
                max_service_distance_minutes: to_db_minutes(config.max_service_distance_minutes)?,
            })
            .await?;

        for zone in &config.zones {
            self.store
                .insert_zone(&ServiceZoneRow {
                    zone_id: *zone.zone_id.as_uuid(),
                    business_id: business,
                    name: zone.name.clone(),
                    min_drive_time_minutes: to_db_minutes(zone.min_drive_time_minutes)?,
                    max_drive_time_minutes: zone.max_drive_time_minutes.map(to_db_minutes).transpose()?,
                    surcharge_percentage: zone.surcharge_percentage,
                    priority: zone.priority,
                    is_active: zone.is_active,
                })
                .await?;
        }

        for rule in &config.service_rules {
            self.store
                .insert_service_rule(&ZoneServiceRuleRow {
                    business_id: business,
                    service_type: rule.service_type.code().to_string(),
                    available_in_zones: rule.available_in_zones.iter().map(|z| *z.as_uuid()).collect(),
                    additional_fee_percentage: rule.additional_fee_percentage,
                })
                .await?;
        }
        Ok(())
    }
}

impl DomainPort for PostgresZoneAdapter {}

#[async_trait]
impl ZoneRepository for PostgresZoneAdapter {
    #[instrument(skip(self), fields(business_id = %business_id))]
    async fn get(&self, business_id: BusinessId) -> Result<Option<ZoneConfig>, PortError> {
        let business = *business_id.as_uuid();
        let Some(config) = self.store.get_config(business).await? else {
            debug!("No zone configuration");
            return Ok(None);
        };

        let (zones, service_rules) = tokio::try_join!(
            self.store.list_zones(business),
            self.store.list_service_rules(business),
        )?;

        let config = rows_to_config(config, zones, service_rules)?;
        debug!(zones = config.zones.len(), "Loaded zone configuration");
        Ok(Some(config))
    }
}

fn to_db_minutes(minutes: u32) -> Result<i32, DatabaseError> {
    i32::try_from(minutes)
        .map_err(|_| DatabaseError::InvalidRecord(format!("drive time {} minutes is out of range", minutes)))
}

fn from_db_minutes(minutes: i32, what: &str) -> Result<u32, DatabaseError> {
    u32::try_from(minutes)
        .map_err(|_| DatabaseError::InvalidRecord(format!("{} of {} minutes is negative", what, minutes)))
}

/// Assembles and validates a zone configuration from its rows
pub fn rows_to_config(
    config: ZoneConfigRow,
    zones: Vec<ServiceZoneRow>,
    service_rules: Vec<ZoneServiceRuleRow>,
) -> Result<ZoneConfig, DatabaseError> {
    let zones = zones
        .into_iter()
        .map(|row| -> Result<ServiceZone, DatabaseError> {
            Ok(ServiceZone {
                zone_id: ZoneId::from(row.zone_id),
                min_drive_time_minutes: from_db_minutes(row.min_drive_time_minutes, "zone minimum")?,
                max_drive_time_minutes: row
                    .max_drive_time_minutes
                    .map(|m| from_db_minutes(m, "zone maximum"))
                    .transpose()?,
                name: row.name,
                surcharge_percentage: row.surcharge_percentage,
                priority: row.priority,
                is_active: row.is_active,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let service_rules = service_rules
        .into_iter()
        .map(|row| -> Result<ZoneServiceRule, DatabaseError> {
            let service_type: ServiceType = row
                .service_type
                .parse()
                .map_err(|e| DatabaseError::InvalidRecord(format!("zone service rule: {}", e)))?;
            Ok(ZoneServiceRule {
                service_type,
                available_in_zones: row.available_in_zones.into_iter().map(ZoneId::from).collect(),
                additional_fee_percentage: row.additional_fee_percentage,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let config = ZoneConfig {
        shop_location: GeoPoint::new(config.shop_latitude, config.shop_longitude),
        base_rate_per_1000_sq_ft: config.base_rate_per_1000_sq_ft,
        minimum_charge: config.minimum_charge,
        max_service_distance_minutes: from_db_minutes(config.max_service_distance_minutes, "service distance")?,
        zones,
        service_rules,
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn config_row() -> ZoneConfigRow {
        ZoneConfigRow {
            business_id: Uuid::from_u128(1),
            shop_latitude: 34.05,
            shop_longitude: -118.24,
            base_rate_per_1000_sq_ft: dec!(20),
            minimum_charge: Some(dec!(40)),
            max_service_distance_minutes: 45,
        }
    }

    fn zone_row(n: u128, min: i32, max: Option<i32>) -> ServiceZoneRow {
        ServiceZoneRow {
            zone_id: Uuid::from_u128(n),
            business_id: Uuid::from_u128(1),
            name: format!("Zone {}", n),
            min_drive_time_minutes: min,
            max_drive_time_minutes: max,
            surcharge_percentage: dec!(10),
            priority: 0,
            is_active: true,
        }
    }

    #[test]
    fn test_rows_to_config() {
        let config = rows_to_config(
            config_row(),
            vec![zone_row(1, 0, Some(20)), zone_row(2, 20, None)],
            vec![ZoneServiceRuleRow {
                business_id: Uuid::from_u128(1),
                service_type: "driveway_cleaning".to_string(),
                available_in_zones: vec![Uuid::from_u128(1)],
                additional_fee_percentage: dec!(5),
            }],
        )
        .unwrap();

        assert_eq!(config.zones.len(), 2);
        assert_eq!(config.zones[1].max_drive_time_minutes, None);
        assert_eq!(config.minimum_charge, Some(dec!(40)));
        let rule = config.service_rule(ServiceType::DrivewayCleaning).unwrap();
        assert!(rule.available_in_zones.contains(&ZoneId::from_u128(1)));
    }

    #[test]
    fn test_negative_minutes_rejected() {
        let err = rows_to_config(config_row(), vec![zone_row(1, -5, Some(20))], vec![]).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidRecord(_)));
    }

    #[test]
    fn test_empty_band_rejected() {
        let err = rows_to_config(config_row(), vec![zone_row(1, 30, Some(20))], vec![]).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidRecord(_)));
    }

    #[test]
    fn test_unknown_service_type_rejected() {
        let err = rows_to_config(
            config_row(),
            vec![],
            vec![ZoneServiceRuleRow {
                business_id: Uuid::from_u128(1),
                service_type: "pool_cleaning".to_string(),
                available_in_zones: vec![],
                additional_fee_percentage: dec!(0),
            }],
        )
        .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidRecord(_)));
    }
}

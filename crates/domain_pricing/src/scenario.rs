//! Quote scenarios
//!
//! A scenario is the engine's input: where the customer is, who they are and
//! which services they asked for. Areas are measured upstream; the engine
//! only prices them.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{checked_add, checked_mul, MoneyError};

use crate::error::PricingError;

/// Largest accepted area, in square feet, for a service or a property
pub const MAX_AREA: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Largest accepted price per square foot
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// The property services a business can quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    LawnTreatment,
    LawnMowing,
    MosquitoTreatment,
    DrivewayCleaning,
    SidewalkCleaning,
}

impl ServiceType {
    pub const ALL: [ServiceType; 5] = [
        ServiceType::LawnTreatment,
        ServiceType::LawnMowing,
        ServiceType::MosquitoTreatment,
        ServiceType::DrivewayCleaning,
        ServiceType::SidewalkCleaning,
    ];

    /// Returns the stored code, e.g. `lawn_treatment`
    pub fn code(&self) -> &'static str {
        match self {
            ServiceType::LawnTreatment => "lawn_treatment",
            ServiceType::LawnMowing => "lawn_mowing",
            ServiceType::MosquitoTreatment => "mosquito_treatment",
            ServiceType::DrivewayCleaning => "driveway_cleaning",
            ServiceType::SidewalkCleaning => "sidewalk_cleaning",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ServiceType {
    type Err = PricingError;

    /// Accepts codes and display names: `lawn_treatment`, `Lawn Treatment`, `lawn-treatment`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_lowercase() })
            .collect();

        match normalized.as_str() {
            "lawn_treatment" | "lawn" => Ok(ServiceType::LawnTreatment),
            "lawn_mowing" | "mowing" => Ok(ServiceType::LawnMowing),
            "mosquito_treatment" | "mosquito" => Ok(ServiceType::MosquitoTreatment),
            "driveway_cleaning" | "driveway" => Ok(ServiceType::DrivewayCleaning),
            "sidewalk_cleaning" | "sidewalk" => Ok(ServiceType::SidewalkCleaning),
            _ => Err(PricingError::validation(
                "serviceType",
                format!("unknown service type '{}'", s.trim()),
            )),
        }
    }
}

/// A geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// One requested service with its measured area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLine {
    pub name: String,
    pub service_type: ServiceType,
    /// Square feet
    pub area: Decimal,
    pub price_per_unit: Decimal,
}

impl ServiceLine {
    pub fn new(
        name: impl Into<String>,
        service_type: ServiceType,
        area: Decimal,
        price_per_unit: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            service_type,
            area,
            price_per_unit,
        }
    }

    /// `area × pricePerUnit`
    pub fn subtotal(&self) -> Result<Decimal, MoneyError> {
        checked_mul(self.area, self.price_per_unit)
    }
}

/// The input to one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteScenario {
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub customer_tags: Vec<String>,
    pub total_area: Decimal,
    pub services: Vec<ServiceLine>,
    pub date: NaiveDate,
    #[serde(default)]
    pub coordinates: Option<GeoPoint>,
}

impl QuoteScenario {
    /// Rejects scenarios the engine cannot price
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.services.is_empty() {
            return Err(PricingError::validation("services", "at least one service is required"));
        }
        if self.total_area.is_sign_negative() && !self.total_area.is_zero() {
            return Err(PricingError::validation(
                "totalArea",
                format!("area must not be negative, got {}", self.total_area),
            ));
        }
        if self.total_area > MAX_AREA {
            return Err(PricingError::validation(
                "totalArea",
                format!("area must not exceed {} sq ft, got {}", MAX_AREA, self.total_area),
            ));
        }
        for (index, service) in self.services.iter().enumerate() {
            if service.area.is_sign_negative() && !service.area.is_zero() {
                return Err(PricingError::validation(
                    format!("services[{}].area", index),
                    format!("area must not be negative, got {}", service.area),
                ));
            }
            if service.area > MAX_AREA {
                return Err(PricingError::validation(
                    format!("services[{}].area", index),
                    format!("area must not exceed {} sq ft, got {}", MAX_AREA, service.area),
                ));
            }
            if service.price_per_unit.is_sign_negative() && !service.price_per_unit.is_zero() {
                return Err(PricingError::validation(
                    format!("services[{}].pricePerUnit", index),
                    format!("price must not be negative, got {}", service.price_per_unit),
                ));
            }
            if service.price_per_unit > MAX_UNIT_PRICE {
                return Err(PricingError::validation(
                    format!("services[{}].pricePerUnit", index),
                    format!("price must not exceed {}, got {}", MAX_UNIT_PRICE, service.price_per_unit),
                ));
            }
        }
        if let Some(point) = self.coordinates {
            if !point.is_valid() {
                return Err(PricingError::validation(
                    "coordinates",
                    format!("{} is not a valid coordinate", point),
                ));
            }
        }
        Ok(())
    }

    /// Sum of every service's `area × pricePerUnit`
    pub fn original_total(&self) -> Result<Decimal, MoneyError> {
        self.services
            .iter()
            .try_fold(Decimal::ZERO, |total, service| -> Result<Decimal, MoneyError> {
                checked_add(total, service.subtotal()?)
            })
    }

    /// The postal code trimmed and upper-cased, if present and non-blank
    pub fn normalized_postal_code(&self) -> Option<String> {
        self.postal_code
            .as_deref()
            .map(normalize_postal_code)
            .filter(|code| !code.is_empty())
    }

    /// Customer tags trimmed and lower-cased
    pub fn normalized_tags(&self) -> BTreeSet<String> {
        self.customer_tags
            .iter()
            .map(|tag| normalize_tag(tag))
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

pub(crate) fn normalize_postal_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

pub(crate) fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn scenario() -> QuoteScenario {
        QuoteScenario {
            postal_code: Some(" 90210 ".to_string()),
            country: None,
            customer_tags: vec![" VIP ".to_string(), "".to_string()],
            total_area: dec!(5000),
            services: vec![
                ServiceLine::new("Lawn Treatment", ServiceType::LawnTreatment, dec!(3000), dec!(0.02)),
                ServiceLine::new("Driveway", ServiceType::DrivewayCleaning, dec!(1500), dec!(0.03)),
            ],
            date: NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(),
            coordinates: None,
        }
    }

    #[test]
    fn test_original_total() {
        assert_eq!(scenario().original_total(), Ok(dec!(105)));
    }

    #[test]
    fn test_normalization() {
        let s = scenario();
        assert_eq!(s.normalized_postal_code().as_deref(), Some("90210"));
        assert_eq!(s.normalized_tags().into_iter().collect::<Vec<_>>(), vec!["vip".to_string()]);
    }

    #[test]
    fn test_empty_services_rejected() {
        let mut s = scenario();
        s.services.clear();
        assert!(matches!(s.validate(), Err(PricingError::Validation { field, .. }) if field == "services"));
    }

    #[test]
    fn test_negative_area_rejected() {
        let mut s = scenario();
        s.services[1].area = dec!(-1);
        match s.validate() {
            Err(PricingError::Validation { field, .. }) => assert_eq!(field, "services[1].area"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_oversized_amounts_rejected() {
        let mut s = scenario();
        s.services[0].area = dec!(100000000000000000000);
        s.services[0].price_per_unit = dec!(10000000000);
        match s.validate() {
            Err(PricingError::Validation { field, .. }) => assert_eq!(field, "services[0].area"),
            other => panic!("expected validation error, got {:?}", other),
        }

        let mut s = scenario();
        s.services[1].price_per_unit = MAX_UNIT_PRICE + dec!(1);
        assert!(matches!(s.validate(), Err(PricingError::Validation { field, .. }) if field == "services[1].pricePerUnit"));

        let mut s = scenario();
        s.total_area = MAX_AREA + dec!(1);
        assert!(matches!(s.validate(), Err(PricingError::Validation { field, .. }) if field == "totalArea"));

        let mut s = scenario();
        s.services[0].area = MAX_AREA;
        s.services[0].price_per_unit = MAX_UNIT_PRICE;
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_subtotal_overflow_is_an_error() {
        let line = ServiceLine::new("Huge", ServiceType::LawnMowing, dec!(100000000000000000000), dec!(10000000000));
        assert_eq!(line.subtotal(), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_service_type_parsing() {
        assert_eq!("Lawn Treatment".parse::<ServiceType>().unwrap(), ServiceType::LawnTreatment);
        assert_eq!("sidewalk-cleaning".parse::<ServiceType>().unwrap(), ServiceType::SidewalkCleaning);
        assert!("pool cleaning".parse::<ServiceType>().is_err());
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        let mut s = scenario();
        s.coordinates = Some(GeoPoint::new(123.0, 0.0));
        assert!(s.validate().is_err());
    }
}

//! Evaluation DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer};
use validator::{Validate, ValidationError};

use core_kernel::parse_decimal;
use domain_pricing::{
    GeoPoint, PricingError, QuoteScenario, ServiceLine, ServiceType, MAX_AREA, MAX_UNIT_PRICE,
};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    #[validate(length(max = 16))]
    pub postal_code: Option<String>,
    #[validate(length(min = 2, max = 3))]
    pub country: Option<String>,
    #[serde(default)]
    pub customer_tags: Vec<String>,
    #[serde(deserialize_with = "amount")]
    #[validate(custom(function = "area_in_range"))]
    pub total_area: Decimal,
    #[validate(nested)]
    pub services: Vec<ServiceLineRequest>,
    /// Quote date; today when omitted
    pub date: Option<NaiveDate>,
    #[validate(nested)]
    pub coordinates: Option<CoordinatesRequest>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLineRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// A code such as `lawn_treatment` or a display name such as `Lawn Treatment`
    pub service_type: String,
    #[serde(deserialize_with = "amount")]
    #[validate(custom(function = "area_in_range"))]
    pub area: Decimal,
    #[serde(deserialize_with = "amount")]
    #[validate(custom(function = "unit_price_in_range"))]
    pub price_per_unit: Decimal,
}

#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct CoordinatesRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Text(String),
    Number(serde_json::Number),
}

/// Accepts `"1,500"`, `"$0.02"` or a plain JSON number
fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    let raw = match RawAmount::deserialize(deserializer)? {
        RawAmount::Text(text) => text,
        RawAmount::Number(number) => number.to_string(),
    };
    parse_decimal("amount", &raw).map_err(de::Error::custom)
}

/// `0 ≤ area ≤ MAX_AREA` square feet
fn area_in_range(area: &Decimal) -> Result<(), ValidationError> {
    within(*area, MAX_AREA, "area_out_of_range")
}

/// `0 ≤ price ≤ MAX_UNIT_PRICE` per square foot
fn unit_price_in_range(price: &Decimal) -> Result<(), ValidationError> {
    within(*price, MAX_UNIT_PRICE, "price_out_of_range")
}

fn within(value: Decimal, max: Decimal, code: &'static str) -> Result<(), ValidationError> {
    if value < Decimal::ZERO || value > max {
        let mut error = ValidationError::new(code);
        error.message = Some(format!("must be between 0 and {}", max).into());
        return Err(error);
    }
    Ok(())
}

impl EvaluateRequest {
    /// Builds the domain scenario; service types are resolved here
    pub fn into_scenario(self, today: NaiveDate) -> Result<QuoteScenario, PricingError> {
        let services = self
            .services
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let service_type: ServiceType = line.service_type.parse().map_err(|e| match e {
                    PricingError::Validation { message, .. } => {
                        PricingError::validation(format!("services[{}].serviceType", i), message)
                    }
                    other => other,
                })?;
                Ok(ServiceLine::new(line.name, service_type, line.area, line.price_per_unit))
            })
            .collect::<Result<Vec<_>, PricingError>>()?;

        Ok(QuoteScenario {
            postal_code: self.postal_code,
            country: self.country,
            customer_tags: self.customer_tags,
            total_area: self.total_area,
            services,
            date: self.date.unwrap_or(today),
            coordinates: self.coordinates.map(|c| GeoPoint::new(c.latitude, c.longitude)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 15).unwrap()
    }

    #[test]
    fn test_amounts_as_strings_or_numbers() {
        let request: EvaluateRequest = serde_json::from_value(json!({
            "postalCode": "90210",
            "totalArea": "5000",
            "services": [
                {"name": "Lawn", "serviceType": "Lawn Treatment", "area": 3000, "pricePerUnit": "0.02"}
            ]
        }))
        .unwrap();

        let scenario = request.into_scenario(today()).unwrap();
        assert_eq!(scenario.total_area, dec!(5000));
        assert_eq!(scenario.services[0].service_type, ServiceType::LawnTreatment);
        assert_eq!(scenario.services[0].price_per_unit, dec!(0.02));
        assert_eq!(scenario.date, today());
        assert!(scenario.customer_tags.is_empty());
    }

    #[test]
    fn test_formatted_amounts() {
        let request: EvaluateRequest = serde_json::from_value(json!({
            "totalArea": "8,000",
            "services": [
                {"name": "Mowing", "serviceType": "mowing", "area": "8,000", "pricePerUnit": "$0.01"}
            ]
        }))
        .unwrap();
        assert_eq!(request.total_area, dec!(8000));
        assert_eq!(request.services[0].price_per_unit, dec!(0.01));

        let bad = serde_json::from_value::<EvaluateRequest>(json!({
            "totalArea": "lots",
            "services": []
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_unknown_service_type_names_its_line() {
        let request: EvaluateRequest = serde_json::from_value(json!({
            "totalArea": 100,
            "services": [
                {"name": "Lawn", "serviceType": "lawn", "area": 100, "pricePerUnit": 1},
                {"name": "Pool", "serviceType": "pool_cleaning", "area": 100, "pricePerUnit": 1}
            ]
        }))
        .unwrap();

        match request.into_scenario(today()) {
            Err(PricingError::Validation { field, .. }) => assert_eq!(field, "services[1].serviceType"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_amount_limits() {
        let request: EvaluateRequest = serde_json::from_value(json!({
            "totalArea": "5000",
            "services": [
                {"name": "Estate", "serviceType": "lawn_mowing", "area": "1e20", "pricePerUnit": "1e10"}
            ]
        }))
        .unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.errors().contains_key("services"));

        let request: EvaluateRequest = serde_json::from_value(json!({
            "totalArea": "1000000001",
            "services": [
                {"name": "Lawn", "serviceType": "lawn_mowing", "area": "1000000000", "pricePerUnit": "1000000"}
            ]
        }))
        .unwrap();
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        assert!(!errors.errors().contains_key("services"));
        assert!(errors.to_string().contains("must be between 0 and 1000000000"));
    }

    #[test]
    fn test_coordinates_out_of_range() {
        let request: EvaluateRequest = serde_json::from_value(json!({
            "totalArea": 100,
            "services": [],
            "coordinates": {"latitude": 123.0, "longitude": 0.0}
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }
}

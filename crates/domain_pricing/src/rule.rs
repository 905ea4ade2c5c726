//! Pricing rules
//!
//! A rule pairs one typed condition with a price adjustment. The condition
//! is a tagged variant keyed by `type`, so a zone rule can only ever carry
//! postal codes and a volume rule can only carry area bounds:
//!
//! ```json
//! { "type": "customer", "tags": ["vip", "premium"] }
//! { "type": "volume", "minArea": 8000, "maxArea": null }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{DateRange, RuleId};

use crate::error::RuleDefinitionError;
use crate::scenario::{normalize_postal_code, normalize_tag, ServiceType};

/// The kind of condition a rule carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Zone,
    Customer,
    Service,
    Volume,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Zone => "zone",
            RuleType::Customer => "customer",
            RuleType::Service => "service",
            RuleType::Volume => "volume",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule conditions, one variant per rule type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleCondition {
    /// Matches when the scenario's postal code is in the set
    Zone {
        #[serde(rename = "postalCodes", default)]
        postal_codes: BTreeSet<String>,
    },
    /// Matches when any scenario tag is in the set
    Customer {
        #[serde(default)]
        tags: BTreeSet<String>,
    },
    /// Matches when any requested service type is in the set
    Service {
        #[serde(rename = "serviceTypes", default)]
        service_types: BTreeSet<ServiceType>,
    },
    /// Matches when `minArea <= totalArea <= maxArea`; a missing bound is open
    Volume {
        #[serde(rename = "minArea", default)]
        min_area: Option<Decimal>,
        #[serde(rename = "maxArea", default)]
        max_area: Option<Decimal>,
    },
}

impl RuleCondition {
    /// Builds a zone condition, normalizing the codes
    pub fn zone<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        RuleCondition::Zone {
            postal_codes: codes
                .into_iter()
                .map(|c| normalize_postal_code(c.as_ref()))
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }

    /// Builds a customer condition, normalizing the tags
    pub fn customer<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        RuleCondition::Customer {
            tags: tags
                .into_iter()
                .map(|t| normalize_tag(t.as_ref()))
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn service<I: IntoIterator<Item = ServiceType>>(types: I) -> Self {
        RuleCondition::Service {
            service_types: types.into_iter().collect(),
        }
    }

    pub fn volume(min_area: Option<Decimal>, max_area: Option<Decimal>) -> Self {
        RuleCondition::Volume { min_area, max_area }
    }

    pub fn rule_type(&self) -> RuleType {
        match self {
            RuleCondition::Zone { .. } => RuleType::Zone,
            RuleCondition::Customer { .. } => RuleType::Customer,
            RuleCondition::Service { .. } => RuleType::Service,
            RuleCondition::Volume { .. } => RuleType::Volume,
        }
    }

    /// A condition with nothing to test never matches
    pub fn is_empty(&self) -> bool {
        match self {
            RuleCondition::Zone { postal_codes } => postal_codes.is_empty(),
            RuleCondition::Customer { tags } => tags.is_empty(),
            RuleCondition::Service { service_types } => service_types.is_empty(),
            RuleCondition::Volume { min_area, max_area } => min_area.is_none() && max_area.is_none(),
        }
    }
}

/// A discount taken after multipliers and surcharges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Discount {
    /// Percent off, e.g. `10` for 10%
    Percentage(Decimal),
    /// A fixed amount off the grand total
    Flat(Decimal),
}

/// What a matched rule does to the price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAdjustment {
    #[serde(default = "default_multiplier")]
    pub price_multiplier: Decimal,
    /// Per-service-type unit prices that replace the scenario's price
    #[serde(default)]
    pub fixed_unit_prices: BTreeMap<ServiceType, Decimal>,
    #[serde(default)]
    pub minimum_charge: Option<Decimal>,
    #[serde(default)]
    pub maximum_charge: Option<Decimal>,
    /// Added once to the grand total
    #[serde(default)]
    pub surcharge: Option<Decimal>,
    #[serde(default)]
    pub discount: Option<Discount>,
}

fn default_multiplier() -> Decimal {
    Decimal::ONE
}

impl Default for PriceAdjustment {
    fn default() -> Self {
        Self {
            price_multiplier: Decimal::ONE,
            fixed_unit_prices: BTreeMap::new(),
            minimum_charge: None,
            maximum_charge: None,
            surcharge: None,
            discount: None,
        }
    }
}

impl PriceAdjustment {
    pub fn multiplier(value: Decimal) -> Self {
        Self {
            price_multiplier: value,
            ..Self::default()
        }
    }

    pub fn percentage_discount(percent: Decimal) -> Self {
        Self {
            discount: Some(Discount::Percentage(percent)),
            ..Self::default()
        }
    }

    pub fn flat_discount(amount: Decimal) -> Self {
        Self {
            discount: Some(Discount::Flat(amount)),
            ..Self::default()
        }
    }

    pub fn surcharge(amount: Decimal) -> Self {
        Self {
            surcharge: Some(amount),
            ..Self::default()
        }
    }

    pub fn with_discount(mut self, discount: Discount) -> Self {
        self.discount = Some(discount);
        self
    }

    pub fn with_fixed_unit_price(mut self, service_type: ServiceType, price: Decimal) -> Self {
        self.fixed_unit_prices.insert(service_type, price);
        self
    }

    pub fn with_minimum_charge(mut self, amount: Decimal) -> Self {
        self.minimum_charge = Some(amount);
        self
    }

    pub fn with_maximum_charge(mut self, amount: Decimal) -> Self {
        self.maximum_charge = Some(amount);
        self
    }
}

/// A business's pricing rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRule {
    pub id: RuleId,
    pub name: String,
    #[serde(rename = "conditions")]
    pub condition: RuleCondition,
    #[serde(default)]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub adjustment: PriceAdjustment,
    /// Higher runs first
    #[serde(default)]
    pub priority: i32,
    pub is_active: bool,
    /// Usage counter, maintained write-behind
    #[serde(default)]
    pub applied_count: u64,
}

impl PricingRule {
    /// Creates an active rule with priority 0 and a neutral adjustment
    pub fn new(name: impl Into<String>, condition: RuleCondition) -> Self {
        Self {
            id: RuleId::new_v7(),
            name: name.into(),
            condition,
            date_range: None,
            adjustment: PriceAdjustment::default(),
            priority: 0,
            is_active: true,
            applied_count: 0,
        }
    }

    pub fn with_id(mut self, id: RuleId) -> Self {
        self.id = id;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_adjustment(mut self, adjustment: PriceAdjustment) -> Self {
        self.adjustment = adjustment;
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn rule_type(&self) -> RuleType {
        self.condition.rule_type()
    }

    /// Checks the numeric invariants of a stored rule
    pub fn validate(&self) -> Result<(), RuleDefinitionError> {
        let adj = &self.adjustment;
        let fail = |message: String| -> Result<(), RuleDefinitionError> {
            Err(RuleDefinitionError::rule(self.id, message))
        };

        if adj.price_multiplier.is_sign_negative() && !adj.price_multiplier.is_zero() {
            return fail(format!("price multiplier {} is negative", adj.price_multiplier));
        }
        for (service_type, price) in &adj.fixed_unit_prices {
            if price.is_sign_negative() && !price.is_zero() {
                return fail(format!("fixed unit price for {} is negative", service_type));
            }
        }
        for (label, value) in [
            ("minimum charge", adj.minimum_charge),
            ("maximum charge", adj.maximum_charge),
            ("surcharge", adj.surcharge),
        ] {
            if let Some(v) = value {
                if v.is_sign_negative() && !v.is_zero() {
                    return fail(format!("{} {} is negative", label, v));
                }
            }
        }
        match adj.discount {
            Some(Discount::Percentage(p)) if p < Decimal::ZERO || p > Decimal::ONE_HUNDRED => {
                return fail(format!("discount percentage {} is outside 0..=100", p));
            }
            Some(Discount::Flat(f)) if f < Decimal::ZERO => {
                return fail(format!("flat discount {} is negative", f));
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_condition_is_tagged_by_type() {
        let condition: RuleCondition = serde_json::from_value(json!({
            "type": "volume",
            "minArea": 8000
        }))
        .unwrap();
        assert_eq!(condition, RuleCondition::volume(Some(dec!(8000)), None));
        assert_eq!(condition.rule_type(), RuleType::Volume);
    }

    #[test]
    fn test_service_condition_from_json() {
        let condition: RuleCondition = serde_json::from_value(json!({
            "type": "service",
            "serviceTypes": ["mosquito_treatment"]
        }))
        .unwrap();
        assert_eq!(condition, RuleCondition::service([ServiceType::MosquitoTreatment]));
    }

    #[test]
    fn test_unknown_condition_type_rejected() {
        let result: Result<RuleCondition, _> = serde_json::from_value(json!({ "type": "weather" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_conditions() {
        assert!(RuleCondition::customer(Vec::<String>::new()).is_empty());
        assert!(RuleCondition::zone(["  "]).is_empty());
        assert!(RuleCondition::volume(None, None).is_empty());
        assert!(!RuleCondition::volume(None, Some(dec!(1))).is_empty());
    }

    #[test]
    fn test_adjustment_defaults_multiplier_to_one() {
        let adjustment: PriceAdjustment = serde_json::from_value(json!({
            "discount": { "type": "percentage", "value": 10 }
        }))
        .unwrap();
        assert_eq!(adjustment.price_multiplier, Decimal::ONE);
        assert_eq!(adjustment.discount, Some(Discount::Percentage(dec!(10))));
    }

    #[test]
    fn test_validate_rejects_oversized_percentage() {
        let rule = PricingRule::new("Too generous", RuleCondition::customer(["vip"]))
            .with_adjustment(PriceAdjustment::percentage_discount(dec!(120)));
        assert!(rule.validate().is_err());
    }
}

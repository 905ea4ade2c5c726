//! Rule composition
//!
//! Composition works on unrounded decimals and keeps a running ledger of
//! per-service amounts plus an `extras` bucket for charges that belong to the
//! grand total rather than to one service (postal base price, flat surcharges,
//! flat discounts). The order is fixed:
//!
//! 1. base subtotals, `area × pricePerUnit` (zone base rate for unpriced services)
//! 2. postal tier: per-sq-ft price, base price, surcharge %, discount %
//! 3. zone: surcharge % on the running total, then per-service fees
//! 4. rules by priority desc, id asc: fixed unit prices, multiplier,
//!    flat surcharge, discount
//!
//! Percentages compound. Every step records its signed delta. Arithmetic is
//! checked; a step that leaves the decimal range fails the composition.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{checked_add, checked_mul, checked_sub, percent_of, MoneyError, Rate, RuleId};

use crate::resolver::ZoneResolution;
use crate::rule::{Discount, PricingRule, RuleCondition, RuleType};
use crate::scenario::{QuoteScenario, ServiceType};
use crate::zone::ZoneConfig;

/// Where a non-rule adjustment came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierSource {
    PostalTier,
    Zone,
}

/// A postal-tier or zone adjustment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierAdjustment {
    pub source: TierSource,
    pub label: String,
    pub amount: Decimal,
    /// Relative to the total just before this step
    pub percentage: Decimal,
}

/// The effect of one applied rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleImpact {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub rule_type: RuleType,
    /// `post − pre`; discounts are negative
    pub amount: Decimal,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedService {
    pub name: String,
    pub service_type: ServiceType,
    pub original: Decimal,
    pub adjusted: Decimal,
}

/// Unrounded composition result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPricing {
    pub services: Vec<ComposedService>,
    /// Sum of the services' base subtotals
    pub original_total: Decimal,
    /// Grand-total charges not attributed to a service
    pub extras: Decimal,
    pub total: Decimal,
    pub rule_impacts: Vec<RuleImpact>,
    pub tier_adjustments: Vec<TierAdjustment>,
    pub warnings: Vec<String>,
}

#[derive(Debug)]
struct Line {
    name: String,
    service_type: ServiceType,
    area: Decimal,
    original: Decimal,
    amount: Decimal,
}

#[derive(Debug)]
struct Ledger {
    lines: Vec<Line>,
    extras: Decimal,
}

impl Ledger {
    fn total(&self) -> Result<Decimal, MoneyError> {
        let lines = self
            .lines
            .iter()
            .try_fold(Decimal::ZERO, |sum, line| checked_add(sum, line.amount))?;
        checked_add(lines, self.extras)
    }

    fn scale_all(&mut self, factor: Decimal) -> Result<(), MoneyError> {
        for line in &mut self.lines {
            line.amount = checked_mul(line.amount, factor)?;
        }
        self.extras = checked_mul(self.extras, factor)?;
        Ok(())
    }

    fn scale_lines(&mut self, factor: Decimal, affected: impl Fn(ServiceType) -> bool) -> Result<(), MoneyError> {
        for line in self.lines.iter_mut().filter(|l| affected(l.service_type)) {
            line.amount = checked_mul(line.amount, factor)?;
        }
        Ok(())
    }
}

/// Signed change of one step and its share of the total before it
fn step(before: Decimal, after: Decimal) -> Result<(Decimal, Decimal), MoneyError> {
    let delta = checked_sub(after, before)?;
    Ok((delta, percent_of(delta, before)?))
}

/// Returns true if `rule` adjusts services of this type
fn affects(rule: &PricingRule, service_type: ServiceType) -> bool {
    match &rule.condition {
        RuleCondition::Service { service_types } => service_types.contains(&service_type),
        _ => true,
    }
}

pub struct RuleCompositor;

impl RuleCompositor {
    /// Orders matched rules by priority desc, then id asc
    pub fn order<'a>(matched: &[&'a PricingRule]) -> Vec<&'a PricingRule> {
        let mut ordered = matched.to_vec();
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
        ordered
    }

    /// Composes the price of a scenario from its matched rules
    ///
    /// # Errors
    ///
    /// `MoneyError::Overflow` when an amount leaves the decimal range
    pub fn compose(
        scenario: &QuoteScenario,
        matched: &[&PricingRule],
        resolution: &ZoneResolution,
        zone_config: Option<&ZoneConfig>,
    ) -> Result<ComposedPricing, MoneyError> {
        let ordered = Self::order(matched);
        let mut tier_adjustments = Vec::new();
        let mut warnings = Vec::new();

        let lines = scenario
            .services
            .iter()
            .map(|s| -> Result<Line, MoneyError> {
                let subtotal = s.subtotal()?;
                Ok(Line {
                    name: s.name.clone(),
                    service_type: s.service_type,
                    area: s.area,
                    original: subtotal,
                    amount: subtotal,
                })
            })
            .collect::<Result<Vec<_>, MoneyError>>()?;
        let mut ledger = Ledger {
            lines,
            extras: Decimal::ZERO,
        };
        let original_total = ledger.total()?;

        // Services priced by a rule's fixed unit price skip the postal per-sq-ft price
        let fixed_types: BTreeSet<ServiceType> = ordered
            .iter()
            .flat_map(|rule| {
                rule.adjustment
                    .fixed_unit_prices
                    .keys()
                    .copied()
                    .filter(move |t| affects(rule, *t))
            })
            .collect();

        let zone = resolution.zone.as_ref().zip(zone_config);

        if let Some((zone, config)) = zone {
            let before = ledger.total()?;
            let unit_price = config.base_unit_price();
            let mut repriced = false;
            for line in ledger.lines.iter_mut().filter(|l| l.original.is_zero() && !l.area.is_zero()) {
                line.amount = checked_mul(line.area, unit_price)?;
                repriced = true;
            }
            if repriced {
                let (amount, percentage) = step(before, ledger.total()?)?;
                tier_adjustments.push(TierAdjustment {
                    source: TierSource::Zone,
                    label: format!("zone {} base rate", zone.name),
                    amount,
                    percentage,
                });
            }
        }

        if let Some(postal) = &resolution.postal_rule {
            let before = ledger.total()?;
            if let Some(per_sq_ft) = postal.price_per_sq_ft {
                for line in ledger.lines.iter_mut().filter(|l| !fixed_types.contains(&l.service_type)) {
                    line.amount = checked_mul(line.area, per_sq_ft)?;
                }
            }
            ledger.extras = checked_add(ledger.extras, postal.base_price)?;
            if !postal.surcharge_percentage.is_zero() {
                ledger.scale_all(Rate::from_percentage(postal.surcharge_percentage).increase_factor())?;
            }
            if !postal.discount_percentage.is_zero() {
                ledger.scale_all(Rate::from_percentage(postal.discount_percentage).decrease_factor())?;
            }
            let (amount, percentage) = step(before, ledger.total()?)?;
            tier_adjustments.push(TierAdjustment {
                source: TierSource::PostalTier,
                label: format!("zip code {} pricing tier", postal.code),
                amount,
                percentage,
            });
        }

        if let Some((zone, config)) = zone {
            if !zone.surcharge_percentage.is_zero() {
                let before = ledger.total()?;
                ledger.scale_all(Rate::from_percentage(zone.surcharge_percentage).increase_factor())?;
                let (amount, percentage) = step(before, ledger.total()?)?;
                tier_adjustments.push(TierAdjustment {
                    source: TierSource::Zone,
                    label: format!("zone {} surcharge {}%", zone.name, zone.surcharge_percentage.normalize()),
                    amount,
                    percentage,
                });
            }

            for line in ledger.lines.iter_mut() {
                let Some(service_rule) = config.service_rule(line.service_type) else {
                    continue;
                };
                if !service_rule.available_in_zones.contains(&zone.zone_id) {
                    warnings.push(format!("{} is not offered in zone {}", line.name, zone.name));
                    continue;
                }
                if service_rule.additional_fee_percentage.is_zero() {
                    continue;
                }
                let before = line.amount;
                line.amount = checked_mul(
                    line.amount,
                    Rate::from_percentage(service_rule.additional_fee_percentage).increase_factor(),
                )?;
                let (amount, percentage) = step(before, line.amount)?;
                tier_adjustments.push(TierAdjustment {
                    source: TierSource::Zone,
                    label: format!(
                        "zone {} fee for {} {}%",
                        zone.name,
                        line.name,
                        service_rule.additional_fee_percentage.normalize()
                    ),
                    amount,
                    percentage,
                });
            }
        }

        let mut rule_impacts = Vec::with_capacity(ordered.len());
        for rule in &ordered {
            let before = ledger.total()?;
            apply_rule(&mut ledger, rule)?;
            let (amount, percentage) = step(before, ledger.total()?)?;
            rule_impacts.push(RuleImpact {
                rule_id: rule.id,
                rule_name: rule.name.clone(),
                rule_type: rule.rule_type(),
                amount,
                percentage,
            });
        }

        let total = ledger.total()?;
        Ok(ComposedPricing {
            services: ledger
                .lines
                .into_iter()
                .map(|l| ComposedService {
                    name: l.name,
                    service_type: l.service_type,
                    original: l.original,
                    adjusted: l.amount,
                })
                .collect(),
            original_total,
            extras: ledger.extras,
            total,
            rule_impacts,
            tier_adjustments,
            warnings,
        })
    }
}

fn apply_rule(ledger: &mut Ledger, rule: &PricingRule) -> Result<(), MoneyError> {
    let adjustment = &rule.adjustment;

    for line in ledger.lines.iter_mut().filter(|l| affects(rule, l.service_type)) {
        if let Some(price) = adjustment.fixed_unit_prices.get(&line.service_type) {
            line.amount = checked_mul(line.area, *price)?;
        }
    }

    if adjustment.price_multiplier != Decimal::ONE {
        ledger.scale_lines(adjustment.price_multiplier, |t| affects(rule, t))?;
    }

    if let Some(surcharge) = adjustment.surcharge {
        ledger.extras = checked_add(ledger.extras, surcharge)?;
    }

    match adjustment.discount {
        Some(Discount::Percentage(percent)) => {
            let factor = Rate::from_percentage(percent).decrease_factor();
            if rule.rule_type() == RuleType::Service {
                ledger.scale_lines(factor, |t| affects(rule, t))?;
            } else {
                ledger.scale_all(factor)?;
            }
        }
        Some(Discount::Flat(amount)) => {
            let available = ledger.total()?.max(Decimal::ZERO);
            ledger.extras = checked_sub(ledger.extras, amount.min(available))?;
        }
        None => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::PriceAdjustment;
    use crate::scenario::ServiceLine;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn scenario() -> QuoteScenario {
        QuoteScenario {
            postal_code: Some("90210".to_string()),
            country: None,
            customer_tags: vec!["vip".to_string()],
            total_area: dec!(5000),
            services: vec![
                ServiceLine::new("Lawn Treatment", ServiceType::LawnTreatment, dec!(3000), dec!(0.02)),
                ServiceLine::new("Driveway", ServiceType::DrivewayCleaning, dec!(1500), dec!(0.03)),
                ServiceLine::new("Sidewalk", ServiceType::SidewalkCleaning, dec!(500), dec!(0.025)),
            ],
            date: NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(),
            coordinates: None,
        }
    }

    fn no_zone() -> ZoneResolution {
        ZoneResolution {
            zone: None,
            postal_rule: None,
            serviceable: true,
            reason: None,
            drive_time_minutes: None,
            upstream_unavailable: false,
        }
    }

    #[test]
    fn test_order_by_priority_then_id() {
        let a = PricingRule::new("a", RuleCondition::customer(["vip"]))
            .with_id(RuleId::from_u128(2))
            .with_priority(1);
        let b = PricingRule::new("b", RuleCondition::customer(["vip"]))
            .with_id(RuleId::from_u128(1))
            .with_priority(1);
        let c = PricingRule::new("c", RuleCondition::customer(["vip"]))
            .with_id(RuleId::from_u128(0))
            .with_priority(0);
        let ordered = RuleCompositor::order(&[&c, &a, &b]);
        let names: Vec<_> = ordered.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_flat_discount_is_capped_at_total() {
        let rule = PricingRule::new("huge", RuleCondition::customer(["vip"]))
            .with_adjustment(PriceAdjustment::flat_discount(dec!(500)));
        let composed = RuleCompositor::compose(&scenario(), &[&rule], &no_zone(), None).unwrap();
        assert_eq!(composed.total, Decimal::ZERO);
        assert_eq!(composed.rule_impacts[0].amount, dec!(-117.50));
    }

    #[test]
    fn test_service_rule_discount_only_touches_matching_services() {
        let rule = PricingRule::new("driveway deal", RuleCondition::service([ServiceType::DrivewayCleaning]))
            .with_adjustment(PriceAdjustment::percentage_discount(dec!(20)));
        let composed = RuleCompositor::compose(&scenario(), &[&rule], &no_zone(), None).unwrap();
        assert_eq!(composed.services[1].adjusted, dec!(36));
        assert_eq!(composed.services[0].adjusted, dec!(60));
        assert_eq!(composed.total, dec!(108.50));
    }
}

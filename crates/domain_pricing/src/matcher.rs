//! Rule matching
//!
//! Every rule is tested independently against the scenario. Each rule ends up
//! either matched or rejected with a stable, human-readable reason, so
//! `matched + rejected` always accounts for the whole rule set.

use std::fmt::Write as _;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::RuleId;

use crate::rule::{PricingRule, RuleCondition, RuleType};
use crate::scenario::{normalize_postal_code, normalize_tag, QuoteScenario};

/// A rule that did not apply, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRule {
    pub rule_id: RuleId,
    pub name: String,
    pub rule_type: RuleType,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct MatchOutcome<'a> {
    pub matched: Vec<&'a PricingRule>,
    pub rejected: Vec<RejectedRule>,
}

pub struct RuleMatcher;

impl RuleMatcher {
    /// Splits `rules` into matched and rejected, preserving input order
    pub fn match_rules<'a>(scenario: &QuoteScenario, rules: &'a [PricingRule]) -> MatchOutcome<'a> {
        let mut outcome = MatchOutcome::default();
        for rule in rules {
            match Self::check(scenario, rule) {
                Ok(()) => outcome.matched.push(rule),
                Err(reason) => outcome.rejected.push(RejectedRule {
                    rule_id: rule.id,
                    name: rule.name.clone(),
                    rule_type: rule.rule_type(),
                    reason,
                }),
            }
        }
        outcome
    }

    /// Tests a single rule; `Err` carries the rejection reason
    pub fn check(scenario: &QuoteScenario, rule: &PricingRule) -> Result<(), String> {
        if !rule.is_active {
            return Err("rule inactive".to_string());
        }
        if let Some(range) = &rule.date_range {
            if !range.contains(scenario.date) {
                return Err("outside date range".to_string());
            }
        }
        check_condition(scenario, &rule.condition)
    }
}

fn check_condition(scenario: &QuoteScenario, condition: &RuleCondition) -> Result<(), String> {
    match condition {
        RuleCondition::Zone { postal_codes } => {
            if postal_codes.is_empty() {
                return Err("rule has no zip code conditions".to_string());
            }
            let Some(code) = scenario.normalized_postal_code() else {
                return Err("scenario has no zip code".to_string());
            };
            if postal_codes.iter().any(|c| normalize_postal_code(c) == code) {
                Ok(())
            } else {
                Err(format!("zip code {} not in rule's list", code))
            }
        }
        RuleCondition::Customer { tags } => {
            if tags.is_empty() {
                return Err("rule has no customer tag conditions".to_string());
            }
            let scenario_tags = scenario.normalized_tags();
            if tags.iter().any(|t| scenario_tags.contains(&normalize_tag(t))) {
                Ok(())
            } else {
                Err("customer tags do not overlap".to_string())
            }
        }
        RuleCondition::Service { service_types } => {
            if service_types.is_empty() {
                return Err("rule has no service type conditions".to_string());
            }
            if scenario.services.iter().any(|s| service_types.contains(&s.service_type)) {
                Ok(())
            } else {
                Err("no scenario service matches rule's service types".to_string())
            }
        }
        RuleCondition::Volume { min_area, max_area } => {
            if min_area.is_none() && max_area.is_none() {
                return Err("rule has no area conditions".to_string());
            }
            let area = scenario.total_area;
            let above_min = min_area.map_or(true, |min| area >= min);
            let below_max = max_area.map_or(true, |max| area <= max);
            if above_min && below_max {
                Ok(())
            } else {
                Err(format!(
                    "area {} outside {}",
                    display_decimal(area),
                    display_interval(*min_area, *max_area)
                ))
            }
        }
    }
}

/// Renders an inclusive interval, open ends as infinity: `[8000, ∞)`
fn display_interval(min: Option<Decimal>, max: Option<Decimal>) -> String {
    let mut out = String::new();
    match min {
        Some(min) => {
            let _ = write!(out, "[{}", display_decimal(min));
        }
        None => out.push_str("(-∞"),
    }
    out.push_str(", ");
    match max {
        Some(max) => {
            let _ = write!(out, "{}]", display_decimal(max));
        }
        None => out.push_str("∞)"),
    }
    out
}

fn display_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_interval_rendering() {
        assert_eq!(display_interval(Some(dec!(8000)), None), "[8000, ∞)");
        assert_eq!(display_interval(None, Some(dec!(2500.50))), "(-∞, 2500.5]");
        assert_eq!(display_interval(Some(dec!(1000.00)), Some(dec!(2000))), "[1000, 2000]");
    }
}

//! Property-Based Test Generators
//!
//! Proptest strategies for scenarios, rules and postal tiers. Generated
//! values satisfy the validation rules of the domain types, so every
//! generated scenario can be evaluated.

use chrono::NaiveDate;
use core_kernel::{DateRange, RuleId};
use domain_pricing::{
    Discount, PostalPricingRule, PriceAdjustment, PricingRule, QuoteScenario, RuleCondition,
    ServiceLine, ServiceType,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

const POSTAL_CODES: [&str; 4] = ["90210", "90211", "10001", "60601"];
const TAGS: [&str; 4] = ["vip", "premium", "new", "commercial"];

/// Strategy for service types
pub fn service_type_strategy() -> impl Strategy<Value = ServiceType> {
    prop::sample::select(ServiceType::ALL.to_vec())
}

/// Strategy for areas up to 20,000 sq ft with one decimal place
pub fn area_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..200_000i64).prop_map(|n| Decimal::new(n, 1))
}

/// Strategy for unit prices between $0.000 and $0.200
pub fn unit_price_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..200i64).prop_map(|n| Decimal::new(n, 3))
}

/// Strategy for percentages from 0% to 100% in 0.5 steps
pub fn percentage_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=200i64).prop_map(|n| Decimal::new(n * 5, 1))
}

/// Strategy for dollar amounts up to $500.00
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..50_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for service lines
pub fn service_line_strategy() -> impl Strategy<Value = ServiceLine> {
    (service_type_strategy(), area_strategy(), unit_price_strategy()).prop_map(
        |(service_type, area, price)| {
            ServiceLine::new(service_type.code(), service_type, area, price)
        },
    )
}

/// Strategy for dates within 2024
pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (1u32..=366u32).prop_map(|ordinal| {
        NaiveDate::from_yo_opt(2024, ordinal).unwrap_or(NaiveDate::MIN)
    })
}

/// Strategy for valid scenarios with one to four services
pub fn scenario_strategy() -> impl Strategy<Value = QuoteScenario> {
    (
        prop::option::of(prop::sample::select(POSTAL_CODES.to_vec())),
        prop::sample::subsequence(TAGS.to_vec(), 0..=2),
        area_strategy(),
        prop::collection::vec(service_line_strategy(), 1..=4),
        date_strategy(),
    )
        .prop_map(|(postal_code, tags, total_area, services, date)| QuoteScenario {
            postal_code: postal_code.map(str::to_string),
            country: None,
            customer_tags: tags.into_iter().map(str::to_string).collect(),
            total_area,
            services,
            date,
            coordinates: None,
        })
}

/// Strategy for non-empty conditions of every rule type
pub fn condition_strategy() -> impl Strategy<Value = RuleCondition> {
    prop_oneof![
        prop::sample::subsequence(POSTAL_CODES.to_vec(), 1..=2).prop_map(RuleCondition::zone),
        prop::sample::subsequence(TAGS.to_vec(), 1..=2).prop_map(RuleCondition::customer),
        prop::collection::btree_set(service_type_strategy(), 1..=2).prop_map(RuleCondition::service),
        (prop::option::of(area_strategy()), prop::option::of(area_strategy()))
            .prop_filter("volume needs a bound", |(min, max)| min.is_some() || max.is_some())
            .prop_map(|(min, max)| match (min, max) {
                (Some(a), Some(b)) if a > b => RuleCondition::volume(Some(b), Some(a)),
                (min, max) => RuleCondition::volume(min, max),
            }),
    ]
}

/// Strategy for discounts
pub fn discount_strategy() -> impl Strategy<Value = Discount> {
    prop_oneof![
        percentage_strategy().prop_map(Discount::Percentage),
        amount_strategy().prop_map(Discount::Flat),
    ]
}

/// Strategy for valid adjustments: multiplier 0.5 to 1.5 plus optional
/// surcharge, discount and fixed unit price
pub fn adjustment_strategy() -> impl Strategy<Value = PriceAdjustment> {
    (
        (50i64..=150i64).prop_map(|n| Decimal::new(n, 2)),
        prop::option::of(amount_strategy()),
        prop::option::of(discount_strategy()),
        prop::option::of((service_type_strategy(), unit_price_strategy())),
    )
        .prop_map(|(multiplier, surcharge, discount, fixed)| {
            let mut adjustment = PriceAdjustment::multiplier(multiplier);
            adjustment.surcharge = surcharge;
            adjustment.discount = discount;
            if let Some((service_type, price)) = fixed {
                adjustment = adjustment.with_fixed_unit_price(service_type, price);
            }
            adjustment
        })
}

/// Strategy for active rules without charge bounds or date ranges
pub fn rule_strategy() -> impl Strategy<Value = PricingRule> {
    (
        any::<u128>(),
        condition_strategy(),
        adjustment_strategy(),
        -5i32..=5i32,
    )
        .prop_map(|(id, condition, adjustment, priority)| {
            PricingRule::new(format!("Rule {:x}", id & 0xffff), condition)
                .with_id(RuleId::from_u128(id))
                .with_adjustment(adjustment)
                .with_priority(priority)
        })
}

/// Strategy for rules that may be inactive or limited to part of 2024
pub fn any_rule_strategy() -> impl Strategy<Value = PricingRule> {
    (rule_strategy(), any::<bool>(), prop::option::of((date_strategy(), 0u64..120u64)))
        .prop_map(|(mut rule, active, window)| {
            rule.is_active = active;
            if let Some((start, days)) = window {
                let end = start + chrono::Days::new(days);
                if let Ok(range) = DateRange::bounded(start, end) {
                    rule.date_range = Some(range);
                }
            }
            rule
        })
}

/// Strategy for rule sets with unique ids
pub fn rules_strategy(max: usize) -> impl Strategy<Value = Vec<PricingRule>> {
    prop::collection::vec(any_rule_strategy(), 0..=max).prop_map(|mut rules| {
        rules.sort_by_key(|r| r.id);
        rules.dedup_by_key(|r| r.id);
        rules
    })
}

/// Strategy for postal tiers on the generated postal codes
pub fn postal_tier_strategy() -> impl Strategy<Value = PostalPricingRule> {
    (
        prop::sample::select(POSTAL_CODES.to_vec()),
        amount_strategy(),
        prop::option::of(unit_price_strategy()),
        percentage_strategy(),
        percentage_strategy(),
    )
        .prop_map(|(code, base, per_sq_ft, surcharge, discount)| {
            let mut tier = PostalPricingRule::new(code, "US");
            tier.base_price = base;
            tier.price_per_sq_ft = per_sq_ft;
            tier.surcharge_percentage = surcharge;
            tier.discount_percentage = discount;
            tier
        })
}

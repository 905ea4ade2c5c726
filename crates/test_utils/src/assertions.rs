//! Custom Test Assertions
//!
//! Assertion helpers for evaluation results that give more meaningful
//! failure messages than a bare `assert!`.

use core_kernel::RuleId;
use domain_pricing::EvaluationResult;
use rust_decimal::Decimal;

/// Asserts that two decimals are numerically equal, ignoring scale
pub fn assert_decimal_eq(actual: Decimal, expected: Decimal) {
    assert!(
        actual.normalize() == expected.normalize(),
        "Decimal mismatch: actual={}, expected={}",
        actual,
        expected
    );
}

/// Asserts that no reported amount is negative
pub fn assert_non_negative(result: &EvaluationResult) {
    assert!(
        result.adjusted_total >= Decimal::ZERO,
        "Adjusted total is negative: {}",
        result.adjusted_total
    );
    for service in &result.adjusted_services {
        assert!(
            service.adjusted_total >= Decimal::ZERO,
            "Service {} has negative adjusted total {}",
            service.name,
            service.adjusted_total
        );
    }
}

/// Asserts that the trace accounts for every rule exactly once and that
/// the headline figures agree with each other
///
/// # Arguments
///
/// * `result` - The evaluation result
/// * `rule_count` - Number of rules in the snapshot the result came from
pub fn assert_explainability_complete(result: &EvaluationResult, rule_count: usize) {
    if result.zone_resolved.serviceable {
        assert_eq!(
            result.applied_rules.len() + result.unapplied_rules.len(),
            rule_count,
            "Applied ({}) and unapplied ({}) rules must cover all {} rules",
            result.applied_rules.len(),
            result.unapplied_rules.len(),
            rule_count
        );
    }

    let mut seen: Vec<RuleId> = result.applied_rule_ids();
    seen.extend(result.unapplied_rules.iter().map(|r| r.rule_id));
    let total = seen.len();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), total, "A rule appears more than once in the trace");

    for rule in &result.unapplied_rules {
        assert!(!rule.reason.is_empty(), "Rule {} rejected without a reason", rule.name);
    }

    assert_eq!(
        result.total_adjustment,
        result.adjusted_total - result.original_total,
        "Total adjustment does not equal adjusted minus original"
    );
}

/// Asserts that a rule is among the applied rules
pub fn assert_rule_applied(result: &EvaluationResult, rule_id: RuleId) {
    assert!(
        result.applied_rules.iter().any(|r| r.rule_id == rule_id),
        "Expected rule {} to be applied; applied: {:?}",
        rule_id,
        result.applied_rules.iter().map(|r| &r.rule_name).collect::<Vec<_>>()
    );
}

/// Asserts that a rule was rejected with exactly the given reason
pub fn assert_rule_rejected_with(result: &EvaluationResult, rule_id: RuleId, reason: &str) {
    let rejected = result
        .unapplied_rules
        .iter()
        .find(|r| r.rule_id == rule_id)
        .unwrap_or_else(|| panic!("Expected rule {} to be rejected", rule_id));
    assert_eq!(rejected.reason, reason, "Unexpected rejection reason for {}", rejected.name);
}

/// Asserts that a warning containing `fragment` was reported
pub fn assert_warning_contains(result: &EvaluationResult, fragment: &str) {
    assert!(
        result.warnings.iter().any(|w| w.contains(fragment)),
        "No warning contains {:?}; warnings: {:?}",
        fragment,
        result.warnings
    );
}

//! Tests for strongly-typed identifiers

use core_kernel::{BusinessId, RuleId, ZoneId};
use uuid::Uuid;

#[test]
fn test_display_carries_prefix() {
    assert!(BusinessId::new().to_string().starts_with("BIZ-"));
    assert!(ZoneId::new().to_string().starts_with("ZONE-"));
    assert_eq!(RuleId::prefix(), "RULE");
}

#[test]
fn test_parse_accepts_bare_uuid() {
    let uuid = Uuid::new_v4();
    let id: RuleId = uuid.to_string().parse().unwrap();
    assert_eq!(*id.as_uuid(), uuid);
}

#[test]
fn test_parse_rejects_garbage() {
    assert!("RULE-not-a-uuid".parse::<RuleId>().is_err());
}

#[test]
fn test_v7_ids_are_time_ordered() {
    let first = RuleId::new_v7();
    let second = RuleId::new_v7();
    assert!(first <= second);
}

#[test]
fn test_serde_is_transparent() {
    let id = ZoneId::from_u128(7);
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{}\"", id.as_uuid()));
}

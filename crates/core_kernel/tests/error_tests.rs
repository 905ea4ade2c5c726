//! Tests for core_kernel error types

use chrono::NaiveDate;
use core_kernel::{CoreError, DateRange, MoneyError, TemporalError};

#[test]
fn test_core_error_validation() {
    let error = CoreError::validation("area must not be negative");

    match error {
        CoreError::Validation(msg) => assert_eq!(msg, "area must not be negative"),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_core_error_from_money_error() {
    let money_error = MoneyError::UnknownCurrency("XYZ".to_string());
    let core_error: CoreError = money_error.into();

    assert!(matches!(core_error, CoreError::Money(_)));
    assert!(core_error.to_string().contains("XYZ"));
}

#[test]
fn test_core_error_from_temporal_error() {
    let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let err = DateRange::bounded(start, end).unwrap_err();
    assert!(matches!(err, TemporalError::InvalidRange { .. }));

    let core_error: CoreError = err.into();
    assert!(core_error.to_string().contains("2024-06-01"));
}

#[test]
fn test_core_error_configuration() {
    let error = CoreError::configuration("zone config missing shop location");
    assert!(error.to_string().starts_with("Configuration error"));
}

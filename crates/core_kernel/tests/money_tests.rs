//! Unit tests for the Money module
//!
//! Tests cover money creation, compounding, signed formatting, rates and the
//! boundary parsing of numeric form fields.

use core_kernel::{checked_mul, parse_decimal, percent_of, Currency, Money, MoneyError, Rate};
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_creates_money_with_correct_amount() {
        let m = Money::new(dec!(117.50), Currency::USD);
        assert_eq!(m.amount(), dec!(117.50));
        assert_eq!(m.currency(), Currency::USD);
    }

    #[test]
    fn test_new_keeps_full_precision() {
        let m = Money::new(dec!(0.0125), Currency::USD);
        assert_eq!(m.amount(), dec!(0.0125));
    }

    #[test]
    fn test_zero_creates_zero_amount() {
        let m = Money::zero(Currency::CAD);
        assert!(m.is_zero());
        assert!(!m.is_positive());
        assert!(!m.is_negative());
        assert_eq!(m.currency(), Currency::CAD);
    }
}

mod rounding {
    use super::*;

    #[test]
    fn test_round_to_currency_uses_bankers_rounding() {
        assert_eq!(Money::new(dec!(0.125), Currency::USD).round_to_currency().amount(), dec!(0.12));
        assert_eq!(Money::new(dec!(0.135), Currency::USD).round_to_currency().amount(), dec!(0.14));
    }

    #[test]
    fn test_display_rounds_and_pads() {
        assert_eq!(Money::new(dec!(105.75), Currency::USD).to_string(), "$105.75");
        assert_eq!(Money::new(dec!(45), Currency::USD).to_string(), "$45.00");
        assert_eq!(Money::new(dec!(12.5), Currency::EUR).to_string(), "€12.50");
    }

    #[test]
    fn test_format_signed() {
        assert_eq!(Money::new(dec!(-11.75), Currency::USD).format_signed(), "-$11.75");
        assert_eq!(Money::new(dec!(11.75), Currency::USD).format_signed(), "+$11.75");
        assert_eq!(Money::new(dec!(0.001), Currency::USD).format_signed(), "$0.00");
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_multiply_compounds_without_rounding() {
        let up = checked_mul(dec!(117.50), dec!(1.10)).unwrap();
        let amount = checked_mul(up, dec!(0.90)).unwrap();
        assert_eq!(amount, dec!(116.325));
        assert_eq!(Money::new(amount, Currency::USD).round_to_currency().amount(), dec!(116.32));
    }

    /// Amounts beyond the decimal range fail instead of panicking
    #[test]
    fn test_multiply_overflow_is_an_error() {
        assert_eq!(checked_mul(dec!(100000000000000000000), dec!(10000000000)), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_percent_of_tiny_base_overflows() {
        assert_eq!(percent_of(dec!(1000000000000000000000000000), dec!(0.001)), Err(MoneyError::Overflow));
        assert_eq!(percent_of(dec!(15), dec!(150)), Ok(dec!(10)));
    }
}

mod rates {
    use super::*;

    #[test]
    fn test_rate_from_percentage() {
        let rate = Rate::from_percentage(dec!(10));
        assert_eq!(rate.as_decimal(), dec!(0.10));
        assert_eq!(rate.as_percentage(), dec!(10));
        assert_eq!(rate.to_string(), "10%");
    }

    #[test]
    fn test_rate_factors() {
        let rate = Rate::from_percentage(dec!(12.5));
        assert_eq!(rate.increase_factor(), dec!(1.125));
        assert_eq!(rate.decrease_factor(), dec!(0.875));
    }
}

mod currency {
    use super::*;

    #[test]
    fn test_currency_parsing_is_case_insensitive() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::USD);
        assert_eq!(" Aud ".parse::<Currency>().unwrap(), Currency::AUD);
    }

    #[test]
    fn test_unknown_currency_rejected() {
        assert!(matches!(
            "XYZ".parse::<Currency>(),
            Err(MoneyError::UnknownCurrency(_))
        ));
    }

    #[test]
    fn test_default_currency_is_usd() {
        assert_eq!(Currency::default(), Currency::USD);
    }
}

mod boundary_parsing {
    use super::*;

    #[test]
    fn test_parse_plain_and_formatted_numbers() {
        assert_eq!(parse_decimal("pricePerUnit", "0.02").unwrap(), dec!(0.02));
        assert_eq!(parse_decimal("area", "1,500").unwrap(), dec!(1500));
        assert_eq!(parse_decimal("basePrice", "$25").unwrap(), dec!(25));
        assert_eq!(parse_decimal("area", "1e3").unwrap(), dec!(1000));
    }

    #[test]
    fn test_parse_reports_the_field() {
        let err = parse_decimal("pricePerUnit", "abc").unwrap_err();
        assert!(err.to_string().contains("pricePerUnit"));
    }
}

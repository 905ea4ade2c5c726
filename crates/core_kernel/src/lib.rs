//! Core Kernel - Foundational types for the property-service pricing engine
//!
//! This crate provides the building blocks shared by every other crate:
//! - Money and Rate types with precise decimal arithmetic
//! - Boundary parsing of numeric form fields
//! - Strongly-typed identifiers
//! - Inclusive date ranges for rule validity windows
//! - Port abstractions for the hexagonal architecture

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::{
    Money, Currency, MoneyError, Rate, parse_decimal,
    checked_add, checked_sub, checked_mul, percent_of,
};
pub use temporal::{DateRange, TemporalError};
pub use identifiers::{BusinessId, RuleId, ZoneId};
pub use error::CoreError;
pub use ports::{
    PortError, DomainPort, CircuitBreakerConfig,
    AdapterHealth, HealthCheckResult, HealthCheckable,
};

//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! pricing engine test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built scenarios, rules, zones and postal tiers
//! - `builders`: Scenario builder and a mock-backed engine builder
//! - `database`: Database test helpers and container management
//! - `assertions`: Custom assertion helpers for evaluation results
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;

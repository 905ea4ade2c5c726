//! Stores for pricing data
//!
//! Each store owns the SQL for one group of tables and returns plain row
//! types. Turning rows into domain values happens in [`crate::adapters`].
//!
//! Queries are built at runtime with `sqlx::query_as` and `FromRow`, so the
//! crate compiles without a live database.

pub mod businesses;
pub mod rules;
pub mod zones;
pub mod postal;

pub use businesses::BusinessStore;
pub use rules::{NewPricingRule, PricingRuleRow, RuleKind, RuleStore};
pub use zones::{ServiceZoneRow, ZoneConfigRow, ZoneServiceRuleRow, ZoneStore};
pub use postal::{PostalPricingRow, PostalStore};

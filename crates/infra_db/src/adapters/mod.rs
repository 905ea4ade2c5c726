//! Domain Adapters
//!
//! PostgreSQL implementations of the pricing domain's ports. Each adapter
//! wraps a store from [`crate::repositories`], converts rows into domain
//! values and validates them, so malformed records surface as
//! `PortError::Transformation` instead of reaching the engine.
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::{PostgresRuleAdapter, PostgresZoneAdapter, PostgresPostalAdapter};
//! use domain_pricing::SnapshotLoader;
//! use std::sync::Arc;
//!
//! let loader = SnapshotLoader::new(
//!     Arc::new(PostgresRuleAdapter::new(pool.clone())),
//!     Arc::new(PostgresZoneAdapter::new(pool.clone())),
//!     Arc::new(PostgresPostalAdapter::new(pool)),
//! );
//! ```

pub mod rules;
pub mod zones;
pub mod postal;
pub mod usage;

pub use rules::PostgresRuleAdapter;
pub use zones::PostgresZoneAdapter;
pub use postal::PostgresPostalAdapter;
pub use usage::PostgresUsageRecorder;

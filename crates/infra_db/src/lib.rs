//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the pricing engine using SQLx: connection
//! pooling, embedded migrations, and adapters implementing the
//! `domain_pricing` repository and usage ports.
//!
//! # Architecture
//!
//! Stores in [`repositories`] own the SQL and return row types. Adapters in
//! [`adapters`] convert rows to domain values, validate them, and translate
//! [`DatabaseError`] into `PortError` at the port boundary.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresRuleAdapter};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/pricing")).await?;
//! run_migrations(&pool).await?;
//! let rules = PostgresRuleAdapter::new(pool.clone());
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabaseHealth, DatabasePool};
pub use error::DatabaseError;
pub use repositories::BusinessStore;
pub use adapters::{PostgresPostalAdapter, PostgresRuleAdapter, PostgresUsageRecorder, PostgresZoneAdapter};

//! External Adapters for the Pricing Domain
//!
//! - **HttpDistanceService**: drive-time lookups against a routing API
//!
//! Repository adapters live in `infra_db`.

pub mod drive_time;

pub use drive_time::{DriveTimeConfig, HttpDistanceService};

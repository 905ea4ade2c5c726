//! Request and response bodies
//!
//! Field names are camelCase. Amounts are accepted as JSON strings or
//! numbers and always returned as strings.

pub mod evaluate;
pub mod snapshot;

pub use evaluate::{CoordinatesRequest, EvaluateRequest, ServiceLineRequest};
pub use snapshot::{RuleSummary, SnapshotResponse, ZoneSummary};

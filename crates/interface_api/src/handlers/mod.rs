//! Request handlers

pub mod evaluate;
pub mod snapshot;
pub mod health;

use core_kernel::BusinessId;

use crate::error::ApiError;

/// Parses the `:business_id` path segment
pub(crate) fn parse_business_id(raw: &str) -> Result<BusinessId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("'{}' is not a valid business id", raw)))
}

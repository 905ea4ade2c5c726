//! Pricing domain errors
//!
//! Only malformed input and infrastructure failures are errors. Business
//! outcomes such as an unserviceable address, a degraded drive-time lookup or
//! misconfigured charge bounds are reported on the evaluation result instead.

use thiserror::Error;

use core_kernel::{BusinessId, CoreError, MoneyError, PortError};

/// Errors that can occur while evaluating a quote scenario
#[derive(Debug, Error)]
pub enum PricingError {
    /// The scenario was rejected before evaluation
    #[error("Validation error on {field}: {message}")]
    Validation {
        field: String,
        message: String,
    },

    /// No snapshot could be loaded for the business
    #[error("Pricing data unavailable for business {business_id}: {source}")]
    SnapshotUnavailable {
        business_id: BusinessId,
        #[source]
        source: PortError,
    },

    /// A repository call failed
    #[error("Repository error: {0}")]
    Repository(#[from] PortError),
}

impl PricingError {
    /// Creates a validation error for a scenario field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PricingError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns true if retrying later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            PricingError::Validation { .. } => false,
            PricingError::SnapshotUnavailable { source, .. } => source.is_transient(),
            PricingError::Repository(source) => source.is_transient(),
        }
    }
}

/// Arithmetic that leaves the decimal range is reported against the
/// scenario's services rather than aborting the evaluation
impl From<MoneyError> for PricingError {
    fn from(err: MoneyError) -> Self {
        match err {
            MoneyError::InvalidAmount { field, reason } => PricingError::validation(field, reason),
            MoneyError::Overflow => {
                PricingError::validation("services", "price calculation exceeds the supported range")
            }
            other => PricingError::validation("currency", other.to_string()),
        }
    }
}

/// Malformed rule, zone or postal records found at the persistence boundary
#[derive(Debug, Error)]
pub enum RuleDefinitionError {
    #[error("Invalid rule {rule}: {message}")]
    InvalidRule {
        rule: String,
        message: String,
    },

    #[error("Invalid zone configuration: {0}")]
    InvalidZoneConfig(String),

    #[error("Invalid postal pricing record {code}: {message}")]
    InvalidPostalRule {
        code: String,
        message: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl RuleDefinitionError {
    pub fn rule(rule: impl std::fmt::Display, message: impl Into<String>) -> Self {
        RuleDefinitionError::InvalidRule {
            rule: rule.to_string(),
            message: message.into(),
        }
    }

    pub fn postal(code: impl Into<String>, message: impl Into<String>) -> Self {
        RuleDefinitionError::InvalidPostalRule {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<RuleDefinitionError> for PortError {
    fn from(err: RuleDefinitionError) -> Self {
        PortError::transformation(err.to_string())
    }
}

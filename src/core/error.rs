//! Error taxonomy for the rate and accrual core.

use crate::core::asset::AssetSymbol;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by conversion, accrual and the refresh path.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No rate for the symbol in the table.
    #[error("Rate not available for {0}")]
    RateUnavailable(AssetSymbol),

    /// The upstream provider did not answer within the refresh timeout.
    #[error("Upstream rate provider timed out after {0:?}")]
    UpstreamTimeout(Duration),

    /// The upstream provider failed or returned an incomplete result.
    #[error("Upstream rate provider error: {0}")]
    UpstreamError(String),

    /// Negative, non-finite or unparsable amount.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Malformed subscription terms or an illegal status transition.
    #[error("Invalid subscription: {0}")]
    InvalidSubscription(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

//! Core rate, conversion and accrual logic

pub mod accrual;
pub mod asset;
pub mod cache;
pub mod clock;
pub mod config;
pub mod conversion;
pub mod error;
pub mod format;
pub mod log;
pub mod provider;
pub mod rates;

// Re-export main types for cleaner imports
pub use accrual::{Plan, Subscription, SubscriptionStatus};
pub use asset::{AssetClass, AssetSymbol};
pub use cache::{CacheStatus, RateCache, RefreshOutcome, RefreshPolicy, SharedRateCache};
pub use error::{CoreError, CoreResult};
pub use provider::{RateProvider, RateStore};
pub use rates::{Quote, RateSnapshot, RateTable};

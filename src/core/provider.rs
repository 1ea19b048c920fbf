//! Seams to the upstream rate source and the durable rate store

use crate::core::asset::AssetSymbol;
use crate::core::rates::{Quote, RateTable};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait RateProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fetches quotes for all `symbols` as one batch. Implementations return
    /// either every requested symbol or an error.
    async fn fetch_rates(&self, symbols: &[AssetSymbol]) -> Result<HashMap<AssetSymbol, Quote>>;
}

/// Persists the last known good table across restarts.
#[async_trait]
pub trait RateStore: Send + Sync {
    async fn load_last_known(&self) -> Result<Option<RateTable>>;

    async fn save(&self, table: &RateTable) -> Result<()>;
}

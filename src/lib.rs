pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::accrual::Subscription;
use crate::core::asset::AssetSymbol;
use crate::core::cache::{RateCache, RefreshOutcome, SharedRateCache};
use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub enum AppCommand {
    Rates,
    Convert {
        amount: Decimal,
        from: AssetSymbol,
        to: AssetSymbol,
    },
    Plans,
    Project {
        plan: String,
        amount: Decimal,
    },
    Subscription {
        amount: Decimal,
        apy_percent: Decimal,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Rates => {
            let cache = build_cache(&config).await?;
            refresh_rates(&cache).await;
            cli::rates::run(&cache, &config.currency);
            Ok(())
        }
        AppCommand::Convert { amount, from, to } => {
            let cache = build_cache(&config).await?;
            refresh_rates(&cache).await;
            if cache.is_stale() {
                warn!("Converting with stale rates");
            }
            cli::convert::run(amount, from, to, &cache.table(), &config.currency)
        }
        AppCommand::Plans => {
            cli::plans::run(&config.plans, &config.currency);
            Ok(())
        }
        AppCommand::Project { plan, amount } => {
            let plan = config
                .find_plan(&plan)
                .with_context(|| format!("No plan named '{plan}'"))?;
            cli::plans::run_projection(plan, amount, &config.currency)
        }
        AppCommand::Subscription {
            amount,
            apy_percent,
            start,
            end,
        } => {
            let subscription = Subscription::new(amount, apy_percent, start, end)?;
            cli::subscription::run(&subscription, &config.currency)
        }
    }
}

/// Wires provider, store and cache for `config`, seeding from the last
/// persisted table when there is one.
pub async fn build_cache(config: &AppConfig) -> Result<SharedRateCache> {
    let provider = providers::build_provider(config)?;
    let store = store::open_rate_store(config);
    let cache = Arc::new(RateCache::new(provider, store, config.rates.policy()));

    if cache.seed_from_store().await {
        debug!(last_fetch = %cache.last_fetch(), "Seeded rates from store");
    }
    Ok(cache)
}

/// Waits for a refresh when the table is due. Failures leave the previous
/// table in place and are only logged.
async fn refresh_rates(cache: &SharedRateCache) {
    let Some(handle) = cache.refresh_if_due() else {
        debug!("Rates are fresh, skipping refresh");
        return;
    };

    let pb = cli::ui::new_spinner(&format!("Fetching rates from {}", cache.provider_name()));
    match handle.await {
        Ok(RefreshOutcome::Updated { last_fetch }) => info!(%last_fetch, "Rates updated"),
        Ok(RefreshOutcome::Failed(e)) => warn!(error = %e, "Rate refresh failed, serving previous rates"),
        Ok(RefreshOutcome::Discarded { fetched_at }) => debug!(%fetched_at, "Discarded older rates"),
        Err(e) => warn!(error = %e, "Rate refresh task aborted"),
    }
    pb.finish_and_clear();
}

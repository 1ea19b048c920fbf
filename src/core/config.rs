use crate::core::accrual::Plan;
use crate::core::cache::RefreshPolicy;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RatesConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    #[serde(default = "default_refresh_timeout_secs")]
    pub refresh_timeout_secs: u64,
    /// First backoff after a failed refresh, doubled per failure up to the TTL.
    #[serde(default = "default_retry_after_secs")]
    pub retry_after_secs: u64,
}

fn default_ttl_secs() -> u64 {
    60
}

fn default_stale_after_secs() -> u64 {
    300
}

fn default_refresh_timeout_secs() -> u64 {
    5
}

fn default_retry_after_secs() -> u64 {
    5
}

impl Default for RatesConfig {
    fn default() -> Self {
        RatesConfig {
            ttl_secs: default_ttl_secs(),
            stale_after_secs: default_stale_after_secs(),
            refresh_timeout_secs: default_refresh_timeout_secs(),
            retry_after_secs: default_retry_after_secs(),
        }
    }
}

impl RatesConfig {
    pub fn policy(&self) -> RefreshPolicy {
        RefreshPolicy {
            ttl: secs(self.ttl_secs),
            stale_after: secs(self.stale_after_secs),
            timeout: std::time::Duration::from_secs(self.refresh_timeout_secs),
            retry_after: secs(self.retry_after_secs),
        }
    }
}

fn secs(value: u64) -> chrono::Duration {
    let seconds = i64::try_from(value).unwrap_or(i64::MAX).min(i64::MAX / 1_000);
    chrono::Duration::seconds(seconds)
}

/// Which upstream rate source to use.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProviderConfig {
    Live {
        base_url: String,
        api_key: Option<String>,
    },
    Simulated {
        seed: Option<u64>,
    },
    Fallback,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Simulated { seed: None }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Reference currency every price is quoted in.
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub rates: RatesConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Keep the last known rates on disk across restarts.
    #[serde(default = "default_persist")]
    pub persist: bool,
    pub data_path: Option<String>,
    #[serde(default = "default_plans")]
    pub plans: Vec<Plan>,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_persist() -> bool {
    true
}

fn plan(id: &str, name: &str, apy: Decimal, days: u32, min: i64, max: i64) -> Plan {
    Plan {
        id: id.to_string(),
        name: name.to_string(),
        apy_percent: apy,
        duration_days: days,
        min_amount: Decimal::from(min),
        max_amount: Some(Decimal::from(max)),
    }
}

pub fn default_plans() -> Vec<Plan> {
    vec![
        plan("starter", "Starter", Decimal::new(85, 1), 30, 100, 5_000),
        plan("growth", "Growth", Decimal::new(125, 1), 90, 1_000, 25_000),
        plan("premium", "Premium", Decimal::new(150, 1), 180, 5_000, 100_000),
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            currency: default_currency(),
            rates: RatesConfig::default(),
            provider: ProviderConfig::default(),
            persist: default_persist(),
            data_path: None,
            plans: default_plans(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "coinyield", "coinyield")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "coinyield", "coinyield")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn find_plan(&self, key: &str) -> Option<&Plan> {
        self.plans
            .iter()
            .find(|p| p.id.eq_ignore_ascii_case(key) || p.name.eq_ignore_ascii_case(key))
    }
}

pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use crate::core::provider::RateStore;
use disk::DiskRateStore;
use memory::MemoryRateStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Picks the durable store for `config`. A disk store that cannot be opened
/// degrades to an in-memory one; the cache works either way.
pub fn open_rate_store(config: &AppConfig) -> Arc<dyn RateStore> {
    if !config.persist {
        debug!("Rate persistence disabled");
        return Arc::new(MemoryRateStore::new());
    }

    let opened = config
        .default_data_path()
        .and_then(|path| DiskRateStore::open(&path.join("cache")));
    match opened {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(error = %e, "Falling back to in-memory rate store");
            Arc::new(MemoryRateStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rates::RateTable;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_rate_store_uses_data_path() {
        let dir = tempdir().unwrap();
        let config = AppConfig {
            data_path: Some(dir.path().to_string_lossy().into_owned()),
            ..AppConfig::default()
        };

        let store = open_rate_store(&config);
        store.save(&RateTable::fallback()).await.unwrap();

        assert!(dir.path().join("cache").exists());
    }

    #[tokio::test]
    async fn test_open_rate_store_without_persistence() {
        let config = AppConfig {
            persist: false,
            ..AppConfig::default()
        };

        let store = open_rate_store(&config);
        assert!(store.load_last_known().await.unwrap().is_none());
    }
}

use crate::core::provider::RateStore;
use crate::core::rates::RateTable;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const PARTITION: &str = "rates";
const LAST_KNOWN_KEY: &str = "last_known";

/// Rate table persisted in a fjall keyspace as JSON.
pub struct DiskRateStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskRateStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create store directory: {}", path.display()))?;

        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open rate store at {}", path.display()))?;
        let partition = keyspace
            .open_partition(PARTITION, PartitionCreateOptions::default())
            .context("Failed to open rates partition")?;

        Ok(Self {
            keyspace,
            partition,
        })
    }
}

#[async_trait]
impl RateStore for DiskRateStore {
    async fn load_last_known(&self) -> Result<Option<RateTable>> {
        let Some(value) = self
            .partition
            .get(LAST_KNOWN_KEY)
            .context("Failed to read stored rate table")?
        else {
            debug!("Disk store MISS");
            return Ok(None);
        };

        let table: RateTable =
            serde_json::from_slice(&value).context("Stored rate table is corrupt")?;
        debug!(last_fetch = %table.last_fetch(), "Disk store HIT");
        Ok(Some(table))
    }

    async fn save(&self, table: &RateTable) -> Result<()> {
        let value = serde_json::to_vec(table)?;
        self.partition
            .insert(LAST_KNOWN_KEY, value)
            .context("Failed to write rate table")?;
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("Failed to flush rate store")?;
        debug!(last_fetch = %table.last_fetch(), "Disk store SAVE");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::asset::AssetSymbol;
    use crate::core::rates::Quote;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn table() -> RateTable {
        let quotes: HashMap<AssetSymbol, Quote> = AssetSymbol::ALL
            .iter()
            .map(|s| {
                (
                    *s,
                    Quote {
                        price: dec!(2650.50),
                        change_24h: dec!(-1.25),
                    },
                )
            })
            .collect();
        RateTable::from_quotes(&quotes, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
            .unwrap()
    }

    #[tokio::test]
    async fn test_disk_store_empty() {
        let dir = tempdir().unwrap();
        let store = DiskRateStore::open(dir.path()).unwrap();

        assert!(store.load_last_known().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disk_store_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = DiskRateStore::open(dir.path()).unwrap();
            store.save(&table()).await.unwrap();
        }

        let reopened = DiskRateStore::open(dir.path()).unwrap();
        assert_eq!(reopened.load_last_known().await.unwrap(), Some(table()));
    }

    #[tokio::test]
    async fn test_disk_store_rejects_corrupt_record() {
        let dir = tempdir().unwrap();
        let store = DiskRateStore::open(dir.path()).unwrap();
        store
            .partition
            .insert(
                LAST_KNOWN_KEY,
                br#"{"rates": [], "last_fetch": "2024-01-01T00:00:00Z"}"#.as_slice(),
            )
            .unwrap();

        assert!(store.load_last_known().await.is_err());
    }
}

use crate::core::provider::RateStore;
use crate::core::rates::RateTable;
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

/// Keeps the last saved table for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct MemoryRateStore {
    table: Mutex<Option<RateTable>>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: RateTable) -> Self {
        Self {
            table: Mutex::new(Some(table)),
        }
    }
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn load_last_known(&self) -> Result<Option<RateTable>> {
        let table = self.table.lock().clone();
        debug!(found = table.is_some(), "Memory store LOAD");
        Ok(table)
    }

    async fn save(&self, table: &RateTable) -> Result<()> {
        *self.table.lock() = Some(table.clone());
        debug!(last_fetch = %table.last_fetch(), "Memory store SAVE");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_load_save() {
        let store = MemoryRateStore::new();

        // Initially, store is empty
        assert!(store.load_last_known().await.unwrap().is_none());

        let table = RateTable::fallback();
        store.save(&table).await.unwrap();

        assert_eq!(store.load_last_known().await.unwrap(), Some(table));
    }
}

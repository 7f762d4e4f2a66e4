use crate::core::error::StoreError;
use crate::core::store::{PRICES_KEY, UploadPair, UploadStore, WEIGHTS_KEY};
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const PARTITION: &str = "uploads";

/// Persists the last upload in a fjall keyspace so it survives restarts.
pub struct DiskUploadStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskUploadStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path)?;

        let keyspace = Config::new(path).open()?;
        let partition = keyspace.open_partition(PARTITION, PartitionCreateOptions::default())?;
        debug!("Opened upload store at {}", path.display());
        Ok(Self {
            keyspace,
            partition,
        })
    }
}

#[async_trait]
impl UploadStore for DiskUploadStore {
    async fn save(&self, pair: &UploadPair) -> Result<(), StoreError> {
        let mut batch = self.keyspace.batch();
        batch.insert(&self.partition, WEIGHTS_KEY, pair.weights.as_slice());
        batch.insert(&self.partition, PRICES_KEY, pair.prices.as_slice());
        batch.commit()?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!(
            weights_bytes = pair.weights.len(),
            prices_bytes = pair.prices.len(),
            "Upload PUT (disk)"
        );
        Ok(())
    }

    async fn load(&self) -> Result<Option<UploadPair>, StoreError> {
        let weights = self.partition.get(WEIGHTS_KEY)?;
        let prices = self.partition.get(PRICES_KEY)?;
        match (weights, prices) {
            (Some(weights), Some(prices)) => {
                debug!("Upload HIT (disk)");
                Ok(Some(UploadPair {
                    weights: weights.to_vec(),
                    prices: prices.to_vec(),
                }))
            }
            _ => {
                debug!("Upload MISS (disk)");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn pair(weights: &str, prices: &str) -> UploadPair {
        UploadPair {
            weights: weights.as_bytes().to_vec(),
            prices: prices.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn test_disk_store_empty() {
        let dir = tempdir().unwrap();
        let store = DiskUploadStore::open(dir.path()).unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disk_store_save_load() {
        let dir = tempdir().unwrap();
        let store = DiskUploadStore::open(dir.path()).unwrap();

        let first = pair("name,weight\nA,1\n", "DATE,A\n2026-01-01,1\n");
        store.save(&first).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(first));

        let second = pair("name,weight\nB,2\n", "DATE,B\n2026-01-02,2\n");
        store.save(&second).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_disk_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let saved = pair("name,weight\nA,1\n", "DATE,A\n2026-01-01,1\n");
        {
            let store = DiskUploadStore::open(dir.path()).unwrap();
            store.save(&saved).await.unwrap();
        }

        let reopened = DiskUploadStore::open(dir.path()).unwrap();
        assert_eq!(reopened.load().await.unwrap(), Some(saved));
    }
}

use crate::core::error::StoreError;
use crate::core::store::{UploadPair, UploadStore};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Keeps the last upload in process memory only.
#[derive(Clone, Default)]
pub struct MemoryUploadStore {
    inner: Arc<Mutex<Option<UploadPair>>>,
}

impl MemoryUploadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UploadStore for MemoryUploadStore {
    async fn save(&self, pair: &UploadPair) -> Result<(), StoreError> {
        let mut slot = self.inner.lock().await;
        debug!(
            weights_bytes = pair.weights.len(),
            prices_bytes = pair.prices.len(),
            "Upload PUT (memory)"
        );
        *slot = Some(pair.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<UploadPair>, StoreError> {
        Ok(self.inner.lock().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_save_load() {
        let store = MemoryUploadStore::new();

        // Initially, nothing is stored
        assert!(store.load().await.unwrap().is_none());

        let pair = UploadPair {
            weights: b"name,weight\nA,1\n".to_vec(),
            prices: b"DATE,A\n2026-01-01,1\n".to_vec(),
        };
        store.save(&pair).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(pair));

        // A second save overwrites wholesale
        let newer = UploadPair {
            weights: b"name,weight\nB,1\n".to_vec(),
            prices: b"DATE,B\n2026-01-02,2\n".to_vec(),
        };
        store.save(&newer).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(newer));
    }
}

pub mod disk;
pub mod memory;

use crate::core::error::StoreError;
use crate::core::store::{UploadPair, UploadStore};
use crate::core::table::Snapshot;
use disk::DiskUploadStore;
use memory::MemoryUploadStore;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Holds the current upload snapshot.
///
/// Readers clone the `Arc` and keep working on that snapshot no matter what happens after.
/// An upload is persisted first and then installed with a single pointer swap, so a reader
/// sees either the old pair or the new pair, never a mix.
pub struct TabularStore {
    current: RwLock<Option<Arc<Snapshot>>>,
    backend: Arc<dyn UploadStore>,
    // Serializes uploads so the persisted pair and the installed snapshot agree.
    write_lock: Mutex<()>,
}

impl TabularStore {
    /// Opens the store and installs whatever upload the backend still has.
    pub async fn open(backend: Arc<dyn UploadStore>) -> Result<Self, StoreError> {
        let current = match backend.load().await? {
            Some(pair) => match Snapshot::parse(&pair.weights, &pair.prices) {
                Ok(snapshot) => {
                    info!(
                        holdings = snapshot.weights.height(),
                        price_rows = snapshot.prices.height(),
                        "Restored last upload"
                    );
                    Some(Arc::new(snapshot))
                }
                Err(e) => {
                    warn!(error = %e, "Ignoring unreadable stored upload");
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            current: RwLock::new(current),
            backend,
            write_lock: Mutex::new(()),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            current: RwLock::new(None),
            backend: Arc::new(MemoryUploadStore::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Opens a fjall-backed store under `path`.
    pub async fn on_disk(path: &Path) -> Result<Self, StoreError> {
        let backend = DiskUploadStore::open(path)?;
        Self::open(Arc::new(backend)).await
    }

    /// The snapshot in effect right now, if any upload happened.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.current.read().clone()
    }

    /// Parses, persists and installs a new upload. Nothing changes if any step fails.
    pub async fn replace(&self, pair: UploadPair) -> Result<Arc<Snapshot>, StoreError> {
        let snapshot = Arc::new(Snapshot::parse(&pair.weights, &pair.prices)?);

        let _guard = self.write_lock.lock().await;
        self.backend.save(&pair).await?;
        *self.current.write() = Some(Arc::clone(&snapshot));

        info!(
            holdings = snapshot.weights.height(),
            price_rows = snapshot.prices.height(),
            "Installed new upload"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::DataError;
    use tempfile::tempdir;

    fn pair(weights: &str, prices: &str) -> UploadPair {
        UploadPair {
            weights: weights.as_bytes().to_vec(),
            prices: prices.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn test_empty_store_has_no_snapshot() {
        let store = TabularStore::in_memory();
        assert!(store.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_replace_swaps_whole_snapshot() {
        let store = TabularStore::in_memory();
        store
            .replace(pair("name,weight\nA,1\n", "DATE,A\n2026-01-01,1\n"))
            .await
            .unwrap();
        let before = store.snapshot().unwrap();

        store
            .replace(pair("name,weight\nB,1\n", "DATE,B\n2026-01-02,2\n"))
            .await
            .unwrap();
        let after = store.snapshot().unwrap();

        // A reader holding the old snapshot keeps a consistent old pair
        assert_eq!(before.weights.rows()[0][0], "A");
        assert_eq!(before.prices.headers()[1], "A");
        assert_eq!(after.weights.rows()[0][0], "B");
        assert_eq!(after.prices.headers()[1], "B");
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_previous_snapshot() {
        let store = TabularStore::in_memory();
        store
            .replace(pair("name,weight\nA,1\n", "DATE,A\n2026-01-01,1\n"))
            .await
            .unwrap();

        let err = store
            .replace(pair("name,weight\nB,1\n", "DATE,B\n2026-01-02,2,3\n"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Data(DataError::Csv { table: "prices", .. })
        ));
        assert_eq!(store.snapshot().unwrap().weights.rows()[0][0], "A");
    }

    #[tokio::test]
    async fn test_disk_store_restores_last_upload() {
        let dir = tempdir().unwrap();
        {
            let store = TabularStore::on_disk(dir.path()).await.unwrap();
            assert!(store.snapshot().is_none());
            store
                .replace(pair("name,weight\nA,0.5\n", "DATE,A\n2026-01-01,4\n"))
                .await
                .unwrap();
        }

        let reopened = TabularStore::on_disk(dir.path()).await.unwrap();
        let snapshot = reopened.snapshot().unwrap();
        assert_eq!(snapshot.weights.rows()[0], vec!["A", "0.5"]);
    }

    #[tokio::test]
    async fn test_unreadable_stored_upload_is_ignored() {
        let backend = Arc::new(MemoryUploadStore::new());
        backend
            .save(&pair("name,weight\nA,1\n", "DATE,A\n1,2,3\n"))
            .await
            .unwrap();

        let store = TabularStore::open(backend).await.unwrap();
        assert!(store.snapshot().is_none());
    }
}

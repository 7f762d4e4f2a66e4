//! Storage seam for the raw upload payloads.

use crate::core::error::StoreError;
use async_trait::async_trait;

pub const WEIGHTS_KEY: &str = "weights";
pub const PRICES_KEY: &str = "prices";

/// The two CSV payloads of one upload, stored and loaded as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPair {
    pub weights: Vec<u8>,
    pub prices: Vec<u8>,
}

#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Replaces the stored pair. Both payloads become visible together or not at all.
    async fn save(&self, pair: &UploadPair) -> Result<(), StoreError>;

    /// Returns the stored pair, or `None` if nothing complete was ever saved.
    async fn load(&self) -> Result<Option<UploadPair>, StoreError>;
}

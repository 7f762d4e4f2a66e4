//! Core data model, preparation and query logic

pub mod config;
pub mod error;
pub mod format;
pub mod log;
pub mod prepare;
pub mod query;
pub mod store;
pub mod table;

// Re-export main types for cleaner imports
pub use error::{DataError, StoreError};
pub use query::QueryOutcome;
pub use store::{UploadPair, UploadStore};
pub use table::{CsvTable, Snapshot};

//! Error types shared by the data pipeline and the upload stores

use thiserror::Error;

/// Problems found while reading or preparing the uploaded tables.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Could not read {table} CSV: {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("Missing column '{column}' in {table} table")]
    MissingColumn { table: &'static str, column: String },

    #[error("Invalid date '{value}' in row {row} of prices table")]
    InvalidDate { row: usize, value: String },

    #[error("Invalid number '{value}' in column '{column}', row {row} of {table} table")]
    InvalidNumber {
        table: &'static str,
        column: String,
        row: usize,
        value: String,
    },
}

/// Failures of the upload store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Backend(#[from] fjall::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored data is unreadable: {0}")]
    Data(#[from] DataError),
}

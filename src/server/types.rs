//! Request parameters, response bodies and the API error type

use crate::core::error::{DataError, StoreError};
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Files uploaded and processed successfully";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Error body, `{"detail": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PriceChangeParams {
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TopHoldingsParams {
    pub n: Option<i64>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("File '{0}' is not a CSV. Both files must be .csv format.")]
    NotCsv(String),

    #[error("File '{file_name}' could not be read as CSV: {reason}")]
    UnreadableCsv { file_name: String, reason: String },

    #[error("Missing form field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid upload request: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Stored data is malformed: {0}")]
    Data(#[from] DataError),

    #[error("Failed to store upload: {0}")]
    Storage(StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotCsv(_) | ApiError::UnreadableCsv { .. } => StatusCode::BAD_REQUEST,
            ApiError::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Multipart(e) => e.status(),
            ApiError::Data(_) | ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        let body = ErrorDetail {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::NotCsv("a.txt".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::MissingField("prices_file").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        let data = DataError::InvalidDate {
            row: 1,
            value: "x".into(),
        };
        assert_eq!(
            ApiError::from(data).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_csv_message_names_the_file() {
        assert_eq!(
            ApiError::NotCsv("test.txt".into()).to_string(),
            "File 'test.txt' is not a CSV. Both files must be .csv format."
        );
    }
}

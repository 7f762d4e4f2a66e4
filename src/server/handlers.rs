//! HTTP endpoint handlers
//!
//! Every query handler takes one snapshot up front and runs the query on it, so an upload
//! finishing mid-request cannot mix old and new tables in a response.

use crate::core::error::{DataError, StoreError};
use crate::core::format::{
    CompositionEntry, HistoryRecord, PerformancePoint, PriceChangeEntry, TopHolding,
};
use crate::core::query::{self, DEFAULT_TOP_N};
use crate::core::store::UploadPair;
use crate::core::table::{PRICES_TABLE, WEIGHTS_TABLE};
use crate::server::AppState;
use crate::server::types::*;
use axum::{
    Json,
    extract::{Multipart, Query, State},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const WEIGHTS_FIELD: &str = "weights_file";
pub const PRICES_FIELD: &str = "prices_file";

/// Health check endpoint - GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

struct UploadedFile {
    file_name: String,
    bytes: Vec<u8>,
}

impl UploadedFile {
    fn is_csv(&self) -> bool {
        self.file_name.to_lowercase().ends_with(".csv")
    }
}

/// Upload endpoint - POST /api/upload-process
///
/// Expects multipart fields `weights_file` and `prices_file`. The pair is only stored once
/// both are present, named `.csv`, and readable as CSV.
pub async fn upload_process(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut weights = None;
    let mut prices = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let file_name = field.file_name().unwrap_or_default().to_string();

        match name.as_str() {
            WEIGHTS_FIELD => {
                let bytes = field.bytes().await?.to_vec();
                weights = Some(UploadedFile { file_name, bytes });
            }
            PRICES_FIELD => {
                let bytes = field.bytes().await?.to_vec();
                prices = Some(UploadedFile { file_name, bytes });
            }
            other => debug!(field = other, "Ignoring unexpected form field"),
        }
    }

    let weights = weights.ok_or(ApiError::MissingField(WEIGHTS_FIELD))?;
    let prices = prices.ok_or(ApiError::MissingField(PRICES_FIELD))?;

    for file in [&weights, &prices] {
        if !file.is_csv() {
            warn!(file_name = %file.file_name, "Rejected non-CSV upload");
            return Err(ApiError::NotCsv(file.file_name.clone()));
        }
    }

    info!(
        weights_file = %weights.file_name,
        prices_file = %prices.file_name,
        "Received upload"
    );

    let pair = UploadPair {
        weights: weights.bytes,
        prices: prices.bytes,
    };
    match state.store.replace(pair).await {
        Ok(_) => Ok(Json(MessageResponse {
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
        })),
        Err(StoreError::Data(DataError::Csv { table, source })) => {
            let file_name = match table {
                WEIGHTS_TABLE => weights.file_name,
                PRICES_TABLE => prices.file_name,
                _ => table.to_string(),
            };
            Err(ApiError::UnreadableCsv {
                file_name,
                reason: source.to_string(),
            })
        }
        Err(e) => Err(ApiError::Storage(e)),
    }
}

/// GET /api/performance
pub async fn performance(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PerformancePoint>>, ApiError> {
    let snapshot = state.store.snapshot();
    Ok(Json(query::performance(snapshot.as_deref())?.into_rows()))
}

/// GET /api/composition
pub async fn composition(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CompositionEntry>>, ApiError> {
    let snapshot = state.store.snapshot();
    Ok(Json(query::composition(snapshot.as_deref())?.into_rows()))
}

/// GET /api/holding-price-change?date=YYYY-MM-DD
pub async fn holding_price_change(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PriceChangeParams>,
) -> Json<Vec<PriceChangeEntry>> {
    let snapshot = state.store.snapshot();
    let outcome = query::holding_price_change(snapshot.as_deref(), params.date.as_deref());
    Json(outcome.into_rows())
}

/// GET /api/top-holdings?n=5
pub async fn top_holdings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopHoldingsParams>,
) -> Json<Vec<TopHolding>> {
    let snapshot = state.store.snapshot();
    let n = params.n.unwrap_or(DEFAULT_TOP_N);
    Json(query::top_holdings(snapshot.as_deref(), n).into_rows())
}

/// GET /api/full-price-history
pub async fn full_price_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<HistoryRecord>>, ApiError> {
    let snapshot = state.store.snapshot();
    Ok(Json(query::full_price_history(snapshot.as_deref())?.into_rows()))
}

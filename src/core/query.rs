//! Read-only views over the prepared tables.
//!
//! Every query prepares the snapshot it is handed, so a caller that takes one snapshot per
//! request always sees a consistent weights/prices pair. Performance, composition and full
//! history propagate preparation faults. Price change and top holdings degrade to an empty
//! result instead and log the reason.

use crate::core::error::DataError;
use crate::core::format::{
    CompositionEntry, HISTORY_DATE_FIELD, HistoryRecord, PerformancePoint, PriceChangeEntry,
    TopHolding, format_date, round3,
};
use crate::core::prepare::{Prepared, prepare};
use crate::core::table::Snapshot;
use serde_json::{Map, Value};
use tracing::warn;

pub const DEFAULT_TOP_N: i64 = 5;
pub const AGGREGATE_COLUMN: &str = "aggregate_value";

/// Result of a query, keeping apart the reasons a caller may end up with no rows.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome<T> {
    Rows(Vec<T>),
    /// No upload yet (or an upload with no price rows).
    NoData,
    /// A fail-soft query hit a fault; the message is what got logged.
    Degraded(String),
}

impl<T> QueryOutcome<T> {
    pub fn rows(&self) -> &[T] {
        match self {
            QueryOutcome::Rows(rows) => rows.as_slice(),
            QueryOutcome::NoData | QueryOutcome::Degraded(_) => &[],
        }
    }

    pub fn into_rows(self) -> Vec<T> {
        match self {
            QueryOutcome::Rows(rows) => rows,
            QueryOutcome::NoData | QueryOutcome::Degraded(_) => Vec::new(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, QueryOutcome::Degraded(_))
    }
}

fn with_prepared<T>(
    snapshot: Option<&Snapshot>,
    f: impl FnOnce(&Prepared) -> Vec<T>,
) -> Result<QueryOutcome<T>, DataError> {
    Ok(match prepare(snapshot)? {
        Some(prepared) => QueryOutcome::Rows(f(&prepared)),
        None => QueryOutcome::NoData,
    })
}

fn degrade_on_fault<T>(
    query: &str,
    result: Result<QueryOutcome<T>, DataError>,
) -> QueryOutcome<T> {
    result.unwrap_or_else(|e| {
        warn!(query, error = %e, "Query failed, returning empty result");
        QueryOutcome::Degraded(e.to_string())
    })
}

/// Aggregate value per price row, oldest first.
pub fn performance(
    snapshot: Option<&Snapshot>,
) -> Result<QueryOutcome<PerformancePoint>, DataError> {
    with_prepared(snapshot, |prepared| {
        prepared
            .prices
            .rows()
            .iter()
            .map(|row| PerformancePoint {
                date: format_date(row.date),
                value: round3(row.aggregate_value),
            })
            .collect()
    })
}

/// Each holding with its price in the latest row, in weights-table order.
pub fn composition(
    snapshot: Option<&Snapshot>,
) -> Result<QueryOutcome<CompositionEntry>, DataError> {
    with_prepared(snapshot, |prepared| {
        prepared
            .weights
            .iter()
            .map(|entry| CompositionEntry {
                name: entry.name.clone(),
                weight: entry.weight,
                extra: entry.extra.clone(),
                latest_price: round3(latest_price(prepared, &entry.name)),
            })
            .collect()
    })
}

/// Day-over-day change per holding at `date`, or at the latest row when `date` is absent or
/// unknown. The earliest row is compared with itself.
pub fn holding_price_change(
    snapshot: Option<&Snapshot>,
    date: Option<&str>,
) -> QueryOutcome<PriceChangeEntry> {
    let result = with_prepared(snapshot, |prepared| {
        let prices = &prepared.prices;
        let last = prices.len() - 1;
        let current_idx = date.and_then(|d| prices.position_of(d)).unwrap_or(last);
        let prev_idx = current_idx.saturating_sub(1);

        prepared
            .weights
            .iter()
            .map(|entry| {
                let current = prices.price(current_idx, &entry.name).unwrap_or(0.0);
                let previous = prices.price(prev_idx, &entry.name).unwrap_or(0.0);
                PriceChangeEntry {
                    name: entry.name.clone(),
                    weight: entry.weight,
                    extra: entry.extra.clone(),
                    increased: current >= previous,
                    change_amount: round3(current - previous),
                    historical_price: round3(current),
                }
            })
            .collect()
    });
    degrade_on_fault("holding_price_change", result)
}

/// The `n` largest holdings by `weight * latest price`. Ties keep weights-table order.
pub fn top_holdings(snapshot: Option<&Snapshot>, n: i64) -> QueryOutcome<TopHolding> {
    let result = with_prepared(snapshot, |prepared| {
        let Ok(n) = usize::try_from(n) else {
            return Vec::new();
        };

        let mut holdings: Vec<TopHolding> = prepared
            .weights
            .iter()
            .map(|entry| TopHolding {
                name: entry.name.clone(),
                weight: entry.weight,
                extra: entry.extra.clone(),
                holding_value: round3(entry.weight * latest_price(prepared, &entry.name)),
            })
            .collect();

        holdings.sort_by(|a, b| b.holding_value.total_cmp(&a.holding_value));
        holdings.truncate(n);
        holdings
    });
    degrade_on_fault("top_holdings", result)
}

/// Every prepared price row with its ticker columns and the aggregate, oldest first.
pub fn full_price_history(
    snapshot: Option<&Snapshot>,
) -> Result<QueryOutcome<HistoryRecord>, DataError> {
    with_prepared(snapshot, |prepared| {
        let tickers = prepared.prices.tickers();
        prepared
            .prices
            .rows()
            .iter()
            .map(|row| {
                let mut columns: Map<String, Value> = tickers
                    .iter()
                    .zip(&row.prices)
                    .filter(|(ticker, _)| ticker.as_str() != HISTORY_DATE_FIELD)
                    .map(|(ticker, price)| (ticker.clone(), Value::from(*price)))
                    .collect();
                // Overwrites a ticker column of the same name
                columns.insert(
                    AGGREGATE_COLUMN.to_string(),
                    Value::from(row.aggregate_value),
                );
                HistoryRecord {
                    date: format_date(row.date),
                    columns,
                }
            })
            .collect()
    })
}

fn latest_price(prepared: &Prepared, ticker: &str) -> f64 {
    prepared
        .prices
        .last_index()
        .and_then(|last| prepared.prices.price(last, ticker))
        .unwrap_or(0.0)
}

//! Turns a raw upload snapshot into typed, date-sorted tables with the aggregate column.

use crate::core::error::DataError;
use crate::core::format::{ExtraFields, HOLDING_FIELDS, format_date, round3};
use crate::core::table::{CsvTable, PRICES_TABLE, Snapshot, WEIGHTS_TABLE};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub const DATE_COLUMN: &str = "DATE";
pub const NAME_COLUMN: &str = "name";
pub const WEIGHT_COLUMN: &str = "weight";

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// One holding from the weights table, weight rounded for output.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightEntry {
    pub name: String,
    pub weight: f64,
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub date: NaiveDate,
    /// Aligned with [`PreparedPrices::tickers`]. `None` for a non-numeric cell in a column
    /// no weight refers to.
    pub prices: Vec<Option<f64>>,
    pub aggregate_value: f64,
}

/// Prices sorted ascending by date, ties in upload order.
#[derive(Debug, Clone)]
pub struct PreparedPrices {
    tickers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<PriceRow>,
}

impl PreparedPrices {
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn rows(&self) -> &[PriceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.rows.len().checked_sub(1)
    }

    /// Price of `ticker` in row `row`, or `None` when the ticker has no column or no number there.
    pub fn price(&self, row: usize, ticker: &str) -> Option<f64> {
        let column = *self.index.get(ticker)?;
        self.rows.get(row).and_then(|r| r.prices.get(column).copied().flatten())
    }

    /// Index of the first row whose formatted date equals `date`.
    pub fn position_of(&self, date: &str) -> Option<usize> {
        self.rows.iter().position(|r| format_date(r.date) == date)
    }
}

#[derive(Debug, Clone)]
pub struct Prepared {
    pub prices: PreparedPrices,
    pub weights: Vec<WeightEntry>,
}

/// Prepares both tables. `Ok(None)` is the no-data state: no upload yet, or a prices
/// table without rows.
pub fn prepare(snapshot: Option<&Snapshot>) -> Result<Option<Prepared>, DataError> {
    let Some(snapshot) = snapshot else {
        return Ok(None);
    };

    let (weights, weight_map) = prepare_weights(&snapshot.weights)?;
    let prices = prepare_prices(&snapshot.prices, &weight_map)?;
    if prices.is_empty() {
        debug!("Prices table has no rows, treating as no data");
        return Ok(None);
    }

    debug!(
        rows = prices.len(),
        tickers = prices.tickers.len(),
        holdings = weights.len(),
        "Prepared snapshot"
    );
    Ok(Some(Prepared { prices, weights }))
}

/// Unrounded weights by ticker, last occurrence wins, in first-occurrence order.
struct WeightMap {
    order: Vec<String>,
    weights: HashMap<String, f64>,
}

fn prepare_weights(table: &CsvTable) -> Result<(Vec<WeightEntry>, WeightMap), DataError> {
    let name_idx = require_column(WEIGHTS_TABLE, NAME_COLUMN, table.column_index(NAME_COLUMN))?;
    let weight_idx =
        require_column(WEIGHTS_TABLE, WEIGHT_COLUMN, table.column_index(WEIGHT_COLUMN))?;

    let mut entries = Vec::with_capacity(table.height());
    let mut map = WeightMap {
        order: Vec::new(),
        weights: HashMap::new(),
    };

    for (row_idx, row) in table.rows().iter().enumerate() {
        let name = row[name_idx].clone();
        let weight = parse_number(&row[weight_idx], WEIGHTS_TABLE, WEIGHT_COLUMN, row_idx)?;

        let extra = table
            .headers()
            .iter()
            .enumerate()
            .filter(|(i, header)| {
                *i != name_idx && *i != weight_idx && !HOLDING_FIELDS.contains(&header.as_str())
            })
            .map(|(i, header)| (header.clone(), extra_value(&row[i])))
            .collect();

        if map.weights.insert(name.clone(), weight).is_none() {
            map.order.push(name.clone());
        }
        entries.push(WeightEntry {
            name,
            weight: round3(weight),
            extra,
        });
    }

    Ok((entries, map))
}

fn prepare_prices(table: &CsvTable, weights: &WeightMap) -> Result<PreparedPrices, DataError> {
    let date_idx = require_column(
        PRICES_TABLE,
        DATE_COLUMN,
        table.column_index_ignore_case(DATE_COLUMN),
    )?;

    let columns: Vec<usize> = (0..table.headers().len()).filter(|i| *i != date_idx).collect();
    let tickers: Vec<String> = columns.iter().map(|i| table.headers()[*i].clone()).collect();

    let mut index = HashMap::new();
    for (pos, ticker) in tickers.iter().enumerate() {
        index.entry(ticker.clone()).or_insert(pos);
    }

    // (column, weight) pairs that feed the aggregate
    let contributors: Vec<(usize, f64)> = weights
        .order
        .iter()
        .filter_map(|name| Some((*index.get(name)?, weights.weights[name])))
        .collect();

    // Only weighted columns must be numeric; the rest are carried when they parse
    let strict: HashSet<usize> = contributors.iter().map(|(column, _)| *column).collect();

    let mut rows = Vec::with_capacity(table.height());
    for (row_idx, row) in table.rows().iter().enumerate() {
        let raw_date = &row[date_idx];
        let date = parse_date(raw_date).ok_or_else(|| DataError::InvalidDate {
            row: row_idx + 1,
            value: raw_date.clone(),
        })?;

        let raw_prices = columns
            .iter()
            .enumerate()
            .map(|(pos, i)| {
                let cell = &row[*i];
                if strict.contains(&pos) {
                    parse_number(cell, PRICES_TABLE, &table.headers()[*i], row_idx).map(Some)
                } else {
                    Ok(lenient_number(cell))
                }
            })
            .collect::<Result<Vec<Option<f64>>, DataError>>()?;

        let aggregate_value: f64 = contributors
            .iter()
            .map(|(column, weight)| weight * raw_prices[*column].unwrap_or(0.0))
            .sum();

        rows.push(PriceRow {
            date,
            prices: raw_prices.into_iter().map(|p| p.map(round3)).collect(),
            aggregate_value: round3(aggregate_value),
        });
    }

    rows.sort_by_key(|r| r.date);

    Ok(PreparedPrices {
        tickers,
        index,
        rows,
    })
}

fn require_column(
    table: &'static str,
    column: &str,
    found: Option<usize>,
) -> Result<usize, DataError> {
    found.ok_or_else(|| DataError::MissingColumn {
        table,
        column: column.to_string(),
    })
}

fn parse_number(
    cell: &str,
    table: &'static str,
    column: &str,
    row_idx: usize,
) -> Result<f64, DataError> {
    cell.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DataError::InvalidNumber {
            table,
            column: column.to_string(),
            row: row_idx + 1,
            value: cell.to_string(),
        })
}

fn lenient_number(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn extra_value(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    match lenient_number(cell) {
        Some(v) => Value::from(round3(v)),
        None => Value::String(cell.to_string()),
    }
}

/// Parses the date spellings seen in price exports; any time part is dropped.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

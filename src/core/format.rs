//! Output records and the rounding/date rules they share.
//!
//! Every record is flat: typed fields first, then any extra weight columns flattened in.
//! Numbers leave this module rounded to three decimals and dates as `YYYY-MM-DD`.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Rounds to three decimal places, half away from zero. Never returns `-0.0`.
pub fn round3(value: f64) -> f64 {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 { 0.0 } else { rounded }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Additional weight-table columns carried through to holding records.
pub type ExtraFields = Map<String, Value>;

/// Keys the holding records write themselves. Extra columns with these names are dropped.
pub const HOLDING_FIELDS: [&str; 7] = [
    "name",
    "weight",
    "latest_price",
    "increased",
    "change_amount",
    "historical_price",
    "holding_value",
];

/// Key of the date field in history records. A ticker column with this name is dropped.
pub const HISTORY_DATE_FIELD: &str = "date";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformancePoint {
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionEntry {
    pub name: String,
    pub weight: f64,
    #[serde(flatten)]
    pub extra: ExtraFields,
    pub latest_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceChangeEntry {
    pub name: String,
    pub weight: f64,
    #[serde(flatten)]
    pub extra: ExtraFields,
    pub increased: bool,
    pub change_amount: f64,
    pub historical_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopHolding {
    pub name: String,
    pub weight: f64,
    #[serde(flatten)]
    pub extra: ExtraFields,
    pub holding_value: f64,
}

/// One prices row with every ticker column and the aggregate, keyed by column name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub date: String,
    #[serde(flatten)]
    pub columns: Map<String, Value>,
}

impl HistoryRecord {
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns.get(column).and_then(Value::as_f64)
    }
}

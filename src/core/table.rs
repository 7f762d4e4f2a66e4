//! Raw tabular data as uploaded: headers plus string cells.

use crate::core::error::DataError;

pub const WEIGHTS_TABLE: &str = "weights";
pub const PRICES_TABLE: &str = "prices";

/// A rectangular CSV table. Cells stay untyped until preparation.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Parses a CSV payload with a header row. Ragged rows are rejected.
    pub fn from_bytes(table: &'static str, bytes: &[u8]) -> Result<Self, DataError> {
        let csv_error = |source| DataError::Csv { table, source };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn column_index_ignore_case(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }
}

/// The pair of tables from one upload. Immutable once built; replaced wholesale.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub weights: CsvTable,
    pub prices: CsvTable,
}

impl Snapshot {
    pub fn parse(weights: &[u8], prices: &[u8]) -> Result<Self, DataError> {
        Ok(Self {
            weights: CsvTable::from_bytes(WEIGHTS_TABLE, weights)?,
            prices: CsvTable::from_bytes(PRICES_TABLE, prices)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headers_and_rows() {
        let table = CsvTable::from_bytes(WEIGHTS_TABLE, b"name, weight\nA,0.5\nB , 0.25\n").unwrap();
        assert_eq!(table.headers(), &["name".to_string(), "weight".to_string()]);
        assert_eq!(table.height(), 2);
        assert_eq!(table.rows()[1], vec!["B".to_string(), "0.25".to_string()]);
        assert_eq!(table.column_index("weight"), Some(1));
        assert_eq!(table.column_index("Weight"), None);
        assert_eq!(table.column_index_ignore_case("NAME"), Some(0));
    }

    #[test]
    fn test_parse_strips_byte_order_mark() {
        let table = CsvTable::from_bytes(PRICES_TABLE, "\u{feff}DATE,A\n2026-01-01,1\n".as_bytes())
            .unwrap();
        assert_eq!(table.column_index("DATE"), Some(0));
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let err = CsvTable::from_bytes(PRICES_TABLE, b"DATE,A,B\n2026-01-01,1\n").unwrap_err();
        match err {
            DataError::Csv { table, .. } => assert_eq!(table, PRICES_TABLE),
            other => panic!("Expected CSV error, got {other:?}"),
        }
    }

    #[test]
    fn test_snapshot_reports_failing_table() {
        let err = Snapshot::parse(b"name,weight\nA,0.1\n", b"DATE,A\n1,2,3\n").unwrap_err();
        assert!(err.to_string().contains("prices"));
    }
}

use super::ui;
use crate::core::format::{
    CompositionEntry, HistoryRecord, PerformancePoint, PriceChangeEntry, TopHolding,
};
use crate::core::query::{self, AGGREGATE_COLUMN, QueryOutcome};
use crate::core::table::Snapshot;
use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use std::path::Path;

/// The query views the CLI can print.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Performance,
    Composition,
    Change { date: Option<String> },
    Top { n: i64 },
    History,
}

impl View {
    fn title(&self) -> &'static str {
        match self {
            View::Performance => "ETF performance",
            View::Composition => "ETF composition",
            View::Change { .. } => "Holding price change",
            View::Top { .. } => "Top holdings",
            View::History => "Full price history",
        }
    }
}

/// Reads a weights/prices pair straight from CSV files.
pub fn load_snapshot_from_files(weights: &Path, prices: &Path) -> Result<Snapshot> {
    let weights_bytes = std::fs::read(weights)
        .with_context(|| format!("Failed to read weights file: {}", weights.display()))?;
    let prices_bytes = std::fs::read(prices)
        .with_context(|| format!("Failed to read prices file: {}", prices.display()))?;
    Ok(Snapshot::parse(&weights_bytes, &prices_bytes)?)
}

pub fn run(view: &View, snapshot: Option<&Snapshot>) -> Result<()> {
    println!("\n{}", ui::style_text(view.title(), ui::StyleType::Title));
    println!("{}", render(view, snapshot)?);
    Ok(())
}

/// Renders a view as a table, or as a one-line notice when there is nothing to show.
pub fn render(view: &View, snapshot: Option<&Snapshot>) -> Result<String> {
    let table = match view {
        View::Performance => query::performance(snapshot)?.map_table(performance_table),
        View::Composition => query::composition(snapshot)?.map_table(composition_table),
        View::Change { date } => {
            query::holding_price_change(snapshot, date.as_deref()).map_table(change_table)
        }
        View::Top { n } => query::top_holdings(snapshot, *n).map_table(top_table),
        View::History => query::full_price_history(snapshot)?.map_table(history_table),
    };
    Ok(table)
}

trait RenderOutcome<T> {
    fn map_table(self, f: fn(&[T]) -> Table) -> String;
}

impl<T> RenderOutcome<T> for QueryOutcome<T> {
    fn map_table(self, f: fn(&[T]) -> Table) -> String {
        match self {
            QueryOutcome::Rows(rows) if rows.is_empty() => {
                ui::style_text("No rows.", ui::StyleType::Subtle)
            }
            QueryOutcome::Rows(rows) => f(&rows).to_string(),
            QueryOutcome::NoData => {
                ui::style_text("No data uploaded yet.", ui::StyleType::Subtle)
            }
            QueryOutcome::Degraded(reason) => ui::style_text(
                &format!("Could not compute this view: {reason}"),
                ui::StyleType::Error,
            ),
        }
    }
}

fn performance_table(points: &[PerformancePoint]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Date"), ui::header_cell("Value")]);
    for point in points {
        table.add_row(vec![Cell::new(&point.date), ui::number_cell(point.value)]);
    }
    table
}

fn composition_table(entries: &[CompositionEntry]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Name"),
        ui::header_cell("Weight"),
        ui::header_cell("Latest Price"),
    ]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(&entry.name),
            ui::number_cell(entry.weight),
            ui::number_cell(entry.latest_price),
        ]);
    }
    table
}

fn change_table(entries: &[PriceChangeEntry]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Name"),
        ui::header_cell("Weight"),
        ui::header_cell("Price"),
        ui::header_cell("Change"),
    ]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(&entry.name),
            ui::number_cell(entry.weight),
            ui::number_cell(entry.historical_price),
            ui::change_cell(entry.change_amount, entry.increased),
        ]);
    }
    table
}

fn top_table(holdings: &[TopHolding]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Name"),
        ui::header_cell("Weight"),
        ui::header_cell("Holding Value"),
    ]);
    for (rank, holding) in holdings.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&holding.name),
            ui::number_cell(holding.weight),
            ui::highlight_cell(holding.holding_value),
        ]);
    }
    table
}

fn history_table(records: &[HistoryRecord]) -> Table {
    let mut table = ui::new_styled_table();
    // All records share the column set of the first one
    let columns: Vec<String> = records
        .first()
        .map(|r| r.columns.keys().cloned().collect())
        .unwrap_or_default();

    let mut header = vec![ui::header_cell("Date")];
    header.extend(columns.iter().map(|c| {
        let label = if c == AGGREGATE_COLUMN { "ETF Value" } else { c.as_str() };
        ui::header_cell(label)
    }));
    table.set_header(header);

    for record in records {
        let mut row = vec![Cell::new(&record.date)];
        row.extend(columns.iter().map(|c| match record.get(c) {
            Some(value) => ui::number_cell(value),
            None => Cell::new("-"),
        }));
        table.add_row(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        Snapshot::parse(
            b"name,weight\nAAA,0.6\nBBB,0.4\n",
            b"DATE,AAA,BBB\n2026-01-01,10,20\n2026-01-02,12,18\n",
        )
        .unwrap()
    }

    #[test]
    fn test_render_without_data() {
        let out = render(&View::Composition, None).unwrap();
        assert!(out.contains("No data uploaded yet."));
    }

    #[test]
    fn test_render_views() {
        let snap = sample();

        let out = render(&View::Composition, Some(&snap)).unwrap();
        assert!(out.contains("AAA"));
        assert!(out.contains("12.000"));

        let out = render(&View::Performance, Some(&snap)).unwrap();
        // 0.6 * 12 + 0.4 * 18
        assert!(out.contains("2026-01-02"));
        assert!(out.contains("14.400"));

        let out = render(&View::Change { date: None }, Some(&snap)).unwrap();
        assert!(out.contains("+2.000"));
        assert!(out.contains("-2.000"));

        let out = render(&View::Top { n: 1 }, Some(&snap)).unwrap();
        assert!(out.contains("AAA"));
        assert!(!out.contains("BBB"));

        let out = render(&View::History, Some(&snap)).unwrap();
        assert!(out.contains("ETF Value"));
    }

    #[test]
    fn test_render_top_zero_has_no_rows() {
        let out = render(&View::Top { n: 0 }, Some(&sample())).unwrap();
        assert!(out.contains("No rows."));
    }

    #[test]
    fn test_render_strict_view_fails_on_bad_data() {
        let snap = Snapshot::parse(b"name,weight\nA,1\n", b"DATE,A\nlater,1\n").unwrap();
        assert!(render(&View::Performance, Some(&snap)).is_err());

        let out = render(&View::Top { n: 5 }, Some(&snap)).unwrap();
        assert!(out.contains("Could not compute this view"));
    }

    #[test]
    fn test_load_snapshot_from_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let weights = dir.path().join("weights.csv");
        let prices = dir.path().join("prices.csv");
        std::fs::write(&weights, "name,weight\nA,1\n")?;
        std::fs::write(&prices, "DATE,A\n2026-01-01,1\n")?;

        let snapshot = load_snapshot_from_files(&weights, &prices)?;
        assert_eq!(snapshot.weights.height(), 1);

        let missing = dir.path().join("missing.csv");
        let err = load_snapshot_from_files(&missing, &prices).unwrap_err();
        assert!(err.to_string().contains("Failed to read weights file"));
        Ok(())
    }
}

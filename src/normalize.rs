/// Input normalization for field measurement sheets.
///
/// Field sheets arrive with comma decimal separators, `<Null>` markers and
/// the occasional blank cell. This module cleans the columns the enrichment
/// loop depends on and drops rows that cannot be enriched. Row indices are
/// carried through untouched.

use crate::logging::{self, Stage};
use crate::model::{
    Cell, MeasurementRow, RunError, Table, COL_DATE, COL_DEPTH, COL_LATITUDE, COL_LONGITUDE,
    COL_TIME,
};

/// Result of normalizing the loaded sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInput {
    /// Cleaned table with incomplete rows removed.
    pub table: Table,
    /// One measurement per surviving table row, in the same order.
    pub rows: Vec<MeasurementRow>,
    /// Original indices of dropped rows.
    pub dropped: Vec<usize>,
}

struct RequiredColumns {
    date: usize,
    time: usize,
    longitude: usize,
    latitude: usize,
    depth: usize,
}

fn locate_columns(table: &Table) -> Result<RequiredColumns, RunError> {
    let find = |name: &str| {
        table
            .column_index(name)
            .ok_or_else(|| RunError::MissingColumn(name.to_string()))
    };
    Ok(RequiredColumns {
        date: find(COL_DATE)?,
        time: find(COL_TIME)?,
        longitude: find(COL_LONGITUDE)?,
        latitude: find(COL_LATITUDE)?,
        depth: find(COL_DEPTH)?,
    })
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

/// Replace the null sentinel (and blank text) with `Empty`.
pub fn clear_null(cell: Cell, null_sentinel: &str) -> Cell {
    match cell {
        Cell::Text(s) if s.trim().is_empty() || s.trim() == null_sentinel => Cell::Empty,
        other => other,
    }
}

/// Coerce to a finite number, accepting `,` as the decimal separator.
/// Anything else becomes `Empty`.
pub fn coerce_number(cell: Cell) -> Cell {
    match cell {
        Cell::Number(v) if v.is_finite() => Cell::Number(v),
        Cell::Text(s) => match s.trim().replace(',', ".").parse::<f64>() {
            Ok(v) if v.is_finite() => Cell::Number(v),
            _ => Cell::Empty,
        },
        _ => Cell::Empty,
    }
}

/// Date cells become space separated text (`01.06.18` -> `01 06 18`).
pub fn coerce_date(cell: Cell) -> Cell {
    match cell {
        Cell::Empty => Cell::Empty,
        Cell::Text(s) => Cell::Text(s.trim().replace('.', " ")),
        Cell::DateTime(dt) => Cell::Text(dt.format("%d %m %Y").to_string()),
        other => Cell::Text(other.to_string()),
    }
}

/// Time cells become `H:M` text. Values that are not recognizable as a time
/// are kept as text so the window builder reports them instead of the row
/// silently disappearing.
pub fn coerce_time(cell: Cell) -> Cell {
    match cell {
        Cell::Empty => Cell::Empty,
        Cell::Text(s) => Cell::Text(s.trim().to_string()),
        Cell::DateTime(dt) => Cell::Text(dt.format("%H:%M").to_string()),
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Clean the sheet and extract measurement rows.
///
/// Fails only when a required column is missing from the header; incomplete
/// rows are dropped and reported, never fatal.
pub fn normalize(table: Table, null_sentinel: &str) -> Result<NormalizedInput, RunError> {
    let cols = locate_columns(&table)?;
    let Table { columns, rows } = table;

    let mut kept = Vec::with_capacity(rows.len());
    let mut measurements = Vec::with_capacity(rows.len());
    let mut dropped = Vec::new();

    for mut row in rows {
        row.cells = row
            .cells
            .into_iter()
            .map(|c| clear_null(c, null_sentinel))
            .collect();
        row.cells.resize(columns.len(), Cell::Empty);

        for idx in [cols.longitude, cols.latitude, cols.depth] {
            let cell = std::mem::replace(&mut row.cells[idx], Cell::Empty);
            row.cells[idx] = coerce_number(cell);
        }
        let date = std::mem::replace(&mut row.cells[cols.date], Cell::Empty);
        row.cells[cols.date] = coerce_date(date);
        let time = std::mem::replace(&mut row.cells[cols.time], Cell::Empty);
        row.cells[cols.time] = coerce_time(time);

        let measurement = match (
            row.cells[cols.date].as_text(),
            row.cells[cols.time].as_text(),
            row.cells[cols.latitude].as_number(),
            row.cells[cols.longitude].as_number(),
            row.cells[cols.depth].as_number(),
        ) {
            (Some(date), Some(time), Some(latitude), Some(longitude), Some(depth)) => {
                MeasurementRow {
                    index: row.index,
                    date: date.to_string(),
                    time: time.to_string(),
                    latitude,
                    longitude,
                    depth,
                }
            }
            _ => {
                logging::debug(
                    Stage::Input,
                    Some(&logging::row_label(row.index)),
                    "Dropped: missing or non-numeric required field",
                );
                dropped.push(row.index);
                continue;
            }
        };

        measurements.push(measurement);
        kept.push(row);
    }

    if !dropped.is_empty() {
        logging::warn(
            Stage::Input,
            None,
            &format!("{} incomplete rows dropped: {:?}", dropped.len(), dropped),
        );
    }

    Ok(NormalizedInput {
        table: Table { columns, rows: kept },
        rows: measurements,
        dropped,
    })
}

/// Put the period separators back into the date column for output.
pub fn restore_date_format(table: &mut Table) {
    let Some(col) = table.column_index(COL_DATE) else {
        return;
    };
    for row in &mut table.rows {
        if let Some(Cell::Text(s)) = row.cells.get_mut(col) {
            *s = s.replace(' ', ".");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TableRow;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn field_table(rows: Vec<Vec<Cell>>) -> Table {
        Table {
            columns: vec![
                "Date".into(),
                "Time".into(),
                "GPS Longitude".into(),
                "GPS Latitude".into(),
                "depth".into(),
                "comment".into(),
            ],
            rows: rows
                .into_iter()
                .enumerate()
                .map(|(index, cells)| TableRow { index, cells })
                .collect(),
        }
    }

    #[test]
    fn test_complete_row_survives_with_comma_decimals() {
        let table = field_table(vec![vec![
            text("01.06.18"),
            text("12:00"),
            text("10,7"),
            text("59,9"),
            text("2,0"),
            text("calm"),
        ]]);
        let out = normalize(table, "<Null>").expect("all columns present");

        assert!(out.dropped.is_empty());
        assert_eq!(out.rows.len(), 1);
        let row = &out.rows[0];
        assert_eq!(row.date, "01 06 18");
        assert_eq!(row.time, "12:00");
        assert_eq!(row.longitude, 10.7);
        assert_eq!(row.latitude, 59.9);
        assert_eq!(row.depth, 2.0);
        assert_eq!(out.table.rows[0].cells[5], text("calm"));
    }

    #[test]
    fn test_incomplete_rows_dropped_and_indices_not_reused() {
        let table = field_table(vec![
            vec![text("01.06.18"), text("12:00"), Cell::Number(10.7), Cell::Number(59.9), Cell::Number(2.0), Cell::Empty],
            vec![text("01.06.18"), text("12:10"), text("<Null>"), Cell::Number(59.9), Cell::Number(2.1), Cell::Empty],
            vec![text("01.06.18"), Cell::Empty, Cell::Number(10.7), Cell::Number(59.9), Cell::Number(2.2), Cell::Empty],
            vec![text("01.06.18"), text("12:30"), Cell::Number(10.7), Cell::Number(59.9), text("deep"), Cell::Empty],
            vec![text("01.06.18"), text("12:40"), Cell::Number(10.8), Cell::Number(59.8), Cell::Number(2.4), Cell::Empty],
        ]);
        let out = normalize(table, "<Null>").expect("all columns present");

        assert_eq!(out.dropped, vec![1, 2, 3]);
        let indices: Vec<usize> = out.rows.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 4]);
        let table_indices: Vec<usize> = out.table.rows.iter().map(|r| r.index).collect();
        assert_eq!(table_indices, indices, "table rows and measurements stay aligned");
    }

    #[test]
    fn test_nan_text_is_not_a_number() {
        assert_eq!(coerce_number(text("nan")), Cell::Empty);
        assert_eq!(coerce_number(text("inf")), Cell::Empty);
        assert_eq!(coerce_number(text(" 3,25 ")), Cell::Number(3.25));
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let table = Table {
            columns: vec!["Date".into(), "Time".into(), "GPS Longitude".into(), "GPS Latitude".into()],
            rows: vec![],
        };
        assert_eq!(
            normalize(table, "<Null>").unwrap_err(),
            RunError::MissingColumn("depth".to_string())
        );
    }

    #[test]
    fn test_first_missing_column_in_header_order_is_reported() {
        let table = Table {
            columns: vec!["Date".into(), "GPS Latitude".into()],
            rows: vec![],
        };
        assert_eq!(
            normalize(table, "<Null>").unwrap_err(),
            RunError::MissingColumn("Time".to_string())
        );
    }

    #[test]
    fn test_spreadsheet_date_and_time_cells_are_rendered() {
        let date = chrono::NaiveDate::from_ymd_opt(2018, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let time = chrono::NaiveDate::from_ymd_opt(1899, 12, 31)
            .unwrap()
            .and_hms_opt(12, 5, 0)
            .unwrap();
        assert_eq!(coerce_date(Cell::DateTime(date)), text("01 06 2018"));
        assert_eq!(coerce_time(Cell::DateTime(time)), text("12:05"));
    }

    #[test]
    fn test_malformed_time_is_kept_for_the_window_builder() {
        let table = field_table(vec![vec![
            text("01.06.18"),
            text("25:99"),
            Cell::Number(10.7),
            Cell::Number(59.9),
            Cell::Number(2.0),
            Cell::Empty,
        ]]);
        let out = normalize(table, "<Null>").unwrap();
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].time, "25:99");
    }

    #[test]
    fn test_date_format_round_trips() {
        let table = field_table(vec![vec![
            text("01.06.18"),
            text("12:00"),
            Cell::Number(10.7),
            Cell::Number(59.9),
            Cell::Number(2.0),
            Cell::Empty,
        ]]);
        let mut out = normalize(table, "<Null>").unwrap();
        assert_eq!(out.table.rows[0].cells[0], text("01 06 18"));
        restore_date_format(&mut out.table);
        assert_eq!(out.table.rows[0].cells[0], text("01.06.18"));
    }
}

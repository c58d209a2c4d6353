/// Core data types for the chart datum enrichment tool.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O, only types and the column names the input
/// spreadsheet is expected to carry.

use std::fmt;

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Measurement date, `dd.mm.yy` or `dd.mm.yyyy` in the field sheets.
pub const COL_DATE: &str = "Date";

/// Local clock time of the measurement, `H:M`.
pub const COL_TIME: &str = "Time";

/// WGS84 longitude, may use a comma decimal separator.
pub const COL_LONGITUDE: &str = "GPS Longitude";

/// WGS84 latitude, may use a comma decimal separator.
pub const COL_LATITUDE: &str = "GPS Latitude";

/// Measured depth in meters.
pub const COL_DEPTH: &str = "depth";

/// Name of the column appended to the output table.
pub const COL_CHART_DATUM: &str = "chart_datum";

// ---------------------------------------------------------------------------
// Tabular types
// ---------------------------------------------------------------------------

/// A single spreadsheet cell after loading.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Date or time cell; time-only cells carry the 1899-12-31 epoch date.
    DateTime(chrono::NaiveDateTime),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Number(v) => write!(f, "{}", v),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// One data row of the input sheet.
///
/// `index` is the 0-based position of the row in the sheet as loaded. It is
/// never renumbered, so rows dropped during normalization leave gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub index: usize,
    pub cells: Vec<Cell>,
}

/// The first worksheet of the input file: a header row plus data rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Inserts a named column at `position` (clamped to the column count).
    /// `values` must have one entry per row.
    pub fn insert_column(&mut self, position: usize, name: &str, values: Vec<Cell>) {
        let position = position.min(self.columns.len());
        self.columns.insert(position, name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            let at = position.min(row.cells.len());
            row.cells.insert(at, value);
        }
    }
}

// ---------------------------------------------------------------------------
// Measurement types
// ---------------------------------------------------------------------------

/// A normalized field measurement, ready for enrichment.
///
/// `date` is space separated (`01 06 18`) at this stage; the period form is
/// restored only on the output table.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRow {
    pub index: usize,
    pub date: String,
    pub time: String,
    pub latitude: f64,
    pub longitude: f64,
    pub depth: f64,
}

/// The `fromtime`/`totime` pair sent to the water level service for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub from_time: String, // "%Y-%m-%dT%H:%M"
    pub to_time: String,
}

/// One `<waterlevel>` element of a tide API response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TidalPoint {
    pub time: Option<String>,
    pub value: Option<String>, // centimeters above chart datum, unparsed
    pub flag: Option<String>,  // "pre" = predicted, "obs" = observed
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors from a single request to the water level service.
#[derive(Debug, Clone, PartialEq)]
pub enum TideError {
    /// Connection failure, timeout or other transport-level error.
    Request(String),
    /// Non-2xx HTTP response from the API.
    HttpStatus(u16),
    /// The response body was not a well-formed XML document.
    Parse(String),
}

impl fmt::Display for TideError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TideError::Request(msg) => write!(f, "Request failed: {}", msg),
            TideError::HttpStatus(code) => write!(f, "HTTP error: {}", code),
            TideError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for TideError {}

/// Why a row ended up without a tidal value. Never aborts the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum RowFailure {
    Service(TideError),
    /// The response contained no `<waterlevel>` elements.
    NoWaterLevel,
    /// The selected `<waterlevel>` element had no `value` attribute.
    MissingValue,
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowFailure::Service(e) => write!(f, "{}", e),
            RowFailure::NoWaterLevel => write!(f, "No waterlevel data in response"),
            RowFailure::MissingValue => write!(f, "Waterlevel element has no value attribute"),
        }
    }
}

impl std::error::Error for RowFailure {}

/// Conditions that abort the whole run.
#[derive(Debug, PartialEq)]
pub enum RunError {
    /// Invalid configuration file, environment override or CLI value.
    Config(String),
    /// The input spreadsheet could not be opened or read.
    InputRead { path: String, reason: String },
    /// A required column is absent from the input header row.
    MissingColumn(String),
    /// Not a single row received a tidal value.
    NoWaterLevelData,
    /// An output file could not be written.
    OutputWrite { path: String, reason: String },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Config(msg) => write!(f, "Configuration error: {}", msg),
            RunError::InputRead { path, reason } => {
                write!(f, "Reading input file {}: {}", path, reason)
            }
            RunError::MissingColumn(name) => {
                write!(f, "Formatting of input data failed: missing column '{}'", name)
            }
            RunError::NoWaterLevelData => write!(f, "no waterlevel data"),
            RunError::OutputWrite { path, reason } => {
                write!(f, "Writing output file {}: {}", path, reason)
            }
        }
    }
}

impl std::error::Error for RunError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        Table {
            columns: vec!["a".to_string(), "b".to_string()],
            rows: vec![
                TableRow { index: 0, cells: vec![Cell::Number(1.0), Cell::Number(2.0)] },
                TableRow { index: 3, cells: vec![Cell::Number(3.0), Cell::Number(4.0)] },
            ],
        }
    }

    #[test]
    fn test_insert_column_in_the_middle() {
        let mut table = sample_table();
        table.insert_column(1, "x", vec![Cell::Text("p".into()), Cell::Empty]);
        assert_eq!(table.columns, vec!["a", "x", "b"]);
        assert_eq!(table.rows[0].cells[1], Cell::Text("p".into()));
        assert_eq!(table.rows[1].cells[1], Cell::Empty);
        assert_eq!(table.rows[1].index, 3, "row index must survive column insertion");
    }

    #[test]
    fn test_insert_column_position_is_clamped() {
        let mut table = sample_table();
        table.insert_column(6, "x", vec![Cell::Number(9.0), Cell::Number(8.0)]);
        assert_eq!(table.columns.last().map(String::as_str), Some("x"));
        assert_eq!(table.rows[0].cells[2], Cell::Number(9.0));
    }

    #[test]
    fn test_run_error_messages() {
        assert_eq!(RunError::NoWaterLevelData.to_string(), "no waterlevel data");
        assert!(RunError::MissingColumn("depth".into()).to_string().contains("'depth'"));
        assert_eq!(TideError::HttpStatus(503).to_string(), "HTTP error: 503");
    }
}

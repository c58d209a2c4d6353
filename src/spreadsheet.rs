/// Spreadsheet input and output.
///
/// Reads the first worksheet of a field sheet (`.xlsx`, `.xls`, `.ods`) into a
/// `Table` and writes the augmented table back out as `.xlsx`.

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::Path;

use crate::model::{Cell, RunError, Table, TableRow};

/// Sheet name used for the output workbook.
pub const OUTPUT_SHEET: &str = "Sheet1";

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(naive) => Cell::DateTime(naive),
                None => Cell::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Load the first worksheet. The first row is the header; unnamed header
/// cells are given `Unnamed: <n>` names. Data rows are numbered from 0.
pub fn read_table(path: &Path) -> Result<Table, RunError> {
    let read_error = |reason: String| RunError::InputRead {
        path: path.display().to_string(),
        reason,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| read_error(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| read_error("workbook contains no worksheets".to_string()))?
        .map_err(|e| read_error(e.to_string()))?;

    let mut rows = range.rows();
    let header = match rows.next() {
        Some(header) => header,
        None => return Ok(Table::default()),
    };

    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell {
            Data::Empty => format!("Unnamed: {}", i),
            other => other.to_string(),
        })
        .collect();

    let table_rows = rows
        .enumerate()
        .map(|(index, raw)| {
            let mut cells: Vec<Cell> = raw.iter().map(Cell::from).collect();
            cells.resize(columns.len(), Cell::Empty);
            TableRow { index, cells }
        })
        .collect();

    Ok(Table {
        columns,
        rows: table_rows,
    })
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Write the table to `path` as a single-sheet workbook.
///
/// The first column holds the original row index under an empty header, so
/// gaps left by dropped rows stay visible. Empty cells are left blank.
pub fn write_table(table: &Table, path: &Path) -> Result<(), RunError> {
    build_workbook(table)
        .and_then(|mut workbook| workbook.save(path))
        .map_err(|e| RunError::OutputWrite {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

fn build_workbook(table: &Table) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(OUTPUT_SHEET)?;

    for (i, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, column_number(i + 1)?, name.as_str(), &bold)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let excel_row = u32::try_from(r + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        worksheet.write_number_with_format(excel_row, 0, row.index as f64, &bold)?;

        for (c, cell) in row.cells.iter().enumerate() {
            let col = column_number(c + 1)?;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    worksheet.write_string(excel_row, col, s.as_str())?;
                }
                Cell::Number(v) => {
                    worksheet.write_number(excel_row, col, *v)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(excel_row, col, *b)?;
                }
                Cell::DateTime(_) => {
                    worksheet.write_string(excel_row, col, cell.to_string())?;
                }
            }
        }
    }

    Ok(workbook)
}

fn column_number(i: usize) -> Result<u16, XlsxError> {
    u16::try_from(i).map_err(|_| XlsxError::RowColumnLimitError)
}

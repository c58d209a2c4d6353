//! Chart datum calculation.
//!
//! Depths are measured in meters; the water level API reports centimeters
//! above chart datum. Chart datum for a row is
//!
//!   depth - water_level / unit_factor
//!
//! with `unit_factor` = 100 by default.

use crate::logging::{self, Stage};
use crate::model::{Cell, MeasurementRow, RunError};

/// Coerce a raw `value` attribute. Non-numeric and non-finite values give
/// `None`.
pub fn parse_tidal_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn chart_datum(depth: f64, tidal_value: f64, unit_factor: f64) -> f64 {
    depth - tidal_value / unit_factor
}

/// Compute the chart datum column.
///
/// `tidal_values` is aligned with `rows`. Fails with `NoWaterLevelData` if no
/// row has a tidal value at all, which includes an empty batch.
pub fn compute_column(
    rows: &[MeasurementRow],
    tidal_values: &[Option<&str>],
    unit_factor: f64,
) -> Result<Vec<Option<f64>>, RunError> {
    if tidal_values.iter().all(Option::is_none) {
        return Err(RunError::NoWaterLevelData);
    }

    let column = rows
        .iter()
        .zip(tidal_values)
        .map(|(row, raw)| {
            let raw = (*raw)?;
            match parse_tidal_value(raw) {
                Some(value) => Some(chart_datum(row.depth, value, unit_factor)),
                None => {
                    logging::warn(
                        Stage::Datum,
                        Some(&logging::row_label(row.index)),
                        &format!("Non-numeric water level '{}'", raw),
                    );
                    None
                }
            }
        })
        .collect();

    Ok(column)
}

/// Output cells for the computed column; undefined values stay empty.
pub fn to_cells(column: &[Option<f64>]) -> Vec<Cell> {
    column
        .iter()
        .map(|v| v.map(Cell::Number).unwrap_or(Cell::Empty))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(index: usize, depth: f64) -> MeasurementRow {
        MeasurementRow {
            index,
            date: "01 06 18".to_string(),
            time: "12:00".to_string(),
            latitude: 59.9,
            longitude: 10.7,
            depth,
        }
    }

    #[test]
    fn test_field_example() {
        // 2.0 m measured, 150 cm above chart datum
        let column = compute_column(&[row(0, 2.0)], &[Some("150")], 100.0).unwrap();
        assert_eq!(column, vec![Some(0.5)]);
    }

    #[test]
    fn test_undefined_values_propagate() {
        let rows = [row(0, 2.0), row(2, 3.0), row(5, 4.25)];
        let column = compute_column(&rows, &[Some("150"), None, Some("25")], 100.0).unwrap();
        assert_eq!(column, vec![Some(0.5), None, Some(4.0)]);
    }

    #[test]
    fn test_all_undefined_is_fatal() {
        let rows = [row(0, 2.0), row(1, 3.0)];
        let err = compute_column(&rows, &[None, None], 100.0).unwrap_err();
        assert_eq!(err, RunError::NoWaterLevelData);
    }

    #[test]
    fn test_empty_batch_is_fatal() {
        assert_eq!(compute_column(&[], &[], 100.0), Err(RunError::NoWaterLevelData));
    }

    #[test]
    fn test_non_numeric_value_becomes_undefined() {
        let rows = [row(0, 2.0), row(1, 3.0)];
        let column = compute_column(&rows, &[Some("n/a"), Some("-50")], 100.0).unwrap();
        assert_eq!(column, vec![None, Some(3.5)]);
    }

    #[test]
    fn test_custom_unit_factor() {
        assert_eq!(chart_datum(2.0, 1.5, 1.0), 0.5);
    }

    #[test]
    fn test_to_cells() {
        assert_eq!(
            to_cells(&[Some(0.5), None]),
            vec![Cell::Number(0.5), Cell::Empty]
        );
    }
}

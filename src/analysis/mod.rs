/// Post-processing of tide API responses.
///
/// Submodules:
/// - `selection` — picks the water level used for each row and folds the raw
///   responses into one document.
/// - `chart_datum` — converts units and derives the chart datum column.

pub mod chart_datum;
pub mod selection;

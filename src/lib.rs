//! Chart datum enrichment for field depth measurements.
//!
//! Reads a sheet of depth soundings, looks up the water level relative to
//! chart datum for each one from the Kartverket water level API, and writes
//! the sheet back out with a `chart_datum` column plus the raw API responses.

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod spreadsheet;
pub mod window;

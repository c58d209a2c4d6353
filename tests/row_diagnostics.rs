//! Row-local diagnostics written through the global logger.
//!
//! The logger is process-wide, so everything that inspects the log file
//! lives in this single test binary and a single test.
//!
//! Run with: cargo test --test row_diagnostics

use chart_datum::config::AppConfig;
use chart_datum::ingest::tide::{TideQuery, TideSource};
use chart_datum::logging::{self, LogLevel};
use chart_datum::model::{MeasurementRow, RowFailure, TideError};
use chart_datum::pipeline;

/// Answers every query with a response holding no water levels.
struct EmptyTide;

impl TideSource for EmptyTide {
    fn fetch(&self, _query: &TideQuery) -> Result<String, TideError> {
        Ok("<tide><locationdata><data/></locationdata></tide>".to_string())
    }
}

fn measurement(index: usize, date: &str, time: &str) -> MeasurementRow {
    MeasurementRow {
        index,
        date: date.to_string(),
        time: time.to_string(),
        latitude: 59.9,
        longitude: 10.7,
        depth: 2.0,
    }
}

fn lines_for<'a>(log: &'a str, row: usize) -> Vec<&'a str> {
    let tag = format!("[row {}]", row);
    log.lines().filter(|l| l.contains(&tag)).collect()
}

#[test]
fn test_row_diagnostics_name_the_row_and_its_fields() {
    let dir = std::env::temp_dir().join(format!("chart_datum_diag_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("scratch dir");
    let log_path = dir.join("run.log");
    logging::init_logger(LogLevel::Info, log_path.to_str(), false);

    let config = AppConfig::default();
    let rows = [
        measurement(0, "01 06 18", "12:00"),     // no waterlevel elements
        measurement(1, "01 06 18", "25:99"),     // malformed time
        measurement(2, "31 12 262142", "23:58"), // window past the calendar range
    ];
    let outcomes = pipeline::enrich_rows(&EmptyTide, &rows, &config);

    assert_eq!(outcomes.len(), 3, "no row aborts the batch");
    assert!(outcomes.iter().all(|o| o.tidal_value == Err(RowFailure::NoWaterLevel)));
    assert!(!outcomes[0].window.is_sentinel());
    assert!(outcomes[1].window.is_sentinel());
    assert!(outcomes[2].window.is_sentinel());

    let log = std::fs::read_to_string(&log_path).expect("log file written");
    println!("{}", log);

    let row0 = lines_for(&log, 0);
    assert!(
        row0.iter().any(|l| l.contains("No tidal information for point")
            && l.contains("Time: 12:00 Date: 01 06 18")
            && l.contains("Latitude: 59.9 Longitude: 10.7")),
        "no-data diagnostic for row 0 missing: {:?}",
        row0
    );

    let row1 = lines_for(&log, 1);
    assert!(
        row1.iter().any(|l| l.contains("ERROR") && l.contains("Time: 25:99 Date: 01 06 18 has wrong format")),
        "bad timestamp diagnostic for row 1 missing: {:?}",
        row1
    );
    assert!(
        row1.iter().any(|l| l.contains("Required time format: H:M, required date format: dd.mm.yy")),
        "expected format hint for row 1 missing: {:?}",
        row1
    );

    let row2 = lines_for(&log, 2);
    assert!(
        row2.iter().any(|l| l.contains("Time: 23:58 Date: 31 12 262142 has wrong format")),
        "out of range timestamp for row 2 missing: {:?}",
        row2
    );

    let _ = std::fs::remove_dir_all(&dir);
}

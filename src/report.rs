//! Run Report
//!
//! Summary of one enrichment run: how many rows made it through each stage
//! and, for every row left without a chart datum, enough context to look it
//! up by hand.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::model::{MeasurementRow, RunError};

// ============================================================================
// Report structures
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub timestamp: String,
    pub input_file: String,
    pub summary: RunSummary,
    pub dropped_rows: Vec<usize>,
    pub failures: Vec<RowFailureRecord>,
    pub xml_output: Option<String>,
    pub xlsx_output: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub rows_loaded: usize,
    pub rows_dropped: usize,
    pub rows_queried: usize,
    pub rows_with_tide: usize,
    pub rows_failed: usize,
    pub sentinel_windows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowFailureRecord {
    pub index: usize,
    pub date: String,
    pub time: String,
    pub latitude: f64,
    pub longitude: f64,
    pub reason: String,
}

impl RowFailureRecord {
    pub fn new(row: &MeasurementRow, reason: impl Into<String>) -> Self {
        RowFailureRecord {
            index: row.index,
            date: row.date.clone(),
            time: row.time.clone(),
            latitude: row.latitude,
            longitude: row.longitude,
            reason: reason.into(),
        }
    }
}

impl RunReport {
    pub fn new(input: &Path) -> Self {
        RunReport {
            timestamp: Utc::now().to_rfc3339(),
            input_file: input.display().to_string(),
            summary: RunSummary::default(),
            dropped_rows: Vec::new(),
            failures: Vec::new(),
            xml_output: None,
            xlsx_output: None,
        }
    }

    /// Share of queried rows that received a tidal value, in percent.
    pub fn success_rate(&self) -> f64 {
        if self.summary.rows_queried > 0 {
            (self.summary.rows_with_tide as f64 / self.summary.rows_queried as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn to_json(&self) -> Result<String, RunError> {
        serde_json::to_string_pretty(self).map_err(|e| RunError::OutputWrite {
            path: "<summary>".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn save_json(&self, path: &Path) -> Result<(), RunError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| RunError::OutputWrite {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

// ============================================================================
// Console summary
// ============================================================================

pub fn print_summary(report: &RunReport) {
    let s = &report.summary;
    println!("\n═══════════════════════════════════════════════════════════");
    println!("📊 CHART DATUM SUMMARY");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!("Input:            {}", report.input_file);
    println!("Rows loaded:      {}  ({} dropped as incomplete)", s.rows_loaded, s.rows_dropped);
    println!("Rows queried:     {}  ({} with bad date/time)", s.rows_queried, s.sentinel_windows);
    println!("Chart datum:      {}/{} rows  ({} without tidal data)", s.rows_with_tide, s.rows_queried, s.rows_failed);
    println!();

    if !report.failures.is_empty() {
        println!("Rows without chart datum:");
        for f in &report.failures {
            println!(
                "  {:>5}  {} {}  ({:.5}, {:.5})  {}",
                f.index, f.date, f.time, f.latitude, f.longitude, f.reason
            );
        }
        println!();
    }

    if let Some(xlsx) = &report.xlsx_output {
        println!("Table:            {}", xlsx);
    }
    if let Some(xml) = &report.xml_output {
        println!("API responses:    {}", xml);
    }
    println!("Success Rate: {:.1}%", report.success_rate());
    println!("═══════════════════════════════════════════════════════════");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement() -> MeasurementRow {
        MeasurementRow {
            index: 7,
            date: "01 06 18".to_string(),
            time: "12:00".to_string(),
            latitude: 59.9,
            longitude: 10.7,
            depth: 2.0,
        }
    }

    #[test]
    fn test_success_rate() {
        let mut report = RunReport::new(Path::new("survey.xlsx"));
        assert_eq!(report.success_rate(), 0.0);

        report.summary.rows_queried = 4;
        report.summary.rows_with_tide = 3;
        assert_eq!(report.success_rate(), 75.0);
    }

    #[test]
    fn test_failure_record_carries_row_context() {
        let record = RowFailureRecord::new(&measurement(), "No waterlevel data in response");
        assert_eq!(record.index, 7);
        assert_eq!(record.time, "12:00");
        assert_eq!(record.latitude, 59.9);
    }

    #[test]
    fn test_report_json_round_trip() {
        let mut report = RunReport::new(Path::new("survey.xlsx"));
        report.summary.rows_loaded = 2;
        report.failures.push(RowFailureRecord::new(&measurement(), "timeout"));

        let json = report.to_json().expect("serializable");
        assert!(json.contains("\"rows_loaded\": 2"));

        let back: RunReport = serde_json::from_str(&json).expect("deserializable");
        assert_eq!(back, report);
    }
}

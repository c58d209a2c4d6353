/// Structured logging for the chart datum tool
///
/// Provides context-rich logging with pipeline stage and row identifiers,
/// timestamps, and severity levels. Supports both console output and
/// file-based logging so a field batch can be followed up manually.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Input,
    Window,
    Tide,
    Select,
    Datum,
    Output,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Input => write!(f, "INPUT"),
            Stage::Window => write!(f, "WINDOW"),
            Stage::Tide => write!(f, "TIDE"),
            Stage::Select => write!(f, "SELECT"),
            Stage::Datum => write!(f, "DATUM"),
            Stage::Output => write!(f, "OUTPUT"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

/// Label used as the context of row-local log entries.
pub fn row_label(index: usize) -> String {
    format!("row {}", index)
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - the service simply has no data for this window
    Expected,
    /// Unexpected failure - indicates service degradation or a network problem
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, stage: Stage, context: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let context_part = context.map(|c| format!(" [{}]", c)).unwrap_or_default();
        let log_entry = format!("{} {} {}{}: {}", timestamp, level, stage, context_part, message);

        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", stage, context_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", stage, context_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}{}: {}", stage, context_part, message),
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn emit(level: LogLevel, stage: Stage, context: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, stage, context, message);
        }
    }
}

/// Log a general informational message
pub fn info(stage: Stage, context: Option<&str>, message: &str) {
    emit(LogLevel::Info, stage, context, message);
}

/// Log a warning message
pub fn warn(stage: Stage, context: Option<&str>, message: &str) {
    emit(LogLevel::Warning, stage, context, message);
}

/// Log an error message
pub fn error(stage: Stage, context: Option<&str>, message: &str) {
    emit(LogLevel::Error, stage, context, message);
}

/// Log a debug message
pub fn debug(stage: Stage, context: Option<&str>, message: &str) {
    emit(LogLevel::Debug, stage, context, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a water level service failure from its error message
pub fn classify_tide_failure(error_message: &str) -> FailureType {
    if error_message.contains("No waterlevel data") {
        // Typical for sentinel windows and locations outside the model area
        FailureType::Expected
    } else if error_message.contains("Request failed") || error_message.contains("HTTP error") {
        FailureType::Unexpected
    } else if error_message.contains("Parse error") {
        // An API change or an HTML error page instead of XML
        FailureType::Unexpected
    } else {
        FailureType::Unknown
    }
}

/// Log a per-row tide failure with automatic classification
pub fn log_tide_failure(row: usize, operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_tide_failure(&error_msg);
    let label = row_label(row);

    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => warn(Stage::Tide, Some(&label), &message),
        FailureType::Unexpected => error(Stage::Tide, Some(&label), &message),
        FailureType::Unknown => warn(Stage::Tide, Some(&label), &message),
    }
}

// ---------------------------------------------------------------------------
// Batch Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of the enrichment loop
pub fn log_batch_summary(total: usize, successful: usize, failed: usize) {
    let message = format!(
        "Enrichment complete: {}/{} rows with tidal data, {} failed",
        successful, total, failed
    );

    if failed == 0 {
        info(Stage::Tide, None, &message);
    } else if successful == 0 {
        error(Stage::Tide, None, &message);
    } else {
        warn(Stage::Tide, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RowFailure, TideError};

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_failure_classification() {
        let empty = RowFailure::NoWaterLevel.to_string();
        assert_eq!(classify_tide_failure(&empty), FailureType::Expected);

        let timeout = RowFailure::Service(TideError::Request("operation timed out".into())).to_string();
        assert_eq!(classify_tide_failure(&timeout), FailureType::Unexpected);

        let status = TideError::HttpStatus(500).to_string();
        assert_eq!(classify_tide_failure(&status), FailureType::Unexpected);

        let missing = RowFailure::MissingValue.to_string();
        assert_eq!(classify_tide_failure(&missing), FailureType::Unknown);
    }

    #[test]
    fn test_row_label_format() {
        assert_eq!(row_label(0), "row 0");
        assert_eq!(row_label(17), "row 17");
    }
}

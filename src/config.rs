/// Run configuration for the chart datum tool.
///
/// Settings are layered: built-in defaults, then an optional TOML file, then
/// environment variables (a `.env` file in the working directory is loaded
/// first), and finally command line flags applied by the binary.
///
/// Example `chart_datum.toml`:
///
/// ```toml
/// api_url = "http://api.sehavniva.no/tideapi.php"
/// datatype = "OBS"
/// window_minutes = 5
/// timeout_secs = 20
/// ```

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::model::RunError;

/// Water level API endpoint.
pub const DEFAULT_API_URL: &str = "http://api.sehavniva.no/tideapi.php";

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "chart_datum.toml";

/// Widest accepted half window: one week.
pub const MAX_WINDOW_MINUTES: i64 = 7 * 24 * 60;

// ---------------------------------------------------------------------------
// Data type
// ---------------------------------------------------------------------------

/// Which water level series the API should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum DataType {
    /// Predicted (astronomical tide)
    Predicted,
    /// Observed
    Observed,
    /// Both series
    All,
}

impl DataType {
    /// Value of the `datatype` query parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            DataType::Predicted => "PRE",
            DataType::Observed => "OBS",
            DataType::All => "ALL",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_param())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PRE" => Ok(DataType::Predicted),
            "OBS" => Ok(DataType::Observed),
            "ALL" => Ok(DataType::All),
            other => Err(format!("unknown datatype '{}', expected PRE, OBS or ALL", other)),
        }
    }
}

impl TryFrom<String> for DataType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Application config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub api_url: String,
    pub datatype: DataType,
    /// Vertical reference of the returned levels; "CD" is chart datum.
    pub refcode: String,
    /// Half width of the query window around each measurement.
    pub window_minutes: i64,
    /// Spacing of the returned points, in minutes.
    pub api_interval: u32,
    /// Service units per measurement unit (cm to m).
    pub unit_factor: f64,
    pub timeout_secs: u64,
    /// Marker used in the field sheets for a missing value.
    pub null_sentinel: String,
    /// Column position of `chart_datum` in the output table.
    pub chart_datum_position: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_url: DEFAULT_API_URL.to_string(),
            datatype: DataType::Predicted,
            refcode: "CD".to_string(),
            window_minutes: 5,
            api_interval: 10,
            unit_factor: 100.0,
            timeout_secs: 30,
            null_sentinel: "<Null>".to_string(),
            chart_datum_position: 6,
        }
    }
}

impl AppConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, RunError> {
        let config: AppConfig =
            toml::from_str(text).map_err(|e| RunError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit file. A missing file is an error here.
    pub fn from_file(path: &Path) -> Result<Self, RunError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| RunError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Resolve the file layer: the explicit path if given, else
    /// `chart_datum.toml` in the working directory if it exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, RunError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply `TIDE_*` overrides from the process environment (after `.env`).
    pub fn apply_env(&mut self) -> Result<(), RunError> {
        dotenv::dotenv().ok();
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup; used by `apply_env` and tests.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), RunError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("TIDE_API_URL") {
            self.api_url = url;
        }
        if let Some(dt) = lookup("TIDE_DATATYPE") {
            self.datatype = dt.parse().map_err(RunError::Config)?;
        }
        if let Some(secs) = lookup("TIDE_TIMEOUT_SECS") {
            self.timeout_secs = secs
                .trim()
                .parse()
                .map_err(|_| RunError::Config(format!("TIDE_TIMEOUT_SECS: invalid value '{}'", secs)))?;
        }
        if let Some(minutes) = lookup("TIDE_INTERVAL_MINUTES") {
            self.window_minutes = minutes.trim().parse().map_err(|_| {
                RunError::Config(format!("TIDE_INTERVAL_MINUTES: invalid value '{}'", minutes))
            })?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), RunError> {
        if self.window_minutes < 0 {
            return Err(RunError::Config("window_minutes must not be negative".into()));
        }
        if self.window_minutes > MAX_WINDOW_MINUTES {
            return Err(RunError::Config(format!(
                "window_minutes must be at most {}, got {}",
                MAX_WINDOW_MINUTES, self.window_minutes
            )));
        }
        if !(self.unit_factor.is_finite() && self.unit_factor > 0.0) {
            return Err(RunError::Config("unit_factor must be a positive number".into()));
        }
        if self.timeout_secs == 0 {
            return Err(RunError::Config("timeout_secs must be at least 1".into()));
        }
        Ok(())
    }

    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.window_minutes)
    }
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, ValueHint};

use chart_datum::config::{AppConfig, DataType};
use chart_datum::ingest::tide::HttpTideSource;
use chart_datum::logging::{self, LogLevel, Stage};
use chart_datum::model::RunError;
use chart_datum::{pipeline, report};

#[derive(Parser, Debug)]
#[command(author, version, about = "Compute chart datum for field depth measurements", long_about = None)]
struct Cli {
    /// Input spreadsheet with Date, Time, GPS Longitude, GPS Latitude and depth columns
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// TOML config file (defaults to ./chart_datum.toml when present)
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Water level series: PRE (predicted), OBS (observed) or ALL
    #[arg(long)]
    datatype: Option<String>,

    /// Half width of the query window in minutes
    #[arg(long)]
    interval: Option<i64>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Water level API endpoint
    #[arg(long, value_hint = ValueHint::Url)]
    api_url: Option<String>,

    /// Append log entries to this file
    #[arg(long, value_hint = ValueHint::FilePath)]
    log_file: Option<PathBuf>,

    /// Show per-row debug output
    #[arg(short, long)]
    verbose: bool,

    /// Prefix console log lines with timestamps
    #[arg(long)]
    timestamps: bool,

    /// Write the run report as JSON
    #[arg(long, value_hint = ValueHint::FilePath)]
    summary_json: Option<PathBuf>,
}

impl Cli {
    fn resolve_config(&self) -> Result<AppConfig, RunError> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        config.apply_env()?;

        if let Some(dt) = &self.datatype {
            config.datatype = dt.parse::<DataType>().map_err(RunError::Config)?;
        }
        if let Some(minutes) = self.interval {
            config.window_minutes = minutes;
        }
        if let Some(secs) = self.timeout {
            config.timeout_secs = secs;
        }
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(input) = cli.input.clone() else {
        Cli::command().print_help().ok();
        eprintln!("\nError: too few arguments, please specify an input filename");
        return ExitCode::FAILURE;
    };

    let level = if cli.verbose { LogLevel::Debug } else { LogLevel::Info };
    let log_file = cli.log_file.as_ref().map(|p| p.display().to_string());
    logging::init_logger(level, log_file.as_deref(), cli.timestamps);

    match run(&cli, &input) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, input: &std::path::Path) -> Result<(), RunError> {
    let config = cli.resolve_config()?;
    logging::debug(Stage::System, None, &format!("{:?}", config));

    let source = HttpTideSource::from_config(&config)
        .map_err(|e| RunError::Config(format!("HTTP client: {}", e)))?;

    let run_report = pipeline::run(input, &config, &source)?;
    report::print_summary(&run_report);

    if let Some(path) = &cli.summary_json {
        run_report.save_json(path)?;
    }
    Ok(())
}

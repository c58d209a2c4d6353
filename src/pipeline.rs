/// Chart datum enrichment pipeline.
///
/// Rows are processed one at a time: window → request → parse → select.
/// Each row yields an immutable `RowOutcome`; nothing is shared between rows.
/// After the loop the outcomes are reduced twice, once into the chart datum
/// column and once into the aggregated response document.
///
/// Row-local problems (bad timestamp, network failure, empty response) are
/// logged and end up as an undefined value. Only the conditions in
/// `RunError` stop a run.

use std::path::Path;
use xmltree::Element;

use crate::analysis::chart_datum;
use crate::analysis::selection::{aggregate_fragments, select_value};
use crate::config::AppConfig;
use crate::ingest::tide::{self, TideQuery, TideSource};
use crate::logging::{self, Stage};
use crate::model::{MeasurementRow, RowFailure, RunError, TimeWindow, COL_CHART_DATUM};
use crate::normalize::{self, restore_date_format};
use crate::output::{self, OutputPaths};
use crate::report::{RowFailureRecord, RunReport};
use crate::spreadsheet;
use crate::window::build_window;

// ---------------------------------------------------------------------------
// Per-row processing
// ---------------------------------------------------------------------------

/// Everything the loop learned about one measurement.
#[derive(Debug, Clone)]
pub struct RowOutcome {
    pub index: usize,
    pub window: TimeWindow,
    /// Raw `value` attribute of the selected water level.
    pub tidal_value: Result<String, RowFailure>,
    /// Parsed response document, if the request succeeded.
    pub fragment: Option<Element>,
}

impl RowOutcome {
    pub fn has_tidal_value(&self) -> bool {
        self.tidal_value.is_ok()
    }
}

/// Query the service for one row and pick its water level.
pub fn process_row<S: TideSource>(
    source: &S,
    row: &MeasurementRow,
    config: &AppConfig,
) -> RowOutcome {
    let window = build_window(row, config.window());
    let query = TideQuery::for_row(row, &window, config);
    let label = logging::row_label(row.index);
    logging::debug(Stage::Tide, Some(&label), &tide::build_url(&config.api_url, &query));

    let response = source.fetch(&query).and_then(|body| tide::parse_response(&body));

    let (tidal_value, fragment) = match response {
        Ok(response) => (select_value(&response.points), Some(response.root)),
        Err(e) => {
            logging::log_tide_failure(row.index, "Water level request", &e);
            (Err(RowFailure::Service(e)), None)
        }
    };

    match &tidal_value {
        Ok(value) => logging::debug(Stage::Select, Some(&label), &format!("Water level {} cm", value)),
        Err(RowFailure::NoWaterLevel) => logging::warn(
            Stage::Select,
            Some(&label),
            &format!(
                "No tidal information for point: Time: {} Date: {} Latitude: {} Longitude: {}",
                row.time, row.date, row.latitude, row.longitude
            ),
        ),
        Err(RowFailure::MissingValue) => {
            logging::log_tide_failure(row.index, "Water level selection", &RowFailure::MissingValue)
        }
        Err(RowFailure::Service(_)) => {}
    }

    RowOutcome {
        index: row.index,
        window,
        tidal_value,
        fragment,
    }
}

/// Run every row through `process_row`, strictly in input order.
pub fn enrich_rows<S: TideSource>(
    source: &S,
    rows: &[MeasurementRow],
    config: &AppConfig,
) -> Vec<RowOutcome> {
    rows.iter().map(|row| process_row(source, row, config)).collect()
}

// ---------------------------------------------------------------------------
// Whole run
// ---------------------------------------------------------------------------

/// Load `input`, enrich it and write `<stem>_out.xml` / `<stem>_out.xlsx`
/// next to it.
pub fn run<S: TideSource>(
    input: &Path,
    config: &AppConfig,
    source: &S,
) -> Result<RunReport, RunError> {
    let mut report = RunReport::new(input);

    let table = spreadsheet::read_table(input)?;
    report.summary.rows_loaded = table.rows.len();

    let normalized = normalize::normalize(table, &config.null_sentinel)?;
    report.summary.rows_dropped = normalized.dropped.len();
    report.dropped_rows = normalized.dropped.clone();
    logging::info(
        Stage::Input,
        None,
        &format!(
            "Loaded {} rows from {}, {} usable",
            report.summary.rows_loaded,
            input.display(),
            normalized.rows.len()
        ),
    );

    let outcomes = enrich_rows(source, &normalized.rows, config);

    report.summary.rows_queried = outcomes.len();
    report.summary.sentinel_windows = outcomes.iter().filter(|o| o.window.is_sentinel()).count();
    for (row, outcome) in normalized.rows.iter().zip(&outcomes) {
        if let Err(failure) = &outcome.tidal_value {
            report.failures.push(RowFailureRecord::new(row, failure.to_string()));
        }
    }
    let with_tide = outcomes.iter().filter(|o| o.has_tidal_value()).count();
    report.summary.rows_with_tide = with_tide;
    report.summary.rows_failed = outcomes.len() - with_tide;
    logging::log_batch_summary(outcomes.len(), with_tide, outcomes.len() - with_tide);

    let tidal_values: Vec<Option<&str>> = outcomes
        .iter()
        .map(|o| o.tidal_value.as_deref().ok())
        .collect();
    let column = chart_datum::compute_column(&normalized.rows, &tidal_values, config.unit_factor)?;

    for ((row, raw), datum) in normalized.rows.iter().zip(&tidal_values).zip(&column) {
        if raw.is_some() && datum.is_none() {
            report
                .failures
                .push(RowFailureRecord::new(row, "Non-numeric water level"));
        }
    }

    let paths = OutputPaths::for_input(input);

    let aggregate = aggregate_fragments(outcomes.iter().filter_map(|o| o.fragment.as_ref()));
    if output::save_xml(aggregate.as_ref(), &paths.xml)? {
        report.xml_output = Some(paths.xml.display().to_string());
    }

    let mut table = normalized.table;
    restore_date_format(&mut table);
    table.insert_column(
        config.chart_datum_position,
        COL_CHART_DATUM,
        chart_datum::to_cells(&column),
    );
    spreadsheet::write_table(&table, &paths.xlsx)?;
    logging::info(Stage::Output, None, &format!("Wrote {}", paths.xlsx.display()));
    report.xlsx_output = Some(paths.xlsx.display().to_string());

    Ok(report)
}

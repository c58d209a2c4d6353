/// Query window construction for the water level service.
///
/// Each measurement is matched against the tide series inside a symmetric
/// window around its local timestamp. The service expects minute precision
/// `YYYY-MM-DDTHH:MM` bounds.
///
/// A row whose date or time cannot be parsed is not dropped. It gets a fixed
/// window in the year 1000 for which the service returns no water levels, so
/// the row flows through the rest of the pipeline as an ordinary no-data row.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::logging::{self, Stage};
use crate::model::{MeasurementRow, TimeWindow};

/// Format of the `fromtime`/`totime` query parameters.
pub const WINDOW_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Lower bound substituted for an unparseable row timestamp.
pub const SENTINEL_FROM: &str = "1000-00-00T00:00";

/// Upper bound substituted for an unparseable row timestamp.
pub const SENTINEL_TO: &str = "1000-00-00T00:10";

/// Which side of the window to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Lower,
    Upper,
}

impl Bound {
    fn sentinel(self) -> &'static str {
        match self {
            Bound::Lower => SENTINEL_FROM,
            Bound::Upper => SENTINEL_TO,
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a normalized date (`d m y`, space separated) and an `H:M` time.
///
/// Two-digit years are taken as 20yy. Seconds on the time are tolerated.
pub fn parse_instant(date: &str, time: &str) -> Option<NaiveDateTime> {
    let parts: Vec<&str> = date.split_whitespace().collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };

    let day: u32 = day.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let mut year: i32 = year.parse().ok()?;
    if (0..100).contains(&year) {
        year += 2000;
    }
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let time = time.trim();
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .ok()?;

    Some(date.and_time(time))
}

/// `None` when the shifted instant falls outside chrono's calendar range.
fn shifted(instant: NaiveDateTime, bound: Bound, interval: Duration) -> Option<String> {
    let t = match bound {
        Bound::Lower => instant.checked_sub_signed(interval)?,
        Bound::Upper => instant.checked_add_signed(interval)?,
    };
    Some(t.format(WINDOW_FORMAT).to_string())
}

fn log_bad_timestamp(row: usize, date: &str, time: &str) {
    let label = logging::row_label(row);
    logging::error(
        Stage::Window,
        Some(&label),
        &format!("Time: {} Date: {} has wrong format", time, date),
    );
    logging::info(
        Stage::Window,
        Some(&label),
        "Required time format: H:M, required date format: dd.mm.yy",
    );
}

// ---------------------------------------------------------------------------
// Window builders
// ---------------------------------------------------------------------------

/// One bound of the window for a raw date/time pair.
///
/// Never fails: an unparseable or out of range timestamp is logged against
/// `row` and the bound's sentinel is returned.
pub fn format_bound(row: usize, date: &str, time: &str, bound: Bound, interval: Duration) -> String {
    match parse_instant(date, time).and_then(|instant| shifted(instant, bound, interval)) {
        Some(formatted) => formatted,
        None => {
            log_bad_timestamp(row, date, time);
            bound.sentinel().to_string()
        }
    }
}

/// Both bounds for a measurement, parsing its timestamp once.
pub fn build_window(row: &MeasurementRow, interval: Duration) -> TimeWindow {
    let bounds = parse_instant(&row.date, &row.time).and_then(|instant| {
        Some((
            shifted(instant, Bound::Lower, interval)?,
            shifted(instant, Bound::Upper, interval)?,
        ))
    });
    match bounds {
        Some((from_time, to_time)) => TimeWindow { from_time, to_time },
        None => {
            log_bad_timestamp(row.index, &row.date, &row.time);
            sentinel_window()
        }
    }
}

pub fn sentinel_window() -> TimeWindow {
    TimeWindow {
        from_time: SENTINEL_FROM.to_string(),
        to_time: SENTINEL_TO.to_string(),
    }
}

impl TimeWindow {
    /// True if this window was substituted for a bad timestamp.
    pub fn is_sentinel(&self) -> bool {
        self.from_time == SENTINEL_FROM && self.to_time == SENTINEL_TO
    }
}

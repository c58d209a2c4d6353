/// Water level API client (Kartverket "Se havnivå")
///
/// Retrieves predicted or observed water levels relative to chart datum for
/// an arbitrary coordinate along the Norwegian coast.
///
/// API Documentation: http://api.sehavniva.no/tideapi_protocol.pdf
///
/// A `locationdata` response looks like:
///
/// ```xml
/// <tide>
///   <locationdata>
///     <location name="OSLO" code="OSL" latitude="59.908559" longitude="10.734510"/>
///     <reflevelcode>CD</reflevelcode>
///     <data type="prediction" unit="cm">
///       <waterlevel value="150.2" time="2018-06-01T12:00:00+02:00" flag="pre"/>
///     </data>
///   </locationdata>
/// </tide>
/// ```

use std::time::Duration;
use xmltree::Element;

use crate::config::{AppConfig, DataType};
use crate::model::{MeasurementRow, TidalPoint, TideError, TimeWindow};

// ============================================================================
// Query
// ============================================================================

/// Parameters of one `locationdata` request.
#[derive(Debug, Clone, PartialEq)]
pub struct TideQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub datatype: DataType,
    pub refcode: String,
    pub from_time: String,
    pub to_time: String,
    pub interval: u32,
}

impl TideQuery {
    pub fn for_row(row: &MeasurementRow, window: &TimeWindow, config: &AppConfig) -> Self {
        TideQuery {
            latitude: row.latitude,
            longitude: row.longitude,
            datatype: config.datatype,
            refcode: config.refcode.clone(),
            from_time: window.from_time.clone(),
            to_time: window.to_time.clone(),
            interval: config.api_interval,
        }
    }

    /// Query string pairs in the order the API documents them.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("tide_request", "locationdata".to_string()),
            ("lat", self.latitude.to_string()),
            ("lon", self.longitude.to_string()),
            ("datatype", self.datatype.as_param().to_string()),
            ("refcode", self.refcode.clone()),
            ("fromtime", self.from_time.clone()),
            ("totime", self.to_time.clone()),
            ("interval", self.interval.to_string()),
        ]
    }
}

/// Full request URL, for logging and manual follow-up.
pub fn build_url(base_url: &str, query: &TideQuery) -> String {
    let params: Vec<String> = query
        .params()
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    format!("{}?{}", base_url, params.join("&"))
}

// ============================================================================
// Source abstraction
// ============================================================================

/// Anything that can answer a water level query with a raw response body.
///
/// The enrichment loop only depends on this trait, so it can be driven by
/// the HTTP client in production and by canned responses in tests.
pub trait TideSource {
    fn fetch(&self, query: &TideQuery) -> Result<String, TideError>;
}

/// `TideSource` backed by the live API over blocking HTTP.
pub struct HttpTideSource {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTideSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TideError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TideError::Request(e.to_string()))?;

        Ok(HttpTideSource {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, TideError> {
        Self::new(&config.api_url, Duration::from_secs(config.timeout_secs))
    }
}

impl TideSource for HttpTideSource {
    fn fetch(&self, query: &TideQuery) -> Result<String, TideError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&query.params())
            .header("Accept", "application/xml")
            .send()
            .map_err(|e| TideError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TideError::HttpStatus(response.status().as_u16()));
        }

        response.text().map_err(|e| TideError::Request(e.to_string()))
    }
}

// ============================================================================
// Response parsing
// ============================================================================

/// A parsed API response: the document root plus its water levels in
/// document order.
#[derive(Debug, Clone)]
pub struct TideResponse {
    pub root: Element,
    pub points: Vec<TidalPoint>,
}

pub fn parse_response(body: &str) -> Result<TideResponse, TideError> {
    let root = Element::parse(body.as_bytes()).map_err(|e| TideError::Parse(e.to_string()))?;
    let points = elements_named(&root, "waterlevel")
        .into_iter()
        .map(parse_waterlevel)
        .collect();
    Ok(TideResponse { root, points })
}

fn parse_waterlevel(el: &Element) -> TidalPoint {
    TidalPoint {
        time: el.attributes.get("time").cloned(),
        value: el.attributes.get("value").cloned(),
        flag: el.attributes.get("flag").cloned(),
    }
}

/// All elements called `name` in the tree, the root included, in document
/// (pre-)order.
pub fn elements_named<'a>(root: &'a Element, name: &str) -> Vec<&'a Element> {
    let mut found = Vec::new();
    collect_named(root, name, &mut found);
    found
}

fn collect_named<'a>(el: &'a Element, name: &str, found: &mut Vec<&'a Element>) {
    if el.name == name {
        found.push(el);
    }
    for child in &el.children {
        if let Some(child) = child.as_element() {
            collect_named(child, name, found);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

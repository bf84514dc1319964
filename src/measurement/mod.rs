//! Data loader for the measurement page.
//!
//! Fetches one measurement record, decodes its embedded JSON documents and
//! derives everything the page renders from it.

mod country;
mod runtime;
mod status;

pub use country::*;
pub use runtime::*;
pub use status::*;

use crate::api::{ApiClient, ApiError, EmbeddedJson, MeasurementMeta, MeasurementQuery};
use crate::theme::{TestMetadata, Theme};

const RAW_MEASUREMENT_PATH: &str = "/api/v1/raw_measurement";

/// Everything the measurement page renders.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementProps {
    pub report_id: String,
    pub input: Option<String>,
    pub probe_cc: String,
    pub probe_asn: String,
    pub country: String,
    pub test_name: String,
    pub test_start_time: Option<String>,
    pub measurement_start_time: Option<String>,
    pub category_code: Option<String>,
    pub confirmed: bool,
    pub anomaly: bool,
    pub failure: bool,
    pub scores: Option<EmbeddedJson>,
    pub raw_measurement: Option<EmbeddedJson>,
    pub status: Status,
    pub color: String,
    pub test: TestMetadata,
    /// Formatted `raw_measurement.test_runtime`, when present.
    pub runtime: Option<String>,
    pub download_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MeasurementPage {
    NotFound,
    Found(Box<MeasurementProps>),
}

/// Load the measurement identified by `query`.
///
/// `original_query` is the page's own query string, forwarded as-is to the
/// raw measurement download link.
pub async fn load_measurement(
    client: &ApiClient,
    query: &MeasurementQuery,
    original_query: &[(String, String)],
    theme: &Theme,
) -> Result<MeasurementPage, ApiError> {
    let meta = match client.get_measurement_meta(query).await? {
        Some(meta) => meta,
        None => {
            tracing::info!("Measurement {} not found", query.report_id);
            return Ok(MeasurementPage::NotFound);
        }
    };

    let props = build_props(meta, original_query, client.measurements_url(), theme)?;
    Ok(MeasurementPage::Found(Box::new(props)))
}

/// Derive the page props from a fetched record.
pub fn build_props(
    mut meta: MeasurementMeta,
    original_query: &[(String, String)],
    measurements_url: &str,
    theme: &Theme,
) -> Result<MeasurementProps, ApiError> {
    decode_embedded_fields(&mut meta);

    let country = country_label(&meta.probe_cc).to_string();
    let raw = meta.raw_measurement.as_ref().and_then(EmbeddedJson::as_value);
    let status = classify(&meta, raw, &theme.tests);
    let runtime = raw
        .and_then(|r| r.get("test_runtime"))
        .and_then(|v| v.as_f64())
        .filter(|secs| *secs > 0.0)
        .map(format_runtime);
    let download_url = raw_measurement_url(measurements_url, original_query)?;

    Ok(MeasurementProps {
        country,
        status,
        color: theme.page_colors.for_status(status).to_string(),
        test: theme.tests.lookup(&meta.test_name),
        runtime,
        download_url,
        report_id: meta.report_id,
        input: meta.input,
        probe_cc: meta.probe_cc,
        probe_asn: meta.probe_asn,
        test_name: meta.test_name,
        test_start_time: meta.test_start_time,
        measurement_start_time: meta.measurement_start_time,
        category_code: meta.category_code,
        confirmed: meta.confirmed,
        anomaly: meta.anomaly,
        failure: meta.failure,
        scores: meta.scores,
        raw_measurement: meta.raw_measurement,
    })
}

/// Decode `scores` and `raw_measurement` in place.
///
/// Each field is decoded on its own; a failure is logged and leaves that
/// field in its serialized form. Returns the number of failures.
pub fn decode_embedded_fields(meta: &mut MeasurementMeta) -> usize {
    let mut failures = 0;

    for (name, field) in [
        ("scores", &mut meta.scores),
        ("raw_measurement", &mut meta.raw_measurement),
    ] {
        if let Some(value) = field {
            if let Err(e) = value.decode() {
                tracing::warn!(
                    "Failed to parse JSON in {} of {}: {}",
                    name,
                    meta.report_id,
                    e
                );
                failures += 1;
            }
        }
    }

    failures
}

/// Link to the raw measurement download for the given page query.
pub fn raw_measurement_url(
    measurements_url: &str,
    original_query: &[(String, String)],
) -> Result<String, ApiError> {
    let base = format!("{}{}", measurements_url.trim_end_matches('/'), RAW_MEASUREMENT_PATH);
    let mut url = reqwest::Url::parse(&base).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base, e)))?;

    if !original_query.is_empty() {
        url.query_pairs_mut().extend_pairs(original_query);
    }

    Ok(url.to_string())
}

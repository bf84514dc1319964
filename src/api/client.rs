//! HTTP client for the backend endpoints.

use super::{ApiError, MeasurementMeta, MeasurementQuery, StatPoint, StatQuery, StatsResponse};
use crate::config::ExplorerConfig;

use serde_json::Value;
use std::time::Duration;

const IM_STATS_PATH: &str = "/api/_/im_stats";
const MEASUREMENT_META_PATH: &str = "/api/v1/measurement_meta";

/// Thin wrapper around a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_url: String,
    measurements_url: String,
    timeout: Duration,
}

impl ApiClient {
    /// Create a client for the base URLs in `config`.
    pub fn new(config: &ExplorerConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("ooni-explorer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            measurements_url: config.measurements_url.clone(),
            timeout: config.request_timeout,
        })
    }

    /// Fetch the daily measurement counts for an app in a network.
    pub async fn get_im_stats(&self, query: &StatQuery) -> Result<Vec<StatPoint>, ApiError> {
        let url = format!("{}{}", self.api_url, IM_STATS_PATH);
        tracing::debug!(
            "Fetching app stats for {} {} {}",
            query.probe_cc,
            query.probe_asn,
            query.test_name
        );

        let response = self
            .http
            .get(&url)
            .query(&[
                ("probe_cc", query.probe_cc.as_str()),
                ("probe_asn", query.probe_asn.as_str()),
                ("test_name", query.test_name.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.map_err(e))?;

        let response = check_status(response)?;
        let body: StatsResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        Ok(body.results)
    }

    /// Fetch a single measurement record.
    ///
    /// Returns `Ok(None)` when the backend answers with no payload: an empty
    /// body, `null`, or an empty object.
    pub async fn get_measurement_meta(
        &self,
        query: &MeasurementQuery,
    ) -> Result<Option<MeasurementMeta>, ApiError> {
        let url = format!("{}{}", self.measurements_url, MEASUREMENT_META_PATH);

        let mut params = vec![
            ("report_id", query.report_id.as_str()),
            ("full", "true"),
        ];
        if let Some(input) = query.input.as_deref().filter(|i| !i.is_empty()) {
            params.push(("input", input));
        }

        let response = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| self.map_err(e))?;

        let response = check_status(response)?;
        let body = response.text().await.map_err(|e| self.map_err(e))?;

        parse_measurement_meta(&body)
    }

    /// Base URL of the measurements API.
    pub fn measurements_url(&self) -> &str {
        &self.measurements_url
    }

    fn map_err(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::Status(status.as_u16()))
    }
}

fn parse_measurement_meta(body: &str) -> Result<Option<MeasurementMeta>, ApiError> {
    if body.trim().is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    match &value {
        Value::Null => Ok(None),
        Value::Object(map) if map.is_empty() => Ok(None),
        Value::Object(_) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ApiError::Decode(e.to_string())),
        _ => Err(ApiError::Decode("expected a JSON object".to_string())),
    }
}

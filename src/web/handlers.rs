//! HTTP request handlers.

use super::AppState;
use crate::api::{EmbeddedJson, MeasurementQuery, StatPoint, StatQuery};
use crate::html::{escape_html, render_template};
use crate::measurement::{load_measurement, MeasurementPage, MeasurementProps, Status};
use crate::stats::{AppChart, FetchState, StatFetcher};

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

// ============================================================================
// Templates
// ============================================================================

const LAYOUT_TEMPLATE: &str = include_str!("templates/layout.html");
const MEASUREMENT_TEMPLATE: &str = include_str!("templates/measurement.html");
const NOT_FOUND_TEMPLATE: &str = include_str!("templates/not_found.html");
const ERROR_TEMPLATE: &str = include_str!("templates/error.html");
const INDEX_TEMPLATE: &str = include_str!("templates/index.html");

fn layout(title: &str, color: &str, content: &str) -> String {
    render_template(
        LAYOUT_TEMPLATE,
        &[
            ("title", &escape_html(title)),
            ("color", color),
            ("content", content),
        ],
    )
}

fn error_page(state: &AppState, status: StatusCode, heading: &str, message: &str) -> Response {
    let content = render_template(
        ERROR_TEMPLATE,
        &[
            ("heading", &escape_html(heading)),
            ("message", &escape_html(message)),
        ],
    );
    let page = layout(
        "OONI Explorer",
        &state.theme.page_colors.default,
        &content,
    );
    (status, Html(page)).into_response()
}

// ============================================================================
// Index
// ============================================================================

pub async fn handle_index(State(state): State<AppState>) -> Html<String> {
    Html(layout(
        "OONI Explorer",
        &state.theme.page_colors.default,
        INDEX_TEMPLATE,
    ))
}

// ============================================================================
// Measurement page
// ============================================================================

pub async fn handle_measurement(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let query = match measurement_query(&params) {
        Some(q) => q,
        None => {
            return error_page(
                &state,
                StatusCode::BAD_REQUEST,
                "Missing report ID",
                "A report_id query parameter is required.",
            )
        }
    };

    match load_measurement(&state.client, &query, &params, &state.theme).await {
        Ok(MeasurementPage::Found(props)) => {
            let content = render_measurement(&props);
            Html(layout("OONI Explorer", &props.color, &content)).into_response()
        }
        Ok(MeasurementPage::NotFound) => {
            let content = render_template(
                NOT_FOUND_TEMPLATE,
                &[("report_id", &escape_html(&query.report_id))],
            );
            let page = layout(
                "OONI Explorer",
                &state.theme.page_colors.default,
                &content,
            );
            (StatusCode::NOT_FOUND, Html(page)).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to load measurement {}: {}", query.report_id, e);
            error_page(
                &state,
                StatusCode::BAD_GATEWAY,
                "Something went wrong",
                "The measurement could not be loaded. Please try again later.",
            )
        }
    }
}

fn measurement_query(params: &[(String, String)]) -> Option<MeasurementQuery> {
    let lookup = |name: &str| {
        params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    Some(MeasurementQuery {
        report_id: lookup("report_id")?,
        input: lookup("input"),
    })
}

fn render_measurement(props: &MeasurementProps) -> String {
    let runtime = props
        .runtime
        .as_ref()
        .map(|r| format!(r#"<span class="runtime">Runtime: <b>{}</b></span>"#, escape_html(r)))
        .unwrap_or_default();

    let input_row = props
        .input
        .as_ref()
        .map(|i| format!(r#"<p class="input">Input: <code>{}</code></p>"#, escape_html(i)))
        .unwrap_or_default();

    let raw_measurement = match &props.raw_measurement {
        Some(EmbeddedJson::Decoded(value)) => {
            serde_json::to_string_pretty(value).unwrap_or_default()
        }
        Some(EmbeddedJson::Encoded(text)) => text.clone(),
        None => String::new(),
    };

    render_template(
        MEASUREMENT_TEMPLATE,
        &[
            ("color", &props.color),
            ("status", props.status.as_str()),
            ("status_label", props.status.label()),
            ("country", &escape_html(&props.country)),
            ("probe_cc", &escape_html(&props.probe_cc)),
            ("probe_asn", &escape_html(&props.probe_asn)),
            (
                "test_start_time",
                &escape_html(props.test_start_time.as_deref().unwrap_or("")),
            ),
            ("test_group", &escape_html(&props.test.group_name)),
            ("test_group_color", &props.test.color),
            ("test_info", &escape_html(&props.test.info)),
            ("test_display_name", &escape_html(&props.test.name)),
            ("runtime", &runtime),
            ("summary_text", &escape_html(&summary_text(props))),
            ("input_row", &input_row),
            ("download_url", &escape_html(&props.download_url)),
            ("raw_measurement", &escape_html(&raw_measurement)),
        ],
    )
}

/// One-sentence description of the measurement outcome.
fn summary_text(props: &MeasurementProps) -> String {
    let date = props.test_start_time.as_deref().unwrap_or("an unknown date");
    let target = props.input.as_deref().unwrap_or(&props.test.name);
    let place = format!("in {} on network {}", props.country, props.probe_asn);

    match props.status {
        Status::Confirmed => format!("On {}, {} was blocked {}.", date, target, place),
        Status::Anomaly => format!(
            "On {}, {} presented signs of blocking {}.",
            date, target, place
        ),
        Status::Error => format!(
            "On {}, the {} failed while testing {} {}.",
            date, props.test.name, target, place
        ),
        Status::Down => format!("On {}, {} was down {}.", date, target, place),
        Status::Reachable => format!("On {}, {} was accessible {}.", date, target, place),
        Status::Default => format!("On {}, the {} was run {}.", date, props.test.name, place),
    }
}

// ============================================================================
// App statistics charts
// ============================================================================

static COUNTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{2}$").expect("valid country regex"));
static ASN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i:AS)?(\d{1,10})$").expect("valid ASN regex"));
static TEST_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid test name regex"));

#[derive(Debug, Deserialize)]
pub struct AppChartQuery {
    pub probe_cc: String,
    pub probe_asn: String,
    pub test_name: String,
}

impl AppChartQuery {
    /// Validate and normalize into a [`StatQuery`].
    pub fn validate(&self) -> Result<StatQuery, String> {
        let probe_cc = self.probe_cc.trim();
        if !COUNTRY_RE.is_match(probe_cc) {
            return Err(format!("invalid country code: {}", probe_cc));
        }

        let probe_asn = ASN_RE
            .captures(self.probe_asn.trim())
            .and_then(|c| c.get(1))
            .map(|m| format!("AS{}", m.as_str()))
            .ok_or_else(|| format!("invalid ASN: {}", self.probe_asn))?;

        let test_name = self.test_name.trim();
        if !TEST_NAME_RE.is_match(test_name) {
            return Err(format!("invalid test name: {}", test_name));
        }

        Ok(StatQuery {
            probe_cc: probe_cc.to_ascii_uppercase(),
            probe_asn,
            test_name: test_name.to_string(),
        })
    }
}

/// Run the statistics fetch for a chart request.
///
/// The fetcher lives as long as the handler future; if the client goes away
/// axum drops the future and the outbound request is cancelled with it.
async fn fetch_app_stats(state: &AppState, query: StatQuery) -> Result<Vec<StatPoint>, Response> {
    let fetcher = StatFetcher::activate(state.client.clone(), query);

    match fetcher.wait().await {
        Some(FetchState::Loaded(points)) => Ok(points),
        Some(FetchState::Failed(reason)) => {
            Err((StatusCode::BAD_GATEWAY, reason).into_response())
        }
        Some(FetchState::Loading) | None => {
            Err((StatusCode::SERVICE_UNAVAILABLE, "Request cancelled").into_response())
        }
    }
}

pub async fn handle_app_chart(
    State(state): State<AppState>,
    Query(query): Query<AppChartQuery>,
) -> Response {
    let query = match query.validate() {
        Ok(q) => q,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };

    match fetch_app_stats(&state, query).await {
        Ok(points) => Json(AppChart::from_points(&points)).into_response(),
        Err(response) => response,
    }
}

pub async fn handle_app_chart_svg(
    State(state): State<AppState>,
    Query(query): Query<AppChartQuery>,
) -> Response {
    let query = match query.validate() {
        Ok(q) => q,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };

    match fetch_app_stats(&state, query).await {
        Ok(points) => {
            let svg = AppChart::from_points(&points).to_svg(&state.theme.chart);
            ([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response()
        }
        Err(response) => response,
    }
}

// ============================================================================
// Health
// ============================================================================

pub async fn handle_health() -> impl IntoResponse {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::testutil::{spawn_backend, test_config};
    use crate::theme::Theme;
    use crate::web::routes;
    use axum::{routing::get, Router};
    use serde_json::json;
    use std::sync::Arc;

    async fn spawn_explorer(backend: Router) -> String {
        let backend_url = spawn_backend(backend).await;
        let config = test_config(&backend_url);
        let state = AppState {
            client: ApiClient::new(&config).unwrap(),
            config,
            theme: Arc::new(Theme::default()),
        };
        spawn_backend(routes(state)).await
    }

    fn backend() -> Router {
        Router::new()
            .route(
                "/api/v1/measurement_meta",
                get(|Query(q): Query<Vec<(String, String)>>| async move {
                    let report_id = q
                        .iter()
                        .find(|(k, _)| k == "report_id")
                        .map(|(_, v)| v.clone())
                        .unwrap_or_default();
                    if report_id != "known" {
                        return Json(json!({}));
                    }
                    Json(json!({
                        "report_id": "known",
                        "input": "https://example.org/<script>",
                        "probe_cc": "DE",
                        "probe_asn": 3320,
                        "test_name": "web_connectivity",
                        "test_start_time": "2020-01-01 10:00:00",
                        "confirmed": true,
                        "anomaly": true,
                        "failure": false,
                        "scores": "{broken",
                        "raw_measurement": "{\"test_runtime\": 3.2}",
                    }))
                }),
            )
            .route(
                "/api/_/im_stats",
                get(|| async {
                    Json(json!({"results": [
                        {"test_day": "2020-01-01", "total_count": 5},
                        {"test_day": "2020-01-02", "total_count": 12}
                    ]}))
                }),
            )
    }

    #[test]
    fn test_chart_query_validation() {
        let q = AppChartQuery {
            probe_cc: "it".to_string(),
            probe_asn: "30722".to_string(),
            test_name: "facebook_messenger".to_string(),
        };
        let valid = q.validate().unwrap();
        assert_eq!(valid.probe_cc, "IT");
        assert_eq!(valid.probe_asn, "AS30722");

        let q = AppChartQuery {
            probe_cc: "ITA".to_string(),
            probe_asn: "AS1".to_string(),
            test_name: "signal".to_string(),
        };
        assert!(q.validate().is_err());

        let q = AppChartQuery {
            probe_cc: "IT".to_string(),
            probe_asn: "ASX".to_string(),
            test_name: "signal".to_string(),
        };
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_measurement_query_from_params() {
        let params = vec![
            ("report_id".to_string(), "r1".to_string()),
            ("input".to_string(), "".to_string()),
        ];
        let q = measurement_query(&params).unwrap();
        assert_eq!(q.report_id, "r1");
        assert!(q.input.is_none());

        assert!(measurement_query(&[]).is_none());
    }

    #[tokio::test]
    async fn test_measurement_page() {
        let base = spawn_explorer(backend()).await;
        let response = reqwest::get(format!("{}/measurement?report_id=known&input=x", base))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body = response.text().await.unwrap();
        assert!(body.contains("Confirmed Blocked"));
        assert!(body.contains("Germany"));
        assert!(body.contains("AS3320"));
        assert!(body.contains("3.2s"));
        assert!(body.contains("/api/v1/raw_measurement?report_id=known&amp;input=x"));
        assert!(body.contains("&lt;script&gt;"));
        assert!(!body.contains("<script>"));
    }

    #[tokio::test]
    async fn test_index_page() {
        let base = spawn_explorer(backend()).await;
        let response = reqwest::get(format!("{}/", base)).await.unwrap();
        assert_eq!(response.status(), 200);

        let body = response.text().await.unwrap();
        assert!(body.contains(r#"action="/measurement""#));
        assert!(body.contains(r#"name="report_id""#));
    }

    #[tokio::test]
    async fn test_measurement_not_found_and_bad_request() {
        let base = spawn_explorer(backend()).await;

        let response = reqwest::get(format!("{}/measurement?report_id=nope", base))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
        assert!(response.text().await.unwrap().contains("Measurement not found"));

        let response = reqwest::get(format!("{}/measurement", base)).await.unwrap();
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_app_chart_endpoints() {
        let base = spawn_explorer(backend()).await;

        let chart: serde_json::Value = reqwest::get(format!(
            "{}/api/charts/apps?probe_cc=IT&probe_asn=AS30722&test_name=telegram",
            base
        ))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
        assert_eq!(chart["y_max"], 12);
        assert_eq!(chart["bars"].as_array().unwrap().len(), 2);

        let response = reqwest::get(format!(
            "{}/charts/apps.svg?probe_cc=IT&probe_asn=30722&test_name=telegram",
            base
        ))
        .await
        .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
        assert!(response.text().await.unwrap().starts_with("<svg"));

        let response = reqwest::get(format!(
            "{}/api/charts/apps?probe_cc=Italy&probe_asn=AS30722&test_name=telegram",
            base
        ))
        .await
        .unwrap();
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_app_chart_backend_failure() {
        let broken = Router::new().route(
            "/api/_/im_stats",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let base = spawn_explorer(broken).await;

        let response = reqwest::get(format!(
            "{}/api/charts/apps?probe_cc=IT&probe_asn=AS30722&test_name=telegram",
            base
        ))
        .await
        .unwrap();
        assert_eq!(response.status(), 502);
    }
}

//! Wire types returned by the backend API.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parameters of an app statistics request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatQuery {
    pub probe_cc: String,
    pub probe_asn: String,
    pub test_name: String,
}

/// A single day of the app statistics time series.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatPoint {
    pub test_day: NaiveDate,
    pub total_count: u64,
}

/// Response body of `/api/_/im_stats`.
#[derive(Debug, Deserialize)]
pub struct StatsResponse {
    #[serde(default)]
    pub results: Vec<StatPoint>,
}

/// Identifies a single measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementQuery {
    pub report_id: String,
    pub input: Option<String>,
}

/// A JSON document embedded in the measurement record.
///
/// The backend serializes `scores` and `raw_measurement` as text. They stay
/// `Encoded` until decoded, and remain so when decoding fails.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddedJson {
    Encoded(String),
    Decoded(Value),
}

impl EmbeddedJson {
    /// Decode the serialized form in place.
    ///
    /// Already decoded values are left untouched. On failure the value stays
    /// `Encoded` and the parse error is returned.
    pub fn decode(&mut self) -> Result<(), serde_json::Error> {
        if let EmbeddedJson::Encoded(text) = self {
            let value = serde_json::from_str(text)?;
            *self = EmbeddedJson::Decoded(value);
        }
        Ok(())
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            EmbeddedJson::Decoded(value) => Some(value),
            EmbeddedJson::Encoded(_) => None,
        }
    }
}

impl<'de> Deserialize<'de> for EmbeddedJson {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => EmbeddedJson::Encoded(text),
            other => EmbeddedJson::Decoded(other),
        })
    }
}

/// Measurement record from `/api/v1/measurement_meta`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MeasurementMeta {
    #[serde(default)]
    pub report_id: String,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub probe_cc: String,
    #[serde(default, deserialize_with = "deserialize_asn")]
    pub probe_asn: String,
    #[serde(default)]
    pub test_name: String,
    #[serde(default)]
    pub test_start_time: Option<String>,
    #[serde(default)]
    pub measurement_start_time: Option<String>,
    #[serde(default)]
    pub category_code: Option<String>,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub anomaly: bool,
    #[serde(default)]
    pub failure: bool,
    #[serde(default)]
    pub scores: Option<EmbeddedJson>,
    #[serde(default)]
    pub raw_measurement: Option<EmbeddedJson>,
}

/// Accepts both `12345` and `"AS12345"`, always yielding `AS12345`.
fn deserialize_asn<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => format!("AS{}", n),
        Value::String(s) if s.chars().all(|c| c.is_ascii_digit()) && !s.is_empty() => {
            format!("AS{}", s)
        }
        Value::String(s) => s,
        _ => String::new(),
    })
}

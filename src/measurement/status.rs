//! Classification of a measurement into a single display status.

use crate::api::MeasurementMeta;
use crate::theme::TestCatalog;

use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Default,
    Anomaly,
    Reachable,
    Error,
    Down,
    Confirmed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Default => "default",
            Status::Anomaly => "anomaly",
            Status::Reachable => "reachable",
            Status::Error => "error",
            Status::Down => "down",
            Status::Confirmed => "confirmed",
        }
    }

    /// Headline shown in the page hero.
    pub fn label(self) -> &'static str {
        match self {
            Status::Default => "Measurement",
            Status::Anomaly => "Anomaly",
            Status::Reachable => "Accessible",
            Status::Error => "Error",
            Status::Down => "Website Down",
            Status::Confirmed => "Confirmed Blocked",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the status of a measurement.
///
/// Precedence: confirmed, failure, anomaly, then a web_connectivity site that
/// is down without blocking, then reachable for known tests. Tests missing
/// from `catalog` with no flag set stay `Default`.
pub fn classify(meta: &MeasurementMeta, raw_measurement: Option<&Value>, catalog: &TestCatalog) -> Status {
    if meta.confirmed {
        Status::Confirmed
    } else if meta.failure {
        Status::Error
    } else if meta.anomaly {
        Status::Anomaly
    } else if meta.test_name == "web_connectivity" && is_site_down(raw_measurement) {
        Status::Down
    } else if catalog.contains(&meta.test_name) {
        Status::Reachable
    } else {
        Status::Default
    }
}

fn is_site_down(raw_measurement: Option<&Value>) -> bool {
    let test_keys = match raw_measurement.and_then(|raw| raw.get("test_keys")) {
        Some(keys) => keys,
        None => return false,
    };

    test_keys.get("accessible") == Some(&Value::Bool(false))
        && test_keys.get("blocking") == Some(&Value::Bool(false))
}

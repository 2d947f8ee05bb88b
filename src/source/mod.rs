//! Sensor data sources
//!
//! Readings arrive either from a bundled or on-disk JSON fixture or from a
//! single HTTP GET against the backend. Both deliver the same envelope,
//! `{ "data": [...], "count": n }`; fixtures may also be a bare array.

mod fixture;
#[cfg(feature = "fetch")]
mod remote;

pub use fixture::FixtureSource;
#[cfg(feature = "fetch")]
pub use remote::RemoteSource;

use crate::error::LiwanagError;
use crate::types::{Reading, SensorPayload};
use serde::{Deserialize, Serialize};

/// Sensor-data endpoint of the LIWANAG backend
pub const DEFAULT_API_URL: &str = "https://liwanag-backend.onrender.com/api/v1/check-supabase";

/// Device registry endpoint of the LIWANAG backend
pub const DEFAULT_DEVICES_URL: &str = "https://liwanag-backend.onrender.com/api/v1/devices";

/// Which data source the dashboard is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    Sample,
    Api,
}

impl DataSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceKind::Sample => "sample",
            DataSourceKind::Api => "api",
        }
    }

    /// The other source, as flipped by the data-source toggle
    pub fn toggled(&self) -> Self {
        match self {
            DataSourceKind::Sample => DataSourceKind::Api,
            DataSourceKind::Api => DataSourceKind::Sample,
        }
    }
}

/// Parse a sensor payload, accepting the response envelope or a bare array.
pub fn parse_payload(raw_json: &str) -> Result<SensorPayload, LiwanagError> {
    let value: serde_json::Value = serde_json::from_str(raw_json)?;
    match value {
        serde_json::Value::Array(_) => serde_json::from_value::<Vec<Reading>>(value)
            .map(|data| SensorPayload { data, count: None })
            .map_err(|e| LiwanagError::ParseError(e.to_string())),
        serde_json::Value::Object(_) => serde_json::from_value::<SensorPayload>(value)
            .map_err(|e| LiwanagError::ParseError(e.to_string())),
        other => Err(LiwanagError::ParseError(format!(
            "expected an object or array, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

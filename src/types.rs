//! Core types for LIWANAG
//!
//! This module defines the data structures that flow from ingestion to
//! presentation: raw sensor readings, per-area groups, the statistics derived
//! from them, and the ephemeral points produced for map gradients.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Group name used for readings that carry no area
pub const UNCATEGORIZED_AREA: &str = "Uncategorized";

/// Placeholder shown when no reading in a group names a street
pub const NO_STREET: &str = "N/A";

/// A single illuminance measurement from a street-light sensor.
///
/// Readings are immutable once ingested; a new data load replaces the whole set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Sensor record identifier
    #[serde(deserialize_with = "deserialize_id")]
    pub id: i64,
    /// Latitude (WGS84)
    pub lat: f64,
    /// Longitude (WGS84)
    pub lon: f64,
    /// Illuminance (lux)
    pub lux: u32,
    /// Administrative area (barangay)
    #[serde(
        rename = "barangay",
        alias = "barangay_name",
        alias = "area",
        default
    )]
    pub area: Option<String>,
    /// Street the sensor sits on
    #[serde(alias = "street_name", default)]
    pub street: Option<String>,
    /// Measurement time, ISO-8601 as reported by the device
    pub timestamp: String,
    /// Human-facing sensor label (e.g. "BLG-001")
    #[serde(rename = "sensor_name", default)]
    pub sensor_label: String,
    /// When the backend received the record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
}

impl Reading {
    /// Grouping key: the area name, or [`UNCATEGORIZED_AREA`] when absent or empty.
    pub fn area_key(&self) -> &str {
        match self.area.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => UNCATEGORIZED_AREA,
        }
    }

    /// Street name, treating an empty string as absent.
    pub fn street_name(&self) -> Option<&str> {
        self.street.as_deref().filter(|s| !s.is_empty())
    }

    /// Parse the measurement timestamp.
    ///
    /// Offset-carrying timestamps are converted to UTC; naive timestamps are
    /// taken as-is.
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }
}

/// Parse an ISO-8601 timestamp with or without a UTC offset.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid reading id: {s:?}"))),
    }
}

/// Response envelope of the sensor-data endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorPayload {
    #[serde(default)]
    pub data: Vec<Reading>,
    #[serde(default)]
    pub count: Option<u64>,
}

/// Readings sharing one area, in ingestion order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaGroup {
    pub area_name: String,
    pub readings: Vec<Reading>,
}

impl AreaGroup {
    pub fn new(area_name: impl Into<String>) -> Self {
        Self {
            area_name: area_name.into(),
            readings: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Summary statistics for one area card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaStatistics {
    /// Number of readings in the group
    pub total: usize,
    /// Readings at or above the well-lit threshold
    pub well_lit_count: usize,
    /// Share of well-lit readings (0-100, rounded)
    pub well_lit_percentage: u32,
    /// Mean lux (rounded)
    pub average_lux: u32,
    /// Most frequent street, or "N/A"
    pub dominant_street: String,
    /// Latest measurement time in the group
    pub most_recent_timestamp: Option<NaiveDateTime>,
}

/// Well-lit percentage below which an area needs attention
pub const CRITICAL_PERCENTAGE: u32 = 50;

impl AreaStatistics {
    /// An area is critical when fewer than half of its readings are well lit.
    pub fn is_critical(&self) -> bool {
        self.is_critical_below(CRITICAL_PERCENTAGE)
    }

    /// Critical check against a configurable cut-off
    pub fn is_critical_below(&self, percentage: u32) -> bool {
        self.well_lit_percentage < percentage
    }

    /// Card status text against a configurable cut-off
    pub fn status_below(&self, percentage: u32) -> &'static str {
        if self.is_critical_below(percentage) {
            "Needs Attention"
        } else {
            "Good"
        }
    }
}

/// A point along a street line, produced only while rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InterpolatedPoint {
    pub lat: f64,
    pub lon: f64,
    pub lux: f64,
}

impl From<&Reading> for InterpolatedPoint {
    fn from(reading: &Reading) -> Self {
        Self {
            lat: reading.lat,
            lon: reading.lon,
            lux: f64::from(reading.lux),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reading_json(extra: &str) -> String {
        format!(
            r#"{{"id": 7, "lat": 14.68, "lon": 120.54, "lux": 320,
                "timestamp": "2024-09-27T10:00:00", "sensor_name": "BLG-007"{extra}}}"#
        )
    }

    #[test]
    fn test_reading_from_dashboard_shape() {
        let json = reading_json(r#", "barangay": "Poblacion", "street": "Rizal Street""#);
        let reading: Reading = serde_json::from_str(&json).unwrap();

        assert_eq!(reading.id, 7);
        assert_eq!(reading.area.as_deref(), Some("Poblacion"));
        assert_eq!(reading.street.as_deref(), Some("Rizal Street"));
        assert_eq!(reading.sensor_label, "BLG-007");
        assert!(reading.uploaded_at.is_none());
    }

    #[test]
    fn test_reading_from_map_export_shape() {
        let json = r#"{"id": "42", "lat": 14.0, "lon": 120.0, "lux": 90,
            "street_name": "Capitol Drive", "barangay_name": "Tenejero",
            "timestamp": "2024-09-27T10:00:00Z"}"#;
        let reading: Reading = serde_json::from_str(json).unwrap();

        assert_eq!(reading.id, 42);
        assert_eq!(reading.area_key(), "Tenejero");
        assert_eq!(reading.street_name(), Some("Capitol Drive"));
        assert_eq!(reading.sensor_label, "");
    }

    #[test]
    fn test_bad_string_id_rejected() {
        let json = r#"{"id": "abc", "lat": 0, "lon": 0, "lux": 1, "timestamp": ""}"#;
        assert!(serde_json::from_str::<Reading>(json).is_err());
    }

    #[test]
    fn test_area_key_defaults() {
        let mut reading: Reading = serde_json::from_str(&reading_json(", \"barangay\": null")).unwrap();
        assert_eq!(reading.area_key(), UNCATEGORIZED_AREA);

        reading.area = Some(String::new());
        assert_eq!(reading.area_key(), UNCATEGORIZED_AREA);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 9, 27)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();

        assert_eq!(parse_timestamp("2024-09-27T10:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-09-27 10:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-09-27T10:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-09-27T18:00:00+08:00"), Some(expected));
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn test_status_label() {
        let stats = AreaStatistics {
            total: 2,
            well_lit_count: 0,
            well_lit_percentage: 49,
            average_lux: 120,
            dominant_street: NO_STREET.to_string(),
            most_recent_timestamp: None,
        };
        assert!(stats.is_critical());
        assert_eq!(stats.status_below(CRITICAL_PERCENTAGE), "Needs Attention");

        let stats = AreaStatistics {
            well_lit_percentage: 50,
            ..stats
        };
        assert!(!stats.is_critical());
        assert_eq!(stats.status_below(CRITICAL_PERCENTAGE), "Good");
        assert_eq!(stats.status_below(75), "Needs Attention");
    }
}

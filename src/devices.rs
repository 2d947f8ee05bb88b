//! Device manager view
//!
//! Summarizes the sensor devices registered with the backend: status counts,
//! minutes since each device last checked in, and which online devices have
//! been silent past the offline timeout.
//!
//! "Now" is always passed in, so a summary is reproducible.

use crate::error::LiwanagError;
use crate::types::{deserialize_id, parse_timestamp};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Minutes without a check-in after which an online device counts as offline
pub const DEVICE_TIMEOUT_MINUTES: i64 = 1;

const BUNDLED_DEVICES: &str = include_str!("../data/sample_devices.json");

/// Reported device state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    #[default]
    Offline,
    Collecting,
    Uploading,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Online => "online",
            DeviceStatus::Offline => "offline",
            DeviceStatus::Collecting => "collecting",
            DeviceStatus::Uploading => "uploading",
        }
    }
}

/// A registered street-light sensor device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDevice {
    #[serde(deserialize_with = "deserialize_id")]
    pub device_id: i64,
    pub name: String,
    #[serde(default)]
    pub status: DeviceStatus,
    /// Last check-in, ISO-8601
    pub last_seen: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<String>,
    /// Battery charge in percent, if the device reports it
    #[serde(default)]
    pub battery_level: Option<u32>,
    #[serde(default)]
    pub data_points_collected: u64,
}

impl SensorDevice {
    pub fn parsed_last_seen(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.last_seen)
    }

    /// Whole minutes since the last check-in, truncated toward zero.
    pub fn minutes_since_last_seen(&self, now: NaiveDateTime) -> Option<i64> {
        self.parsed_last_seen()
            .map(|seen| (now - seen).num_minutes())
    }

    /// Online but silent for longer than `timeout_minutes`.
    pub fn is_overdue(&self, now: NaiveDateTime, timeout_minutes: i64) -> bool {
        self.status == DeviceStatus::Online
            && self
                .parsed_last_seen()
                .map_or(false, |seen| now - seen > Duration::minutes(timeout_minutes))
    }
}

/// One row of the device table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceRow {
    pub device_id: i64,
    pub name: String,
    pub status: DeviceStatus,
    pub last_seen: String,
    /// `None` when `last_seen` cannot be parsed
    pub minutes_since_last_seen: Option<i64>,
    pub battery_level: Option<u32>,
    pub data_points_collected: u64,
    pub overdue: bool,
}

/// Device manager page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSummary {
    pub total_devices: usize,
    pub online_devices: usize,
    pub offline_devices: usize,
    /// Online devices past the timeout, by id
    pub overdue_devices: Vec<i64>,
    /// Sorted by device id
    pub devices: Vec<DeviceRow>,
}

/// Build the device manager view as of `now`.
pub fn summarize_devices(
    devices: &[SensorDevice],
    now: NaiveDateTime,
    timeout_minutes: i64,
) -> DeviceSummary {
    let mut rows: Vec<DeviceRow> = devices
        .iter()
        .map(|device| DeviceRow {
            device_id: device.device_id,
            name: device.name.clone(),
            status: device.status,
            last_seen: device.last_seen.clone(),
            minutes_since_last_seen: device.minutes_since_last_seen(now),
            battery_level: device.battery_level,
            data_points_collected: device.data_points_collected,
            overdue: device.is_overdue(now, timeout_minutes),
        })
        .collect();
    rows.sort_by_key(|row| row.device_id);

    let count = |status: DeviceStatus| rows.iter().filter(|r| r.status == status).count();
    let online_devices = count(DeviceStatus::Online);
    let offline_devices = count(DeviceStatus::Offline);
    let overdue_devices: Vec<i64> = rows.iter().filter(|r| r.overdue).map(|r| r.device_id).collect();

    debug!(
        devices = rows.len(),
        online = online_devices,
        overdue = overdue_devices.len(),
        "Summarized devices"
    );
    DeviceSummary {
        total_devices: rows.len(),
        online_devices,
        offline_devices,
        overdue_devices,
        devices: rows,
    }
}

/// Parse a device list: either a bare array or the `/devices` response
/// object with a `devices` array.
pub fn parse_devices(raw_json: &str) -> Result<Vec<SensorDevice>, LiwanagError> {
    let value: Value = serde_json::from_str(raw_json)?;
    let list = match value {
        Value::Array(list) => Value::Array(list),
        Value::Object(mut map) => map.remove("devices").ok_or_else(|| {
            LiwanagError::ParseError("expected a \"devices\" array".to_string())
        })?,
        _ => {
            return Err(LiwanagError::ParseError(
                "expected a device array or { devices } object".to_string(),
            ))
        }
    };
    Ok(serde_json::from_value(list)?)
}

/// Sample device registry shipped with the crate
pub fn bundled_devices() -> Result<Vec<SensorDevice>, LiwanagError> {
    parse_devices(BUNDLED_DEVICES)
}

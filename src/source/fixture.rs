//! JSON fixture source
//!
//! Loads readings from a file on disk or from the Balanga City sample set
//! compiled into the crate.

use crate::error::LiwanagError;
use crate::types::SensorPayload;
use std::borrow::Cow;
use std::path::Path;
use tracing::info;

use super::parse_payload;

const BUNDLED_SAMPLE: &str = include_str!("../../data/sample_readings.json");

/// A JSON document holding sensor readings
#[derive(Debug, Clone)]
pub struct FixtureSource {
    name: String,
    raw: Cow<'static, str>,
}

impl FixtureSource {
    /// Sample readings for the barangays of Balanga City, Bataan
    pub fn bundled() -> Self {
        Self {
            name: "bundled sample".to_string(),
            raw: Cow::Borrowed(BUNDLED_SAMPLE),
        }
    }

    /// Read a fixture file
    pub fn from_path(path: &Path) -> Result<Self, LiwanagError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(Self {
            name: path.display().to_string(),
            raw: Cow::Owned(raw),
        })
    }

    /// Wrap JSON text already in memory (e.g. read from stdin)
    pub fn from_json(name: impl Into<String>, raw: String) -> Self {
        Self {
            name: name.into(),
            raw: Cow::Owned(raw),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parse the fixture into a payload
    pub fn load(&self) -> Result<SensorPayload, LiwanagError> {
        let payload = parse_payload(&self.raw)?;
        info!(source = %self.name, readings = payload.data.len(), "Loaded sensor fixture");
        Ok(payload)
    }
}

//! Dashboard configuration
//!
//! Thresholds, gradient resolution, backend URLs, the device offline timeout
//! and the default map viewport, loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `LIWANAG_CONFIG` environment variable (path to TOML file)
//! 2. `liwanag.toml` in the current working directory
//! 3. Built-in defaults

use crate::aggregator::WELL_LIT_THRESHOLD;
use crate::error::LiwanagError;
use crate::interpolator::DEFAULT_STEPS;
use crate::devices::DEVICE_TIMEOUT_MINUTES;
use crate::source::{DEFAULT_API_URL, DEFAULT_DEVICES_URL};
use crate::types::CRITICAL_PERCENTAGE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "LIWANAG_CONFIG";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "liwanag.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Lux at or above which a reading is well lit
    pub well_lit_threshold: u32,
    /// Areas below this well-lit percentage need attention
    pub critical_percentage: u32,
    /// Segments between consecutive readings on a street line
    pub interpolation_steps: usize,
    /// Sensor-data endpoint
    pub api_url: String,
    /// Device registry endpoint
    pub devices_url: String,
    /// Minutes of silence before an online device is flagged
    pub device_timeout_minutes: i64,
    pub viewport: Viewport,
}

/// Initial map view, centered on Balanga City
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center_lat: 14.6760,
            center_lon: 120.5360,
            zoom: 14,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            well_lit_threshold: WELL_LIT_THRESHOLD,
            critical_percentage: CRITICAL_PERCENTAGE,
            interpolation_steps: DEFAULT_STEPS,
            api_url: DEFAULT_API_URL.to_string(),
            devices_url: DEFAULT_DEVICES_URL.to_string(),
            device_timeout_minutes: DEVICE_TIMEOUT_MINUTES,
            viewport: Viewport::default(),
        }
    }
}

impl DashboardConfig {
    /// Load using the standard search order, falling back to defaults.
    pub fn load() -> Self {
        let env_path = std::env::var(CONFIG_ENV).ok();
        Self::load_from_sources(env_path.as_deref(), Path::new(LOCAL_CONFIG_FILE))
    }

    fn load_from_sources(env_path: Option<&str>, local: &Path) -> Self {
        if let Some(path) = env_path {
            let p = PathBuf::from(path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from {}", CONFIG_ENV);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{} points to a missing file, falling back", CONFIG_ENV);
            }
        }

        if local.exists() {
            match Self::load_from_file(local) {
                Ok(config) => {
                    info!(path = %local.display(), "Loaded local config");
                    return config;
                }
                Err(e) => {
                    warn!(path = %local.display(), error = %e, "Failed to load local config, using defaults");
                }
            }
        }

        info!("No config file found, using built-in defaults");
        Self::default()
    }

    pub fn load_from_file(path: &Path) -> Result<Self, LiwanagError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LiwanagError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&contents)
            .map_err(|e| LiwanagError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(contents: &str) -> Result<Self, LiwanagError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| LiwanagError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, LiwanagError> {
        toml::to_string_pretty(self).map_err(|e| LiwanagError::Config(e.to_string()))
    }

    /// Check value ranges, reporting every problem at once.
    pub fn validate(&self) -> Result<(), LiwanagError> {
        let mut errors = Vec::new();

        if self.interpolation_steps == 0 {
            errors.push("interpolation_steps must be at least 1".to_string());
        }
        if self.critical_percentage > 100 {
            errors.push(format!(
                "critical_percentage ({}) must be within 0-100",
                self.critical_percentage
            ));
        }
        if self.api_url.trim().is_empty() {
            errors.push("api_url must not be empty".to_string());
        }
        if self.devices_url.trim().is_empty() {
            errors.push("devices_url must not be empty".to_string());
        }
        if self.device_timeout_minutes < 1 {
            errors.push(format!(
                "device_timeout_minutes ({}) must be at least 1",
                self.device_timeout_minutes
            ));
        }
        if !(-90.0..=90.0).contains(&self.viewport.center_lat) {
            errors.push(format!(
                "viewport.center_lat ({}) must be within -90..90",
                self.viewport.center_lat
            ));
        }
        if !(-180.0..=180.0).contains(&self.viewport.center_lon) {
            errors.push(format!(
                "viewport.center_lon ({}) must be within -180..180",
                self.viewport.center_lon
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(LiwanagError::Config(errors.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.well_lit_threshold, 300);
        assert_eq!(config.critical_percentage, 50);
        assert_eq!(config.interpolation_steps, 10);
        assert_eq!(config.device_timeout_minutes, 1);
        assert!(config.devices_url.ends_with("/api/v1/devices"));
        assert_eq!(config.viewport.center_lat, 14.6760);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DashboardConfig::from_toml(
            r#"
            well_lit_threshold = 250

            [viewport]
            zoom = 16
            "#,
        )
        .unwrap();

        assert_eq!(config.well_lit_threshold, 250);
        assert_eq!(config.interpolation_steps, DEFAULT_STEPS);
        assert_eq!(config.viewport.zoom, 16);
        assert_eq!(config.viewport.center_lon, 120.5360);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = DashboardConfig {
            interpolation_steps: 4,
            ..Default::default()
        };
        let parsed = DashboardConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validation_collects_errors() {
        let err = DashboardConfig::from_toml(
            r#"
            interpolation_steps = 0
            critical_percentage = 120
            device_timeout_minutes = 0

            [viewport]
            center_lat = 95.0
            "#,
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("interpolation_steps"));
        assert!(message.contains("critical_percentage"));
        assert!(message.contains("center_lat"));
        assert!(message.contains("device_timeout_minutes"));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("liwanag.toml");
        std::fs::write(&path, "well_lit_threshold = 280\ninterpolation_steps = 6\n").expect("write");

        let config = DashboardConfig::load_from_file(&path).expect("load");
        assert_eq!(config.well_lit_threshold, 280);
        assert_eq!(config.interpolation_steps, 6);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_load_from_file_errors_name_the_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("broken.toml");
        std::fs::write(&path, "interpolation_steps = 0\n").expect("write");

        let err = DashboardConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, LiwanagError::Config(_)));
        assert!(err.to_string().contains("broken.toml"));

        let missing = tmp.path().join("absent.toml");
        assert!(matches!(
            DashboardConfig::load_from_file(&missing),
            Err(LiwanagError::Config(_))
        ));
    }

    #[test]
    fn test_env_config_wins_over_local() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let env_file = tmp.path().join("env.toml");
        let local = tmp.path().join("liwanag.toml");
        std::fs::write(&env_file, "well_lit_threshold = 111\n").expect("write");
        std::fs::write(&local, "well_lit_threshold = 222\n").expect("write");

        let env_path = env_file.to_str().expect("utf-8 path");
        let config = DashboardConfig::load_from_sources(Some(env_path), &local);
        assert_eq!(config.well_lit_threshold, 111);

        let config = DashboardConfig::load_from_sources(None, &local);
        assert_eq!(config.well_lit_threshold, 222);
    }

    #[test]
    fn test_load_falls_back() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let local = tmp.path().join("liwanag.toml");
        let missing = tmp.path().join("missing.toml");
        let missing = missing.to_str().expect("utf-8 path");

        // Env file missing, no local file
        let config = DashboardConfig::load_from_sources(Some(missing), &local);
        assert_eq!(config, DashboardConfig::default());

        // Env file missing, local file present
        std::fs::write(&local, "critical_percentage = 40\n").expect("write");
        let config = DashboardConfig::load_from_sources(Some(missing), &local);
        assert_eq!(config.critical_percentage, 40);

        // Env file invalid, local file present
        let bad = tmp.path().join("bad.toml");
        std::fs::write(&bad, "zoom = [").expect("write");
        let config = DashboardConfig::load_from_sources(bad.to_str(), &local);
        assert_eq!(config.critical_percentage, 40);

        // Invalid local file
        std::fs::write(&local, "interpolation_steps = 0\n").expect("write");
        let config = DashboardConfig::load_from_sources(None, &local);
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            DashboardConfig::from_toml("well_lit_threshold = \"bright\""),
            Err(LiwanagError::Config(_))
        ));
    }
}

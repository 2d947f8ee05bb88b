//! LIWANAG - Street-lighting illuminance analytics
//!
//! Turns street-light sensor readings (lux, location, time) into the views of
//! a municipal lighting dashboard: per-barangay analytics cards, a lux
//! classification ladder with display colors, and gradient street lines for
//! the map.
//!
//! ## Modules
//!
//! - **Aggregation**: group readings by area and derive card statistics
//! - **Classification**: map lux onto ten categories with fixed colors
//! - **Interpolation**: subdivide street lines for smooth color gradients
//! - **Dashboard**: view state, data-source toggle and map layers
//! - **Devices**: device manager status summary

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod dashboard;
pub mod devices;
pub mod error;
pub mod interpolator;
pub mod map_layer;
pub mod report;
pub mod source;
pub mod store;
pub mod types;

pub use aggregator::{aggregate, compute_statistics, WELL_LIT_THRESHOLD};
pub use classifier::{classify, LuxCategory};
pub use config::DashboardConfig;
pub use dashboard::Dashboard;
pub use devices::{summarize_devices, DeviceStatus, DeviceSummary, SensorDevice};
pub use error::LiwanagError;
pub use interpolator::{interpolate, street_lines, Interpolation};
pub use types::{AreaGroup, AreaStatistics, InterpolatedPoint, Reading, SensorPayload};

/// Crate version embedded in reports
pub const LIWANAG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "liwanag";

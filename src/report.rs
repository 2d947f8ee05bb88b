//! Report encoding
//!
//! Encodes dashboard views into a versioned JSON report or plain-text cards
//! for terminals.

use crate::dashboard::{AreaCard, AreaDetail, Dashboard, Overview};
use crate::devices::DeviceSummary;
use crate::error::LiwanagError;
use crate::{LIWANAG_VERSION, PRODUCER_NAME};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProvenance {
    /// "sample" or "api"
    pub source: Option<String>,
    pub reading_count: usize,
    /// Record count claimed by the backend, when it sent one
    pub reported_count: Option<u64>,
    pub generated_at_utc: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub provenance: ReportProvenance,
    pub well_lit_threshold: u32,
    pub overview: Overview,
    pub areas: Vec<AreaCard>,
}

/// Encoder for dashboard reports
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn encode(&self, dashboard: &Dashboard) -> DashboardReport {
        DashboardReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: LIWANAG_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            provenance: ReportProvenance {
                source: dashboard
                    .loaded_source()
                    .map(|kind| kind.as_str().to_string()),
                reading_count: dashboard.readings().len(),
                reported_count: dashboard.reported_count(),
                generated_at_utc: Utc::now().to_rfc3339(),
            },
            well_lit_threshold: dashboard.config().well_lit_threshold,
            overview: dashboard.overview(),
            areas: dashboard.area_cards(),
        }
    }

    pub fn encode_to_json(&self, dashboard: &Dashboard, pretty: bool) -> Result<String, LiwanagError> {
        let report = self.encode(dashboard);
        let json = if pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        Ok(json)
    }
}

/// Render analytics cards for a terminal
pub fn render_cards_text(cards: &[AreaCard]) -> String {
    let mut out = String::new();
    for card in cards {
        render_card(&mut out, card);
        out.push('\n');
    }
    out
}

fn render_card(out: &mut String, card: &AreaCard) {
    let stats = &card.statistics;
    let marker = if card.critical { "!" } else { "+" };
    let _ = writeln!(out, "[{marker}] {} ({})", card.name, card.status);
    let _ = writeln!(
        out,
        "    Well-lit: {:>3}%  ({}/{} points)  {}",
        stats.well_lit_percentage,
        stats.well_lit_count,
        stats.total,
        progress_bar(stats.well_lit_percentage)
    );
    let _ = writeln!(out, "    Avg lux:  {}", stats.average_lux);
    let _ = writeln!(out, "    Main street: {}", stats.dominant_street);
    let updated = stats
        .most_recent_timestamp
        .map(|ts| format!("Updated {}", ts.format("%Y-%m-%d")))
        .unwrap_or_else(|| "No data".to_string());
    let _ = writeln!(out, "    {updated}");
}

fn progress_bar(percentage: u32) -> String {
    let filled = (percentage.min(100) / 5) as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(20 - filled))
}

/// Render an area's card and sensor table for a terminal
pub fn render_detail_text(detail: &AreaDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} Details", detail.card.name);
    let _ = writeln!(out, "{}", "=".repeat(detail.card.name.len() + 8));
    render_card(&mut out, &detail.card);
    out.push('\n');

    let _ = writeln!(
        out,
        "{:<10} {:<24} {:>8}  {:<15} {}",
        "SENSOR", "STREET", "LUX", "CATEGORY", "TIMESTAMP"
    );
    for row in &detail.sensors {
        let flag = if row.well_lit { ' ' } else { '*' };
        let _ = writeln!(
            out,
            "{:<10} {:<24} {:>6}lx{flag} {:<15} {}",
            row.sensor_label,
            row.street,
            row.lux,
            row.category.label(),
            row.timestamp
        );
    }
    out
}

/// Render the overview page for a terminal
pub fn render_overview_text(overview: &Overview) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Street Lighting Overview");
    let _ = writeln!(out, "========================");
    let _ = writeln!(out, "Readings:      {}", overview.total_readings);
    let _ = writeln!(out, "Areas:         {}", overview.area_count);
    let _ = writeln!(
        out,
        "Well-lit:      {}% ({} readings)",
        overview.well_lit_percentage, overview.well_lit_count
    );
    let _ = writeln!(out, "Average lux:   {}", overview.average_lux);
    let _ = writeln!(out, "\nLux categories:");
    for c in &overview.categories {
        let _ = writeln!(out, "  {:<15} {}  {:>4}", c.label, c.color, c.count);
    }
    if overview.critical_areas.is_empty() {
        let _ = writeln!(out, "\nNo areas need attention.");
    } else {
        let _ = writeln!(out, "\nNeeds attention ({}):", overview.critical_areas.len());
        for name in &overview.critical_areas {
            let _ = writeln!(out, "  - {name}");
        }
    }
    out
}

/// Render the device manager table for a terminal
pub fn render_devices_text(summary: &DeviceSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Devices: {} total, {} online, {} offline",
        summary.total_devices, summary.online_devices, summary.offline_devices
    );
    let _ = writeln!(
        out,
        "{:<8} {:<12} {:<11} {:>10} {:>8} {:>8}",
        "ID", "NAME", "STATUS", "LAST SEEN", "BATTERY", "POINTS"
    );
    for d in &summary.devices {
        let seen = d
            .minutes_since_last_seen
            .map(|m| format!("{m}m ago"))
            .unwrap_or_else(|| "unknown".to_string());
        let battery = d
            .battery_level
            .map(|b| format!("{b}%"))
            .unwrap_or_else(|| "-".to_string());
        let flag = if d.overdue { "  (overdue)" } else { "" };
        let _ = writeln!(
            out,
            "{:<8} {:<12} {:<11} {:>10} {:>8} {:>8}{flag}",
            d.device_id,
            d.name,
            d.status.as_str(),
            seen,
            battery,
            d.data_points_collected
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> Dashboard {
        let mut dashboard = Dashboard::default();
        dashboard.load_sample().unwrap();
        dashboard
    }

    #[test]
    fn test_encode_report() {
        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let json = encoder.encode_to_json(&loaded(), false).unwrap();
        let report: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(report["report_version"], "1.0.0");
        assert_eq!(report["producer"]["name"], "liwanag");
        assert_eq!(report["producer"]["instance_id"], "test-instance");
        assert_eq!(report["provenance"]["source"], "sample");
        assert_eq!(report["provenance"]["reading_count"], 50);
        assert!(report["provenance"]["reported_count"].is_null());
        assert_eq!(report["well_lit_threshold"], 300);
        assert_eq!(report["areas"].as_array().unwrap().len(), 23);

        let first = &report["areas"][0];
        assert_eq!(first["name"], "Bagong Silang");
        assert_eq!(first["well_lit_percentage"], 100);
        assert!(first["most_recent_timestamp"].is_string());
    }

    #[test]
    fn test_report_carries_backend_count() {
        let payload = crate::source::parse_payload(
            r#"{"data": [{"id": 1, "lat": 14.68, "lon": 120.54, "lux": 320,
                "barangay": "Tuyo", "timestamp": "2024-09-27T10:00:00"}], "count": 7}"#,
        )
        .unwrap();
        let mut dashboard = Dashboard::default();
        dashboard.toggle_source();
        let ticket = dashboard.begin_load();
        assert!(dashboard.finish_load(ticket, Ok(payload)));

        let json = ReportEncoder::new().encode_to_json(&dashboard, false).unwrap();
        let report: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(report["provenance"]["source"], "api");
        assert_eq!(report["provenance"]["reading_count"], 1);
        assert_eq!(report["provenance"]["reported_count"], 7);
    }

    #[test]
    fn test_unique_instance_ids() {
        assert_ne!(ReportEncoder::new().instance_id, ReportEncoder::new().instance_id);
    }

    #[test]
    fn test_render_cards() {
        let dashboard = loaded();
        let text = render_cards_text(&dashboard.area_cards());

        assert!(text.contains("[+] Poblacion (Good)"));
        assert!(text.contains("[!] Dangcol (Needs Attention)"));
        assert!(text.contains("Well-lit:  60%  (3/5 points)"));
        assert!(text.contains("Updated 2024-09-27"));
    }

    #[test]
    fn test_render_detail() {
        let detail = loaded().area_detail("Poblacion").unwrap();
        let text = render_detail_text(&detail);

        assert!(text.starts_with("Poblacion Details\n"));
        assert!(text.contains("BLG-002"));
        assert!(text.contains("Dangerous"));
    }

    #[test]
    fn test_render_overview() {
        let text = render_overview_text(&loaded().overview());
        assert!(text.contains("Readings:      50"));
        assert!(text.contains("Needs attention"));
        assert!(text.contains("- Dangcol"));
    }

    #[test]
    fn test_render_devices() {
        use crate::devices::{bundled_devices, summarize_devices};
        let now = chrono::NaiveDate::from_ymd_opt(2024, 9, 27)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        let summary = summarize_devices(&bundled_devices().unwrap(), now, 1);
        let text = render_devices_text(&summary);

        assert!(text.starts_with("Devices: 5 total, 2 online, 2 offline\n"));
        assert!(text.contains("18m ago"));
        assert!(text.contains("(overdue)"));
        assert_eq!(text.matches("(overdue)").count(), 1);
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0), format!("[{}]", ".".repeat(20)));
        assert_eq!(progress_bar(100), format!("[{}]", "#".repeat(20)));
        assert_eq!(progress_bar(50).matches('#').count(), 10);
    }
}

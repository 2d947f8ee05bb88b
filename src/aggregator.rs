//! Area aggregation
//!
//! This module groups readings by area and derives the per-area statistics
//! shown on analytics cards:
//! - Well-lit count and percentage
//! - Average lux
//! - Dominant street
//! - Most recent measurement

use crate::types::{AreaGroup, AreaStatistics, Reading, NO_STREET};
use std::collections::BTreeMap;
use tracing::debug;

/// Lux at or above which a reading counts as well lit
pub const WELL_LIT_THRESHOLD: u32 = 300;

/// Group readings by area name.
///
/// Readings without an area fall into the "Uncategorized" group. Order within
/// a group follows the input order; groups iterate by area name.
pub fn aggregate(readings: &[Reading]) -> BTreeMap<String, AreaGroup> {
    let mut groups: BTreeMap<String, AreaGroup> = BTreeMap::new();

    for reading in readings {
        let key = reading.area_key();
        groups
            .entry(key.to_string())
            .or_insert_with(|| AreaGroup::new(key))
            .readings
            .push(reading.clone());
    }

    debug!(
        readings = readings.len(),
        areas = groups.len(),
        "Aggregated readings by area"
    );
    groups
}

/// Compute card statistics for one area group.
///
/// Never fails: an empty group yields zeroes, "N/A" and no timestamp.
pub fn compute_statistics(group: &AreaGroup, well_lit_threshold: u32) -> AreaStatistics {
    let readings = &group.readings;
    let total = readings.len();

    let well_lit_count = readings
        .iter()
        .filter(|r| r.lux >= well_lit_threshold)
        .count();

    let (well_lit_percentage, average_lux) = if total == 0 {
        (0, 0)
    } else {
        let lux_sum: u64 = readings.iter().map(|r| u64::from(r.lux)).sum();
        (
            rounded_ratio(100.0 * well_lit_count as f64, total),
            rounded_ratio(lux_sum as f64, total),
        )
    };

    let most_recent_timestamp = readings.iter().filter_map(Reading::parsed_timestamp).max();

    AreaStatistics {
        total,
        well_lit_count,
        well_lit_percentage,
        average_lux,
        dominant_street: dominant_street(readings),
        most_recent_timestamp,
    }
}

fn rounded_ratio(numerator: f64, total: usize) -> u32 {
    (numerator / total as f64).round() as u32
}

/// Most frequent street; ties go to the street seen first.
fn dominant_street(readings: &[Reading]) -> String {
    // (street, count) in first-seen order
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for street in readings.iter().filter_map(Reading::street_name) {
        match counts.iter_mut().find(|(name, _)| *name == street) {
            Some((_, count)) => *count += 1,
            None => counts.push((street, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (street, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((street, count));
        }
    }

    best.map(|(street, _)| street.to_string())
        .unwrap_or_else(|| NO_STREET.to_string())
}

//! Map overlay encoding
//!
//! Renders readings as a GeoJSON `FeatureCollection` that any slippy-map
//! widget can draw: one colored marker per sensor and, per street, a chain of
//! short line segments colored by interpolated lux.

use crate::classifier::classify;
use crate::config::Viewport;
use crate::interpolator::street_lines;
use crate::types::Reading;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Line style shared by all gradient segments
pub const LINE_WEIGHT: u32 = 3;
pub const LINE_OPACITY: f64 = 0.7;

/// Which overlays are visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapLayers {
    pub markers: bool,
    pub street_lines: bool,
}

impl Default for MapLayers {
    fn default() -> Self {
        Self {
            markers: true,
            street_lines: true,
        }
    }
}

/// Build the GeoJSON overlay for a reading set.
pub fn build_map_layer(
    readings: &[Reading],
    layers: MapLayers,
    steps: usize,
    viewport: &Viewport,
) -> Value {
    let mut features = Vec::new();

    // Lines first so markers draw on top
    if layers.street_lines {
        for line in street_lines(readings, steps) {
            for (index, segment) in line.segments.iter().enumerate() {
                features.push(json!({
                    "type": "Feature",
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [
                            [segment.from.lon, segment.from.lat],
                            [segment.to.lon, segment.to.lat],
                        ],
                    },
                    "properties": {
                        "kind": "street_segment",
                        "street": line.street,
                        "segment": index,
                        "lux": segment.from.lux,
                        "category": segment.category,
                        "color": segment.color(),
                        "weight": LINE_WEIGHT,
                        "opacity": LINE_OPACITY,
                    },
                }));
            }
        }
    }

    if layers.markers {
        features.extend(readings.iter().map(marker_feature));
    }

    json!({
        "type": "FeatureCollection",
        "properties": {
            "center": [viewport.center_lat, viewport.center_lon],
            "zoom": viewport.zoom,
            "layers": layers,
        },
        "features": features,
    })
}

fn marker_feature(reading: &Reading) -> Value {
    let category = classify(f64::from(reading.lux));
    json!({
        "type": "Feature",
        "geometry": {
            "type": "Point",
            "coordinates": [reading.lon, reading.lat],
        },
        "properties": {
            "kind": "sensor",
            "id": reading.id,
            "sensor": reading.sensor_label,
            "street": reading.street,
            "area": reading.area,
            "lux": reading.lux,
            "category": category,
            "color": category.color(),
            "tooltip": format!("{} lx", reading.lux),
        },
    })
}

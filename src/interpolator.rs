//! Street gradient interpolation
//!
//! Subdivides the line between consecutive readings on a street into short
//! segments so that per-segment coloring approximates a continuous gradient.

use crate::classifier::{classify, LuxCategory};
use crate::types::{InterpolatedPoint, Reading};
use serde::Serialize;

/// Default number of segments between two readings
pub const DEFAULT_STEPS: usize = 10;

/// Lazy, restartable sequence of `steps + 1` evenly spaced points from
/// `start` to `end` inclusive.
#[derive(Debug, Clone)]
pub struct Interpolation {
    start: InterpolatedPoint,
    end: InterpolatedPoint,
    steps: usize,
    next: usize,
    back: usize,
}

impl Interpolation {
    pub fn new(start: InterpolatedPoint, end: InterpolatedPoint, steps: usize) -> Self {
        let steps = steps.max(1);
        Self {
            start,
            end,
            steps,
            next: 0,
            back: steps + 1,
        }
    }

    /// Number of segments (one less than the number of points)
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Point `i` of the sequence, independent of iteration state
    pub fn point(&self, i: usize) -> Option<InterpolatedPoint> {
        if i > self.steps {
            return None;
        }
        if i == self.steps {
            return Some(self.end);
        }
        let f = i as f64 / self.steps as f64;
        Some(InterpolatedPoint {
            lat: lerp(self.start.lat, self.end.lat, f),
            lon: lerp(self.start.lon, self.end.lon, f),
            lux: lerp(self.start.lux, self.end.lux, f),
        })
    }

    /// Rewind to the first point
    pub fn restart(&mut self) {
        self.next = 0;
        self.back = self.steps + 1;
    }
}

fn lerp(a: f64, b: f64, f: f64) -> f64 {
    a + (b - a) * f
}

impl Iterator for Interpolation {
    type Item = InterpolatedPoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.back {
            return None;
        }
        let point = self.point(self.next);
        self.next += 1;
        point
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for Interpolation {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.next >= self.back {
            return None;
        }
        self.back -= 1;
        self.point(self.back)
    }
}

impl ExactSizeIterator for Interpolation {}

/// Interpolate between two readings.
///
/// `steps` of zero is treated as one so the result always contains both
/// endpoints.
pub fn interpolate(start: &Reading, end: &Reading, steps: usize) -> Interpolation {
    Interpolation::new(start.into(), end.into(), steps)
}

/// One colored piece of a street line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientSegment {
    pub from: InterpolatedPoint,
    pub to: InterpolatedPoint,
    /// Category of the segment's starting lux
    pub category: LuxCategory,
}

impl GradientSegment {
    pub fn color(&self) -> &'static str {
        self.category.color()
    }
}

/// All gradient segments drawn for one street
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreetLine {
    pub street: String,
    pub segments: Vec<GradientSegment>,
}

/// Build gradient lines for every street.
///
/// Streets appear in first-seen order and readings keep their input order
/// along the street. Readings without a street are not drawn; a street with a
/// single reading yields no segments.
pub fn street_lines(readings: &[Reading], steps: usize) -> Vec<StreetLine> {
    let mut streets: Vec<(&str, Vec<&Reading>)> = Vec::new();

    for reading in readings {
        let Some(street) = reading.street_name() else {
            continue;
        };
        match streets.iter_mut().find(|(name, _)| *name == street) {
            Some((_, members)) => members.push(reading),
            None => streets.push((street, vec![reading])),
        }
    }

    streets
        .into_iter()
        .map(|(street, members)| StreetLine {
            street: street.to_string(),
            segments: members
                .windows(2)
                .flat_map(|pair| gradient_segments(pair[0], pair[1], steps))
                .collect(),
        })
        .collect()
}

fn gradient_segments(start: &Reading, end: &Reading, steps: usize) -> Vec<GradientSegment> {
    let points: Vec<InterpolatedPoint> = interpolate(start, end, steps).collect();
    points
        .windows(2)
        .map(|pair| GradientSegment {
            from: pair[0],
            to: pair[1],
            category: classify(pair[0].lux),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(lat: f64, lon: f64, lux: u32, street: Option<&str>) -> Reading {
        Reading {
            id: 0,
            lat,
            lon,
            lux,
            area: None,
            street: street.map(str::to_string),
            timestamp: String::new(),
            sensor_label: String::new(),
            uploaded_at: None,
        }
    }

    #[test]
    fn test_midpoint() {
        let points: Vec<_> = interpolate(&at(0.0, 0.0, 0, None), &at(10.0, 0.0, 100, None), 10).collect();

        assert_eq!(points.len(), 11);
        assert_eq!(
            points[5],
            InterpolatedPoint {
                lat: 5.0,
                lon: 0.0,
                lux: 50.0
            }
        );
    }

    #[test]
    fn test_endpoints_exact() {
        let a = at(14.680598, 120.543051, 850, None);
        let b = at(14.681123, 120.543789, 900, None);

        for steps in [1, 3, 7, 10, 33] {
            let points: Vec<_> = interpolate(&a, &b, steps).collect();
            assert_eq!(points.len(), steps + 1);
            assert_eq!(points[0], InterpolatedPoint::from(&a));
            assert_eq!(points[steps], InterpolatedPoint::from(&b));
        }
    }

    #[test]
    fn test_zero_steps_clamped() {
        let interpolation = interpolate(&at(0.0, 0.0, 0, None), &at(1.0, 1.0, 10, None), 0);
        assert_eq!(interpolation.steps(), 1);
        assert_eq!(interpolation.len(), 2);
    }

    #[test]
    fn test_restartable() {
        let mut interpolation = interpolate(&at(0.0, 0.0, 0, None), &at(4.0, 0.0, 40, None), 4);
        let copy = interpolation.clone();

        let first: Vec<_> = interpolation.by_ref().collect();
        assert_eq!(interpolation.next(), None);

        interpolation.restart();
        let second: Vec<_> = interpolation.collect();
        let third: Vec<_> = copy.collect();

        assert_eq!(first, second);
        assert_eq!(first, third);
    }

    #[test]
    fn test_reverse_iteration() {
        let interpolation = interpolate(&at(0.0, 0.0, 0, None), &at(2.0, 0.0, 20, None), 2);
        let lats: Vec<f64> = interpolation.rev().map(|p| p.lat).collect();
        assert_eq!(lats, vec![2.0, 1.0, 0.0]);
    }

    #[test]
    fn test_street_lines_grouping() {
        let readings = vec![
            at(0.0, 0.0, 50, Some("Rizal Street")),
            at(0.0, 1.0, 500, Some("Capitol Drive")),
            at(1.0, 0.0, 150, Some("Rizal Street")),
            at(5.0, 5.0, 900, None),
            at(2.0, 0.0, 950, Some("Rizal Street")),
        ];

        let lines = street_lines(&readings, DEFAULT_STEPS);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].street, "Rizal Street");
        assert_eq!(lines[0].segments.len(), 2 * DEFAULT_STEPS);
        assert_eq!(lines[1].street, "Capitol Drive");
        assert!(lines[1].segments.is_empty());

        let first = &lines[0].segments[0];
        assert_eq!(first.category, LuxCategory::Dangerous);
        assert_eq!(first.color(), "#FF0000");
        // segments chain end to start
        for pair in lines[0].segments.windows(2) {
            assert_eq!(pair[0].to, pair[1].from);
        }
        let last = lines[0].segments.last().unwrap();
        assert_eq!(last.to.lux, 950.0);
        assert_eq!(last.category, classify(last.from.lux));
    }

    #[test]
    fn test_segment_color_uses_start_lux() {
        let readings = vec![
            at(0.0, 0.0, 290, Some("Farm Road")),
            at(1.0, 0.0, 310, Some("Farm Road")),
        ];
        let lines = street_lines(&readings, 2);
        let categories: Vec<_> = lines[0].segments.iter().map(|s| s.category).collect();

        assert_eq!(categories, vec![LuxCategory::Poor, LuxCategory::BelowStandard]);
    }
}

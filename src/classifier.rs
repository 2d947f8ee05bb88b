//! Lux classification
//!
//! Maps an illuminance value onto a fixed ladder of ten visual categories,
//! each with a display color used by markers and street gradients.

use serde::{Deserialize, Serialize};

/// Illuminance category, ordered from worst to best lighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LuxCategory {
    Dangerous,
    VeryPoor,
    Poor,
    BelowStandard,
    Fair,
    Moderate,
    Good,
    VeryGood,
    Excellent,
    Optimal,
}

/// Exclusive upper bounds of every category except the last
const LADDER: [(f64, LuxCategory); 9] = [
    (100.0, LuxCategory::Dangerous),
    (200.0, LuxCategory::VeryPoor),
    (300.0, LuxCategory::Poor),
    (400.0, LuxCategory::BelowStandard),
    (500.0, LuxCategory::Fair),
    (600.0, LuxCategory::Moderate),
    (700.0, LuxCategory::Good),
    (800.0, LuxCategory::VeryGood),
    (900.0, LuxCategory::Excellent),
];

impl LuxCategory {
    /// Every category, worst first
    pub const ALL: [LuxCategory; 10] = [
        LuxCategory::Dangerous,
        LuxCategory::VeryPoor,
        LuxCategory::Poor,
        LuxCategory::BelowStandard,
        LuxCategory::Fair,
        LuxCategory::Moderate,
        LuxCategory::Good,
        LuxCategory::VeryGood,
        LuxCategory::Excellent,
        LuxCategory::Optimal,
    ];

    /// Display color as a hex string
    pub fn color(&self) -> &'static str {
        match self {
            LuxCategory::Dangerous => "#FF0000",
            LuxCategory::VeryPoor => "#FF4444",
            LuxCategory::Poor => "#FF8800",
            LuxCategory::BelowStandard => "#FFBB33",
            LuxCategory::Fair => "#FFD700",
            LuxCategory::Moderate => "#FFEB3B",
            LuxCategory::Good => "#76FF03",
            LuxCategory::VeryGood => "#00E676",
            LuxCategory::Excellent => "#00C851",
            LuxCategory::Optimal => "#00B248",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LuxCategory::Dangerous => "Dangerous",
            LuxCategory::VeryPoor => "Very Poor",
            LuxCategory::Poor => "Poor",
            LuxCategory::BelowStandard => "Below Standard",
            LuxCategory::Fair => "Fair",
            LuxCategory::Moderate => "Moderate",
            LuxCategory::Good => "Good",
            LuxCategory::VeryGood => "Very Good",
            LuxCategory::Excellent => "Excellent",
            LuxCategory::Optimal => "Optimal",
        }
    }

    /// 0 for the worst category up to 9 for the best
    pub fn severity(&self) -> u8 {
        *self as u8
    }

    /// Lux range covered by this category as `(lower, upper)`; upper is exclusive
    pub fn range(&self) -> (Option<f64>, Option<f64>) {
        let idx = self.severity() as usize;
        let lower = idx.checked_sub(1).map(|i| LADDER[i].0);
        let upper = LADDER.get(idx).map(|(bound, _)| *bound);
        (lower, upper)
    }
}

impl std::fmt::Display for LuxCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a lux value.
///
/// Total over all inputs. Anything below 100 lux, negatives included, is
/// `Dangerous`; NaN is treated the same way.
pub fn classify(lux: f64) -> LuxCategory {
    if lux.is_nan() {
        return LuxCategory::Dangerous;
    }
    LADDER
        .iter()
        .find(|(bound, _)| lux < *bound)
        .map(|(_, category)| *category)
        .unwrap_or(LuxCategory::Optimal)
}

/// Display color for a lux value
pub fn lux_color(lux: f64) -> &'static str {
    classify(lux).color()
}

/// Whether a reading meets the well-lit threshold (inclusive)
pub fn is_well_lit(lux: u32, threshold: u32) -> bool {
    lux >= threshold
}

//! Core data structures and types for power-quality analysis.
//!
//! Defines the measurement categories, per-column statistics and the
//! small value objects produced by the threshold calculations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Measurement categories processed by the pipeline
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Voltage,
    VoltageUnbalance,
    Current,
    CurrentUnbalance,
    Power,
    PowerFactor,
    VoltageDistortion,
    VoltageHarmonics,
    CurrentDistortion,
    CurrentHarmonics,
    KFactor,
    TddLoading,
    Energy,
}

impl Category {
    /// Every category, in report order
    pub const ALL: [Category; 13] = [
        Category::Voltage,
        Category::VoltageUnbalance,
        Category::Current,
        Category::CurrentUnbalance,
        Category::Power,
        Category::PowerFactor,
        Category::VoltageDistortion,
        Category::VoltageHarmonics,
        Category::CurrentDistortion,
        Category::CurrentHarmonics,
        Category::KFactor,
        Category::TddLoading,
        Category::Energy,
    ];

    /// Stable identifier used on the command line and in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Voltage => "voltage",
            Category::VoltageUnbalance => "voltage-unbalance",
            Category::Current => "current",
            Category::CurrentUnbalance => "current-unbalance",
            Category::Power => "power",
            Category::PowerFactor => "power-factor",
            Category::VoltageDistortion => "voltage-distortion",
            Category::VoltageHarmonics => "voltage-harmonics",
            Category::CurrentDistortion => "current-distortion",
            Category::CurrentHarmonics => "current-harmonics",
            Category::KFactor => "k-factor",
            Category::TddLoading => "tdd-loading",
            Category::Energy => "energy",
        }
    }

    /// Human-readable title for reports
    pub fn title(&self) -> &'static str {
        match self {
            Category::Voltage => "Voltage",
            Category::VoltageUnbalance => "Voltage unbalance",
            Category::Current => "Current",
            Category::CurrentUnbalance => "Current unbalance",
            Category::Power => "Active, reactive and apparent power",
            Category::PowerFactor => "Power factor",
            Category::VoltageDistortion => "Voltage distortion (THD-V)",
            Category::VoltageHarmonics => "Voltage harmonics",
            Category::CurrentDistortion => "Current distortion (THD-A)",
            Category::CurrentHarmonics => "Current harmonics",
            Category::KFactor => "K-factor",
            Category::TddLoading => "TDD loading",
            Category::Energy => "Energy",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "Unknown category '{}', expected one of: {}",
                    s,
                    Category::ALL.map(|c| c.as_str()).join(", ")
                )
            })
    }
}

/// The four summary statistics kept for each measured column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub percentile_95: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl ColumnStats {
    /// Statistics in display order: percentile, mean, min, max
    pub fn as_array(&self) -> [f64; 4] {
        [self.percentile_95, self.mean, self.min, self.max]
    }
}

/// A named scalar, e.g. the percentile of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledValue {
    pub label: String,
    pub value: f64,
}

impl LabeledValue {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Acceptable voltage range around the nominal value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoltageBand {
    pub lower: f64,
    pub upper: f64,
}

impl VoltageBand {
    /// Band as the two-element limits list expected by the band check
    pub fn as_limits(&self) -> [f64; 2] {
        [self.lower, self.upper]
    }
}

/// Individual current-harmonic limits (% of demand current) per order band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarmonicLimits {
    #[serde(rename = "ARM_0_10")]
    pub band_0_10: f64,
    #[serde(rename = "ARM_11_16")]
    pub band_11_16: f64,
    #[serde(rename = "ARM_17_22")]
    pub band_17_22: f64,
    #[serde(rename = "ARM_23_34")]
    pub band_23_34: f64,
    #[serde(rename = "ARM_35")]
    pub band_35: f64,
}

/// Transformer loadability and remaining headroom, both in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Loadability {
    pub loadability_pct: f64,
    pub headroom_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_through_identifier() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert_eq!("TDD_LOADING".parse::<Category>().unwrap(), Category::TddLoading);
        assert!("frequency".parse::<Category>().is_err());
    }

    #[test]
    fn test_harmonic_limits_serialize_with_band_keys() {
        let limits = HarmonicLimits {
            band_0_10: 7.0,
            band_11_16: 3.5,
            band_17_22: 2.5,
            band_23_34: 1.0,
            band_35: 0.5,
        };
        let json = serde_json::to_value(limits).unwrap();
        assert_eq!(json["ARM_0_10"], 7.0);
        assert_eq!(json["ARM_35"], 0.5);
    }
}

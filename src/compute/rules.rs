//! Thresholds used by the electrical rules.
use serde::{Deserialize, Serialize};

/// Rule thresholds. Every field falls back to its default when absent from a
/// configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Minimum LDO headroom above `vout` (V).
    pub ldo_dropout_margin: f64,
    /// Regulator input must be at least `vin_min * vin_min_margin`.
    pub vin_min_margin: f64,
    /// Regulator input must be at most `vin_max * vin_max_margin`.
    pub vin_max_margin: f64,
    /// Fraction of a source's rating above which a soft warning is raised.
    pub supply_warning_ratio: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            ldo_dropout_margin: 0.1,
            vin_min_margin: 1.05,
            vin_max_margin: 0.95,
            supply_warning_ratio: 0.9,
        }
    }
}

impl RuleConfig {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// The regulator input band `[low, high]` after applying the safety margins.
    pub fn input_band(&self, vin_min: f64, vin_max: f64) -> (f64, f64) {
        (vin_min * self.vin_min_margin, vin_max * self.vin_max_margin)
    }
}

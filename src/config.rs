use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::DEFAULT_THRESHOLD;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Settings – analysis knobs, passed explicitly to a Session
// ---------------------------------------------------------------------------

/// User-tunable analysis parameters.
///
/// Loaded from a JSON file where every field is optional:
///
/// ```json
/// { "threshold": 2.5, "moving_average_window": 7 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Z-score cutoff in standard deviations. Sign is not checked.
    pub threshold: f64,
    /// Trailing window for the moving-average baseline.
    pub moving_average_window: usize,
    /// Absolute distance from the moving average that counts as a deviation.
    pub baseline_threshold: f64,
    /// Longest lag tested for seasonality.
    pub seasonality_period: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            moving_average_window: 5,
            baseline_threshold: 5.0,
            seasonality_period: 7,
        }
    }
}

impl Settings {
    /// Read settings from a JSON file and validate them.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(text)?;
        settings.validate()?;
        log::debug!("settings: {settings:?}");
        Ok(settings)
    }

    /// Reject values no computation can use. A zero or negative threshold is
    /// allowed; it only makes detection more sensitive.
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() {
            return Err(Error::InvalidSetting {
                name: "threshold",
                reason: "must be a finite number".to_string(),
            });
        }
        if !self.baseline_threshold.is_finite() {
            return Err(Error::InvalidSetting {
                name: "baseline_threshold",
                reason: "must be a finite number".to_string(),
            });
        }
        if self.moving_average_window == 0 {
            return Err(Error::InvalidSetting {
                name: "moving_average_window",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.seasonality_period == 0 {
            return Err(Error::InvalidSetting {
                name: "seasonality_period",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

use serde::{Deserialize, Serialize};

use super::stats::{mean, scale_of, std_dev};

/// Conventional outlier cutoff: three standard deviations.
pub const DEFAULT_THRESHOLD: f64 = 3.0;

// ---------------------------------------------------------------------------
// AnomalyReport – aggregate verdict for one series at one threshold
// ---------------------------------------------------------------------------

/// Which points of a series were flagged, and a one-line summary.
///
/// `detected` is true exactly when `indices` is non-empty. Indices are
/// ascending positions into the scored series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub detected: bool,
    pub indices: Vec<usize>,
    pub explanation: String,
}

impl AnomalyReport {
    fn empty_input() -> Self {
        Self {
            detected: false,
            indices: Vec::new(),
            explanation: "No data points provided for analysis.".to_string(),
        }
    }

    fn nothing_found() -> Self {
        Self {
            detected: false,
            indices: Vec::new(),
            explanation: "No significant deviations detected.".to_string(),
        }
    }

    fn found(indices: Vec<usize>, threshold: f64) -> Self {
        let explanation = format!(
            "Found {} points that deviate significantly from the mean \
             (beyond {threshold} standard deviations).",
            indices.len()
        );
        Self {
            detected: true,
            indices,
            explanation,
        }
    }

    /// Number of flagged points.
    pub fn count(&self) -> usize {
        self.indices.len()
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Z-score magnitude of every observation: `|v - mean| / std_dev`.
///
/// Uses the population standard deviation over the whole series. The result
/// is aligned by position with `series` and is empty for an empty series.
///
/// A series with no spread (every value identical, which includes a single
/// observation) has no meaningful deviation, so every point scores `0.0`
/// instead of the `NaN`/`inf` a plain division would give.
///
/// Scores do not change when every value is multiplied by the same factor,
/// so very large or very small series are scored on `v / max|v|`. Finite
/// input always gives finite scores.
pub fn score(series: &[f64]) -> Vec<f64> {
    let Some(&first) = series.first() else {
        return Vec::new();
    };
    // Identical values can still leave rounding residue in sigma.
    if series.iter().all(|&v| v == first) {
        return vec![0.0; series.len()];
    }

    let scale = scale_of(series);
    let scaled: Vec<f64> = series.iter().map(|v| v / scale).collect();
    let mu = mean(&scaled);
    let sigma = std_dev(&scaled);
    if sigma == 0.0 {
        return vec![0.0; series.len()];
    }

    scaled.iter().map(|&v| (v - mu).abs() / sigma).collect()
}

/// Flag every observation whose score is strictly above `threshold`.
///
/// The threshold is not validated: zero or negative values are accepted and
/// simply flag more points. Callers that want the conventional cutoff pass
/// [`DEFAULT_THRESHOLD`].
pub fn detect(series: &[f64], threshold: f64) -> AnomalyReport {
    if series.is_empty() {
        return AnomalyReport::empty_input();
    }

    let indices: Vec<usize> = score(series)
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s > threshold)
        .map(|(i, _)| i)
        .collect();

    log::debug!(
        "z-score detect: {} of {} points above {threshold}",
        indices.len(),
        series.len()
    );

    if indices.is_empty() {
        AnomalyReport::nothing_found()
    } else {
        AnomalyReport::found(indices, threshold)
    }
}

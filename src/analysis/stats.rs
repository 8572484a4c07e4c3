use serde::Serialize;

/// Peak magnitudes outside `[SAFE_MIN, SAFE_MAX]` are divided out before
/// summing or squaring, so neither the sum nor the squares leave `f64` range.
const SAFE_MIN: f64 = 1e-100;
const SAFE_MAX: f64 = 1e100;

/// Divisor that brings `values` into a range where sums of squares stay
/// finite and non-zero. `1.0` for ordinary magnitudes, otherwise the largest
/// absolute value.
pub fn scale_of(values: &[f64]) -> f64 {
    let peak = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if peak == 0.0 || !peak.is_finite() || (SAFE_MIN..=SAFE_MAX).contains(&peak) {
        1.0
    } else {
        peak
    }
}

fn scaled_mean(values: &[f64], scale: f64) -> f64 {
    values.iter().map(|v| v / scale).sum::<f64>() / values.len() as f64
}

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let scale = scale_of(values);
    scale * scaled_mean(values, scale)
}

/// Population standard deviation; `0.0` for an empty slice.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let scale = scale_of(values);
    let mu = scaled_mean(values, scale);
    let sq_diff: f64 = values.iter().map(|v| (v / scale - mu).powi(2)).sum();
    scale * (sq_diff / values.len() as f64).sqrt()
}

/// Descriptive statistics shown next to a loaded series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

impl Summary {
    /// `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        Some(Summary {
            count: values.len(),
            mean: mean(values),
            min,
            max,
            std_dev: std_dev(values),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std_dev(&[]), 0.0);
        assert!(Summary::from_values(&[]).is_none());
    }

    #[test]
    fn population_std_dev() {
        // Classic example: mean 5, population sd 2.
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&v), 5.0);
        assert_eq!(std_dev(&v), 2.0);
    }

    #[test]
    fn extreme_magnitudes_stay_finite() {
        assert_eq!(mean(&[1e200, -1e200]), 0.0);
        assert_eq!(std_dev(&[1e200, -1e200]), 1e200);

        let huge = [1.5e308, 1.0e308, 0.0];
        assert!(mean(&huge).is_finite());
        assert!(std_dev(&huge).is_finite());
        assert!((mean(&huge) - (1.5e308 / 3.0 + 1.0e308 / 3.0)).abs() < 1e295);

        assert_eq!(std_dev(&[1e-200, -1e-200]), 1e-200);
    }

    #[test]
    fn summary_tracks_extremes() {
        let s = Summary::from_values(&[3.0, -1.0, 8.0]).unwrap();
        assert_eq!(s.count, 3);
        assert_eq!(s.min, -1.0);
        assert_eq!(s.max, 8.0);
        assert!((s.mean - 10.0 / 3.0).abs() < 1e-12);
    }
}

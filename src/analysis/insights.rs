use std::fmt;

use serde::Serialize;

use super::stats::Summary;
use super::zscore::detect;

/// Slopes below this magnitude count as flat.
const MIN_TREND_SLOPE: f64 = 0.001;
/// Lag correlation above which a series is called seasonal.
const SEASONALITY_CUTOFF: f64 = 0.7;

// ---------------------------------------------------------------------------
// Insight – one narrative finding about a series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Statistics,
    Trend,
    Seasonality,
    Anomaly,
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InsightKind::Statistics => "statistics",
            InsightKind::Trend => "trend",
            InsightKind::Seasonality => "seasonality",
            InsightKind::Anomaly => "anomaly",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
    /// In `[0, 1]`.
    pub confidence: f64,
}

/// Linear trend fitted against the point index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trend {
    pub slope: f64,
}

impl Trend {
    pub fn direction(&self) -> &'static str {
        if self.slope > 0.0 {
            "upward"
        } else {
            "downward"
        }
    }

    pub fn confidence(&self) -> f64 {
        (self.slope.abs() * 10.0).min(0.95)
    }
}

/// Correlation of a series with itself shifted by `lag` points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LagCorrelation {
    pub lag: usize,
    pub correlation: f64,
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Collect the findings for a series: summary statistics, trend, seasonality
/// over lags `1..=period`, and the z-score verdict at `threshold`.
///
/// An empty series yields no insights.
pub fn generate(values: &[f64], period: usize, threshold: f64) -> Vec<Insight> {
    let Some(summary) = Summary::from_values(values) else {
        return Vec::new();
    };

    let mut insights = vec![Insight {
        kind: InsightKind::Statistics,
        message: format!(
            "Average value is {:.2}, with range from {:.2} to {:.2}",
            summary.mean, summary.min, summary.max
        ),
        confidence: 0.95,
    }];

    if let Some(trend) = detect_trend(values) {
        insights.push(Insight {
            kind: InsightKind::Trend,
            message: format!(
                "There is a {} trend with slope {:.3}",
                trend.direction(),
                trend.slope.abs()
            ),
            confidence: trend.confidence(),
        });
    }

    if let Some(strongest) = strongest_lag(&lag_correlations(values, period)) {
        if strongest.correlation.abs() > SEASONALITY_CUTOFF {
            insights.push(Insight {
                kind: InsightKind::Seasonality,
                message: format!(
                    "Strong seasonal pattern detected with period of {} days",
                    strongest.lag
                ),
                confidence: strongest.correlation.abs(),
            });
        }
    }

    let report = detect(values, threshold);
    if report.detected {
        insights.push(Insight {
            kind: InsightKind::Anomaly,
            message: report.explanation,
            confidence: 0.9,
        });
    }

    insights
}

// ---------------------------------------------------------------------------
// Trend
// ---------------------------------------------------------------------------

/// Ordinary least squares slope of value against index. `None` for fewer
/// than two points or a slope too small to report.
pub fn detect_trend(values: &[f64]) -> Option<Trend> {
    let slope = linear_slope(values)?;
    if slope.abs() < MIN_TREND_SLOPE {
        return None;
    }
    Some(Trend { slope })
}

fn linear_slope(y: &[f64]) -> Option<f64> {
    let n = y.len() as f64;
    if y.len() < 2 {
        return None;
    }
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = y.iter().sum::<f64>() / n;
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &yi) in y.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (yi - y_mean);
        den += dx * dx;
    }
    Some(num / den)
}

// ---------------------------------------------------------------------------
// Seasonality
// ---------------------------------------------------------------------------

/// Pearson correlation for every lag in `1..=period`.
pub fn lag_correlations(values: &[f64], period: usize) -> Vec<LagCorrelation> {
    (1..=period)
        .map(|lag| {
            let correlation = if lag < values.len() {
                pearson(&values[..values.len() - lag], &values[lag..])
            } else {
                0.0
            };
            LagCorrelation { lag, correlation }
        })
        .collect()
}

/// Strongest absolute correlation; the smallest lag wins ties.
fn strongest_lag(correlations: &[LagCorrelation]) -> Option<LagCorrelation> {
    correlations.iter().copied().fold(None, |best, c| match best {
        Some(b) if b.correlation.abs() >= c.correlation.abs() => Some(b),
        _ => Some(c),
    })
}

/// `0.0` when either side has no variance or there are fewer than two pairs.
fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let nf = n as f64;
    let x_mean = xs[..n].iter().sum::<f64>() / nf;
    let y_mean = ys[..n].iter().sum::<f64>() / nf;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    cov / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_series_has_no_insights() {
        assert!(generate(&[], 7, 3.0).is_empty());
    }

    #[test]
    fn statistics_insight_comes_first() {
        let insights = generate(&[1.0, 2.0, 3.0], 7, 3.0);
        assert_eq!(insights[0].kind, InsightKind::Statistics);
        assert_eq!(
            insights[0].message,
            "Average value is 2.00, with range from 1.00 to 3.00"
        );
    }

    #[test]
    fn rising_series_has_upward_trend() {
        let values: Vec<f64> = (0..20).map(|i| 5.0 + 0.5 * i as f64).collect();
        let trend = detect_trend(&values).unwrap();
        assert!((trend.slope - 0.5).abs() < 1e-12);
        assert_eq!(trend.direction(), "upward");
        assert_eq!(trend.confidence(), 0.95);

        let insights = generate(&values, 7, 3.0);
        let msg = &insights
            .iter()
            .find(|i| i.kind == InsightKind::Trend)
            .unwrap()
            .message;
        assert_eq!(msg, "There is a upward trend with slope 0.500");
    }

    #[test]
    fn flat_series_has_no_trend() {
        assert!(detect_trend(&[4.0; 10]).is_none());
        assert!(detect_trend(&[4.0]).is_none());
    }

    #[test]
    fn weekly_pattern_is_seasonal() {
        let week = [1.0, 2.0, 3.0, 10.0, 3.0, 2.0, 1.0];
        let values: Vec<f64> = week.iter().cycle().take(70).copied().collect();
        let insights = generate(&values, 7, 3.0);
        let seasonal = insights
            .iter()
            .find(|i| i.kind == InsightKind::Seasonality)
            .unwrap();
        assert_eq!(
            seasonal.message,
            "Strong seasonal pattern detected with period of 7 days"
        );
        assert!(seasonal.confidence > 0.99);
    }

    #[test]
    fn constant_series_correlates_to_zero() {
        let corr = lag_correlations(&[3.0; 12], 3);
        assert_eq!(corr.len(), 3);
        assert!(corr.iter().all(|c| c.correlation == 0.0));
    }

    #[test]
    fn lags_longer_than_series_are_zero() {
        let corr = lag_correlations(&[1.0, 2.0], 4);
        assert!(corr.iter().all(|c| c.correlation == 0.0));
    }

    #[test]
    fn anomaly_insight_reuses_report_text() {
        let mut values = vec![1.0; 30];
        values[12] = 50.0;
        let insights = generate(&values, 7, 3.0);
        let anomaly = insights
            .iter()
            .find(|i| i.kind == InsightKind::Anomaly)
            .unwrap();
        assert!(anomaly.message.starts_with("Found 1 points"));
    }
}

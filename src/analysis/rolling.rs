/// Trailing moving average. Point `i` averages `values[i + 1 - window ..= i]`,
/// clamped at the start of the series. A zero window behaves like `1`.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let span = &values[(i + 1).saturating_sub(window)..=i];
            span.iter().sum::<f64>() / span.len() as f64
        })
        .collect()
}

/// Indices whose value is more than `threshold` away (in the series' own
/// units) from its trailing moving average.
pub fn deviations_from_baseline(values: &[f64], window: usize, threshold: f64) -> Vec<usize> {
    moving_average(values, window)
        .iter()
        .zip(values)
        .enumerate()
        .filter(|&(_, (avg, v))| (v - avg).abs() > threshold)
        .map(|(i, _)| i)
        .collect()
}

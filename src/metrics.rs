/// Compute summary statistics (mean, min, max, population stddev) from a price series
pub fn compute_series_stats(values: &[f64]) -> Option<(f64, f64, f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let mut min = values[0];
    let mut max = values[0];
    for &v in values {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, min, max, variance.sqrt()))
}

/// Compute the mean confidence-band width from (lower, upper) pairs
pub fn compute_band_width(bounds: &[(f64, f64)]) -> Option<f64> {
    if bounds.is_empty() {
        return None;
    }
    let total: f64 = bounds.iter().map(|(lo, hi)| hi - lo).sum();
    Some(total / bounds.len() as f64)
}

//! Rolling standard deviation.
//!
//! Population standard deviation over n closing prices.
//! STDDEV(n)[i] = sqrt(sum((C[i-j] - SMA(n)[i])^2 for j in 0..n) / n)
//! Warmup: first (n-1) values are NaN.

use super::nan_series;

pub fn calculate_stddev(closes: &[f64], period: usize) -> Vec<f64> {
    let mut values = nan_series(closes.len());
    if period == 0 {
        return values;
    }

    for i in (period - 1)..closes.len() {
        values[i] = population_stddev(&closes[i + 1 - period..=i]);
    }

    values
}

pub(crate) fn population_stddev(window: &[f64]) -> f64 {
    if window.is_empty() {
        return f64::NAN;
    }
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;
    variance.sqrt()
}

//! Simple Moving Average.
//!
//! SMA(n)[i] = sum(C[i-n+1..=i]) / n
//! Warmup: first (n-1) values are NaN.

use super::nan_series;

pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<f64> {
    let mut values = nan_series(closes.len());
    if period == 0 {
        return values;
    }

    for i in (period - 1)..closes.len() {
        let window = &closes[i + 1 - period..=i];
        values[i] = window.iter().sum::<f64>() / period as f64;
    }

    values
}

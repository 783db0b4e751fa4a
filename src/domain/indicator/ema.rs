//! Exponential Moving Average.
//!
//! k = 2/(n+1), seed with the SMA of the first n usable values, then
//! EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Leading NaNs in the input are skipped, so the EMA of another indicator
//! series (e.g. the MACD line) starts once that series is warmed up.
//! Warmup: first (n-1) usable values are NaN.

use super::nan_series;

pub fn calculate_ema(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = nan_series(values.len());
    if period == 0 {
        return out;
    }

    let Some(start) = values.iter().position(|v| !v.is_nan()) else {
        return out;
    };
    let seed_end = start + period - 1;
    if seed_end >= values.len() {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = values[start..=seed_end].iter().sum::<f64>() / period as f64;
    out[seed_end] = ema;

    for i in (seed_end + 1)..values.len() {
        ema = values[i] * k + ema * (1.0 - k);
        out[i] = ema;
    }

    out
}

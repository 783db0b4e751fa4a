//! Technical indicator implementations.
//!
//! Every indicator maps a price history to a series of the same length.
//! Entries inside the warm-up window are `f64::NAN`; callers guard with
//! [`is_ready`] or `f64::is_nan` before acting on a value.
//!
//! All functions are pure and recompute from the full prefix they are given,
//! so replaying a prefix always reproduces the same values.

pub mod sma;
pub mod ema;
pub mod rsi;
pub mod macd;
pub mod stddev;
pub mod bollinger;
pub mod atr;

pub use atr::calculate_atr;
pub use bollinger::{calculate_bollinger, BollingerBands};
pub use ema::calculate_ema;
pub use macd::{calculate_macd, calculate_macd_default, Macd};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stddev::calculate_stddev;

/// Last value of a series, or NaN when the series is empty.
pub fn latest(series: &[f64]) -> f64 {
    series.last().copied().unwrap_or(f64::NAN)
}

/// Value `offset` bars before the last one, or NaN when out of range.
pub fn previous(series: &[f64], offset: usize) -> f64 {
    series
        .len()
        .checked_sub(offset + 1)
        .map(|i| series[i])
        .unwrap_or(f64::NAN)
}

/// True when every value is a usable number.
pub fn is_ready(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

pub(crate) fn nan_series(len: usize) -> Vec<f64> {
    vec![f64::NAN; len]
}

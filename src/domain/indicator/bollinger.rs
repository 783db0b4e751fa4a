//! Bollinger Bands.
//!
//! - Middle: SMA over n periods
//! - Upper: Middle + (k × StdDev)
//! - Lower: Middle - (k × StdDev)
//!
//! StdDev is the population standard deviation (divides by N, not N-1).
//! Default parameters: period=20, k=2.0
//! Warmup: first (period-1) values are NaN.

use super::sma::calculate_sma;
use super::stddev::calculate_stddev;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

impl BollingerBands {
    /// (upper - lower) / middle at each index.
    pub fn bandwidth(&self) -> Vec<f64> {
        self.upper
            .iter()
            .zip(&self.lower)
            .zip(&self.middle)
            .map(|((u, l), m)| (u - l) / m)
            .collect()
    }
}

pub fn calculate_bollinger(closes: &[f64], period: usize, multiplier: f64) -> BollingerBands {
    let middle = calculate_sma(closes, period);
    let stddev = calculate_stddev(closes, period);

    let upper = middle
        .iter()
        .zip(&stddev)
        .map(|(m, sd)| m + multiplier * sd)
        .collect();
    let lower = middle
        .iter()
        .zip(&stddev)
        .map(|(m, sd)| m - multiplier * sd)
        .collect();

    BollingerBands {
        upper,
        middle,
        lower,
    }
}

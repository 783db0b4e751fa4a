//! Per-bar view handed to strategies.

use std::fmt;

use super::indicator::{self, BollingerBands, Macd};
use super::memory::StrategyMemory;
use super::ohlcv::{closes, Bar};
use super::portfolio::Portfolio;
use super::position::Position;

/// Opaque market-regime label supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Regime(String);

impl Regime {
    pub fn new(label: impl Into<String>) -> Self {
        Regime(label.into())
    }

    pub fn unknown() -> Self {
        Regime::new("unknown")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Regime {
    fn default() -> Self {
        Regime::unknown()
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps the history seen so far to a regime label. Classification logic
/// belongs to the caller; the engine only forwards the label.
pub trait RegimeClassifier: Send + Sync {
    fn classify(&self, history: &[Bar]) -> Regime;
}

/// Classifier that always reports the same label.
#[derive(Debug, Clone, Default)]
pub struct FixedRegime(pub Regime);

impl RegimeClassifier for FixedRegime {
    fn classify(&self, _history: &[Bar]) -> Regime {
        self.0.clone()
    }
}

/// Indicator accessor bound to the history prefix of the current bar.
///
/// Each call recomputes from the full prefix.
#[derive(Debug, Clone, Copy)]
pub struct Indicators<'a> {
    history: &'a [Bar],
}

impl<'a> Indicators<'a> {
    pub fn new(history: &'a [Bar]) -> Self {
        Indicators { history }
    }

    pub fn closes(&self) -> Vec<f64> {
        closes(self.history)
    }

    pub fn sma(&self, period: usize) -> Vec<f64> {
        indicator::calculate_sma(&self.closes(), period)
    }

    pub fn ema(&self, period: usize) -> Vec<f64> {
        indicator::calculate_ema(&self.closes(), period)
    }

    pub fn rsi(&self, period: usize) -> Vec<f64> {
        indicator::calculate_rsi(&self.closes(), period)
    }

    pub fn macd(&self, fast: usize, slow: usize, signal: usize) -> Macd {
        indicator::calculate_macd(&self.closes(), fast, slow, signal)
    }

    pub fn bollinger(&self, period: usize, multiplier: f64) -> BollingerBands {
        indicator::calculate_bollinger(&self.closes(), period, multiplier)
    }

    pub fn stddev(&self, period: usize) -> Vec<f64> {
        indicator::calculate_stddev(&self.closes(), period)
    }

    pub fn atr(&self, period: usize) -> Vec<f64> {
        indicator::calculate_atr(self.history, period)
    }
}

/// Everything a strategy may look at or keep between bars.
pub struct StrategyContext<'a> {
    pub portfolio: &'a Portfolio,
    pub history: &'a [Bar],
    pub indicators: Indicators<'a>,
    pub regime: Regime,
    pub memory: &'a mut StrategyMemory,
    pub bar_index: usize,
}

impl<'a> StrategyContext<'a> {
    pub fn new(
        portfolio: &'a Portfolio,
        history: &'a [Bar],
        regime: Regime,
        memory: &'a mut StrategyMemory,
    ) -> Self {
        StrategyContext {
            portfolio,
            history,
            indicators: Indicators::new(history),
            regime,
            memory,
            bar_index: history.len().saturating_sub(1),
        }
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.portfolio.get_position(symbol)
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.portfolio.has_position(symbol)
    }

    pub fn cash(&self) -> f64 {
        self.portfolio.cash
    }

    pub fn equity(&self) -> f64 {
        self.portfolio.equity()
    }
}

//! Strategy capability contract and parameter sets.

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::context::StrategyContext;
use super::error::TradesimError;
use super::ohlcv::Bar;
use super::signal::Signal;

/// A pluggable trading strategy.
///
/// `on_bar` takes `&self`: anything a strategy needs to carry from one bar to
/// the next goes into `ctx.memory`, which the engine owns and scopes to the
/// run. The engine awaits each call to completion before the next bar.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn id(&self) -> &str;

    fn params(&self) -> &StrategyParams;

    async fn on_bar(
        &self,
        bar: &Bar,
        ctx: &mut StrategyContext<'_>,
    ) -> Result<Option<Signal>, TradesimError>;
}

/// Named numeric strategy parameters.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrategyParams {
    values: BTreeMap<String, f64>,
}

impl StrategyParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    /// Parameter as f64, falling back to `default` when absent or not finite.
    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.get(key).filter(|v| v.is_finite()).unwrap_or(default)
    }

    /// Parameter rounded to usize, at least `min`.
    pub fn get_usize(&self, key: &str, default: usize, min: usize) -> usize {
        self.get(key)
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.round() as usize)
            .unwrap_or(default)
            .max(min)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for StrategyParams {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        StrategyParams {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A strategy selection as built by a caller: template id plus parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrategyDefinition {
    pub id: String,
    pub params: StrategyParams,
}

impl StrategyDefinition {
    pub fn new(id: impl Into<String>, params: StrategyParams) -> Self {
        StrategyDefinition {
            id: id.into(),
            params,
        }
    }
}

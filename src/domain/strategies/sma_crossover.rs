use async_trait::async_trait;

use super::DEFAULT_SYMBOL;
use crate::domain::context::StrategyContext;
use crate::domain::error::TradesimError;
use crate::domain::indicator::{latest, previous};
use crate::domain::ohlcv::Bar;
use crate::domain::signal::Signal;
use crate::domain::strategy::{Strategy, StrategyParams};

pub const TEMPLATE_ID: &str = "sma_crossover";

/// Long when the fast SMA crosses above the slow SMA, flat when it crosses
/// back below.
pub struct SmaCrossover {
    params: StrategyParams,
    symbol: String,
    fast: usize,
    slow: usize,
    size_pct: f64,
}

impl SmaCrossover {
    pub fn new(params: StrategyParams) -> Result<Self, TradesimError> {
        let fast = params.get_usize("fast", 10, 1);
        let slow = params.get_usize("slow", 30, 2);
        if fast >= slow {
            return Err(TradesimError::Strategy {
                strategy: TEMPLATE_ID.to_string(),
                reason: format!("fast period {} must be below slow period {}", fast, slow),
            });
        }
        let size_pct = params.get_f64("size_pct", 100.0);
        Ok(SmaCrossover {
            params,
            symbol: DEFAULT_SYMBOL.to_string(),
            fast,
            slow,
            size_pct,
        })
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }
}

#[async_trait]
impl Strategy for SmaCrossover {
    fn id(&self) -> &str {
        TEMPLATE_ID
    }

    fn params(&self) -> &StrategyParams {
        &self.params
    }

    async fn on_bar(
        &self,
        _bar: &Bar,
        ctx: &mut StrategyContext<'_>,
    ) -> Result<Option<Signal>, TradesimError> {
        let fast = ctx.indicators.sma(self.fast);
        let slow = ctx.indicators.sma(self.slow);

        let (fast_now, slow_now) = (latest(&fast), latest(&slow));
        let (fast_prev, slow_prev) = (previous(&fast, 1), previous(&slow, 1));
        if [fast_now, slow_now, fast_prev, slow_prev]
            .iter()
            .any(|v| v.is_nan())
        {
            return Ok(None);
        }

        let crossed_up = fast_prev <= slow_prev && fast_now > slow_now;
        let crossed_down = fast_prev >= slow_prev && fast_now < slow_now;
        let holding = ctx.has_position(&self.symbol);

        if crossed_up && !holding {
            return Ok(Some(
                Signal::buy(&self.symbol, self.size_pct)
                    .with_reason(format!("sma({}) crossed above sma({})", self.fast, self.slow)),
            ));
        }
        if crossed_down && holding {
            return Ok(Some(
                Signal::sell(&self.symbol)
                    .with_reason(format!("sma({}) crossed below sma({})", self.fast, self.slow)),
            ));
        }
        Ok(None)
    }
}

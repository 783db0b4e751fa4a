use async_trait::async_trait;

use super::DEFAULT_SYMBOL;
use crate::domain::context::StrategyContext;
use crate::domain::error::TradesimError;
use crate::domain::ohlcv::Bar;
use crate::domain::signal::Signal;
use crate::domain::strategy::{Strategy, StrategyParams};

pub const TEMPLATE_ID: &str = "buy_and_hold";

/// Buys on the first bar it is flat and never sells; the engine closes the
/// position at the end of the data.
pub struct BuyAndHold {
    params: StrategyParams,
    symbol: String,
    size_pct: f64,
}

impl BuyAndHold {
    pub fn new(params: StrategyParams) -> Self {
        let size_pct = params.get_f64("size_pct", 100.0);
        BuyAndHold {
            params,
            symbol: DEFAULT_SYMBOL.to_string(),
            size_pct,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }
}

#[async_trait]
impl Strategy for BuyAndHold {
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
        if ctx.has_position(&self.symbol) || ctx.memory.flag("entered") {
            return Ok(None);
        }
        ctx.memory.set("entered", true);
        Ok(Some(
            Signal::buy(&self.symbol, self.size_pct).with_reason("buy and hold"),
        ))
    }
}

use async_trait::async_trait;

use super::DEFAULT_SYMBOL;
use crate::domain::context::StrategyContext;
use crate::domain::error::TradesimError;
use crate::domain::indicator::latest;
use crate::domain::ohlcv::Bar;
use crate::domain::position::PositionSide;
use crate::domain::signal::Signal;
use crate::domain::strategy::{Strategy, StrategyParams};

pub const TEMPLATE_ID: &str = "rsi_reversion";

const TRAIL_KEY: &str = "trail_stop";

/// Long-only RSI mean reversion.
///
/// Enters when RSI drops below `oversold`, with an ATR-based stop and target
/// handed to the engine. While long, a trailing stop ratchets up by
/// `trail_atr` ATRs and lives in strategy memory; the position is closed when
/// the close falls through it or RSI rises above `overbought`.
pub struct RsiReversion {
    params: StrategyParams,
    symbol: String,
    period: usize,
    oversold: f64,
    overbought: f64,
    size_pct: f64,
    atr_period: usize,
    stop_atr: f64,
    target_atr: f64,
    trail_atr: f64,
}

impl RsiReversion {
    pub fn new(params: StrategyParams) -> Self {
        RsiReversion {
            symbol: DEFAULT_SYMBOL.to_string(),
            period: params.get_usize("period", 14, 1),
            oversold: params.get_f64("oversold", 30.0),
            overbought: params.get_f64("overbought", 70.0),
            size_pct: params.get_f64("size_pct", 100.0),
            atr_period: params.get_usize("atr_period", 14, 1),
            stop_atr: params.get_f64("stop_atr", 2.0),
            target_atr: params.get_f64("target_atr", 3.0),
            trail_atr: params.get_f64("trail_atr", 2.0),
            params,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    fn entry(&self, bar: &Bar, rsi: f64, atr: f64, ctx: &mut StrategyContext<'_>) -> Signal {
        let confidence = ((self.oversold - rsi) / self.oversold + 0.5).min(1.0);
        let mut signal = Signal::buy(&self.symbol, self.size_pct)
            .with_confidence(confidence)
            .with_reason(format!("rsi {:.1} below {}", rsi, self.oversold));

        if atr.is_finite() && atr > 0.0 {
            let stop = bar.close - self.stop_atr * atr;
            signal = signal
                .with_stop_loss(stop)
                .with_take_profit(bar.close + self.target_atr * atr);
            ctx.memory.set(TRAIL_KEY, stop);
        }
        signal
    }

    fn manage_long(
        &self,
        bar: &Bar,
        rsi: f64,
        atr: f64,
        ctx: &mut StrategyContext<'_>,
    ) -> Option<Signal> {
        if rsi > self.overbought {
            return Some(
                Signal::sell(&self.symbol)
                    .with_reason(format!("rsi {:.1} above {}", rsi, self.overbought)),
            );
        }

        let trail = ctx.memory.number(TRAIL_KEY);
        if let Some(trail) = trail {
            if bar.close < trail {
                return Some(
                    Signal::sell(&self.symbol)
                        .with_reason(format!("trailing stop {:.4} broken", trail)),
                );
            }
        }

        if self.trail_atr > 0.0 && atr.is_finite() && atr > 0.0 {
            let candidate = bar.close - self.trail_atr * atr;
            let raised = trail.map_or(candidate, |t| t.max(candidate));
            ctx.memory.set(TRAIL_KEY, raised);
        }
        None
    }
}

#[async_trait]
impl Strategy for RsiReversion {
    fn id(&self) -> &str {
        TEMPLATE_ID
    }

    fn params(&self) -> &StrategyParams {
        &self.params
    }

    async fn on_bar(
        &self,
        bar: &Bar,
        ctx: &mut StrategyContext<'_>,
    ) -> Result<Option<Signal>, TradesimError> {
        let rsi = latest(&ctx.indicators.rsi(self.period));
        if rsi.is_nan() {
            return Ok(None);
        }
        let atr = latest(&ctx.indicators.atr(self.atr_period));

        match ctx.position(&self.symbol).map(|p| p.side) {
            None => {
                ctx.memory.remove(TRAIL_KEY);
                if rsi < self.oversold {
                    return Ok(Some(self.entry(bar, rsi, atr, ctx)));
                }
                Ok(None)
            }
            Some(PositionSide::Long) => Ok(self.manage_long(bar, rsi, atr, ctx)),
            Some(PositionSide::Short) => Ok(None),
        }
    }
}

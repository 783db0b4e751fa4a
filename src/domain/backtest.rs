//! Backtest engine and event loop.
//!
//! Per bar, in order:
//! 1. Extend the history prefix
//! 2. Force-close positions whose stop or target the bar touched
//! 3. Mark open positions to the close
//! 4. Await the strategy hook
//! 5. Apply the returned signal (entry, exit, or short)
//! 6. Mark to the close again and record equity
//!
//! A position still open after the last bar is closed at the final close and
//! the last equity point is rewritten to the flat equity.

use log::{debug, info};

use super::config::BacktestConfig;
use super::context::{FixedRegime, RegimeClassifier, StrategyContext};
use super::error::TradesimError;
use super::execution::{self, BpsSlippage, EntryResult, FrictionModel};
use super::memory::StrategyMemory;
use super::metrics::{self, Metrics};
use super::ohlcv::Bar;
use super::portfolio::{EquityPoint, Portfolio};
use super::position::{ExitReason, PositionSide, Trade};
use super::signal::{Signal, SignalAction};
use super::strategy::Strategy;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BacktestResult {
    pub strategy_id: String,
    pub market: String,
    pub trades: Vec<Trade>,
    /// One point per input bar.
    pub equity_curve: Vec<EquityPoint>,
    /// One fewer than the equity curve.
    pub daily_returns: Vec<f64>,
    pub metrics: Metrics,
}

impl BacktestResult {
    pub fn final_equity(&self) -> f64 {
        self.metrics.final_equity
    }

    pub fn total_pnl(&self) -> f64 {
        self.trades.iter().map(|t| t.pnl).sum()
    }
}

/// A configured engine. Each call to [`Backtest::run`] owns its own
/// portfolio, history and memory, so one engine may serve many runs.
pub struct Backtest {
    config: BacktestConfig,
    friction: Box<dyn FrictionModel>,
    regime: Box<dyn RegimeClassifier>,
}

impl Backtest {
    pub fn new(config: BacktestConfig) -> Self {
        let friction = Box::new(BpsSlippage::new(config.slippage_bps));
        Backtest {
            config,
            friction,
            regime: Box::new(FixedRegime::default()),
        }
    }

    pub fn with_friction(mut self, friction: impl FrictionModel + 'static) -> Self {
        self.friction = Box::new(friction);
        self
    }

    pub fn with_regime(mut self, regime: impl RegimeClassifier + 'static) -> Self {
        self.regime = Box::new(regime);
        self
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub async fn run<S>(&self, strategy: &S, bars: &[Bar]) -> Result<BacktestResult, TradesimError>
    where
        S: Strategy + ?Sized,
    {
        self.config.validate()?;

        info!(
            "starting backtest: strategy={} market={} bars={} capital={:.2}",
            strategy.id(),
            self.config.market,
            bars.len(),
            self.config.initial_capital
        );

        let mut portfolio = Portfolio::new(self.config.initial_capital);
        let mut memory = StrategyMemory::new();

        for (bar_index, bar) in bars.iter().enumerate() {
            let history = &bars[..=bar_index];

            execution::check_triggers(
                &mut portfolio,
                bar,
                self.friction.as_ref(),
                self.config.commission_rate,
            );
            portfolio.mark_to_market(bar.close);

            let signal = {
                let regime = self.regime.classify(history);
                let mut ctx = StrategyContext::new(&portfolio, history, regime, &mut memory);
                strategy
                    .on_bar(bar, &mut ctx)
                    .await
                    .map_err(|e| TradesimError::StrategyFailed {
                        strategy: strategy.id().to_string(),
                        bar_index,
                        source: Box::new(e),
                    })?
            };

            if let Some(signal) = signal {
                self.apply_signal(&mut portfolio, &signal, bar);
            }

            portfolio.mark_to_market(bar.close);
            let equity = portfolio.equity();
            portfolio.record_equity(bar.timestamp, equity);
        }

        if let Some(last) = bars.last() {
            self.close_all(&mut portfolio, last);
        }

        let result = self.finish(strategy.id(), portfolio);

        info!(
            "finished backtest: strategy={} trades={} final_equity={:.2} return={:.2}%",
            result.strategy_id,
            result.metrics.total_trades,
            result.metrics.final_equity,
            result.metrics.total_return
        );

        Ok(result)
    }

    fn apply_signal(&self, portfolio: &mut Portfolio, signal: &Signal, bar: &Bar) {
        let current_side = portfolio.get_position(&signal.symbol).map(|p| p.side);

        match (signal.action, current_side) {
            (SignalAction::Buy, None) => self.open(portfolio, PositionSide::Long, signal, bar),
            (SignalAction::Sell, None) if self.config.allow_shorting => {
                self.open(portfolio, PositionSide::Short, signal, bar)
            }
            (SignalAction::Buy, Some(PositionSide::Short))
            | (SignalAction::Sell, Some(PositionSide::Long)) => {
                execution::exit_position(
                    portfolio,
                    &signal.symbol,
                    bar.close,
                    bar.timestamp,
                    ExitReason::Signal,
                    self.friction.as_ref(),
                    self.config.commission_rate,
                );
            }
            (action, side) => {
                debug!(
                    "ignoring {} signal for {} (position: {:?})",
                    action, signal.symbol, side
                );
            }
        }
    }

    fn open(&self, portfolio: &mut Portfolio, side: PositionSide, signal: &Signal, bar: &Bar) {
        // single position slot per run
        if !portfolio.is_flat() {
            debug!(
                "ignoring {} entry for {}: another position is open",
                side, signal.symbol
            );
            return;
        }

        let result = execution::enter_position(
            portfolio,
            side,
            signal,
            bar,
            self.friction.as_ref(),
            self.config.commission_rate,
        );
        if let EntryResult::InvalidSize { .. } = result {
            debug!("no position opened on bar {}", bar.timestamp);
        }
    }

    fn close_all(&self, portfolio: &mut Portfolio, last: &Bar) {
        if portfolio.is_flat() {
            return;
        }

        for symbol in portfolio.open_symbols() {
            execution::exit_position(
                portfolio,
                &symbol,
                last.close,
                last.timestamp,
                ExitReason::EndOfData,
                self.friction.as_ref(),
                self.config.commission_rate,
            );
        }

        let flat_equity = portfolio.equity();
        if let Some(point) = portfolio.equity_curve.last_mut() {
            point.equity = flat_equity;
        }
    }

    fn finish(&self, strategy_id: &str, portfolio: Portfolio) -> BacktestResult {
        let metrics = Metrics::compute(
            &portfolio.closed_trades,
            &portfolio.equity_curve,
            self.config.initial_capital,
            self.config.risk_free_rate,
            self.config.periods_per_year,
        );
        let daily_returns = metrics::per_bar_returns(&portfolio.equity_curve);

        BacktestResult {
            strategy_id: strategy_id.to_string(),
            market: self.config.market.clone(),
            trades: portfolio.closed_trades,
            equity_curve: portfolio.equity_curve,
            daily_returns,
            metrics,
        }
    }
}

/// Run `strategy` over `bars` with the default friction model and regime.
pub async fn run<S>(
    strategy: &S,
    bars: &[Bar],
    config: &BacktestConfig,
) -> Result<BacktestResult, TradesimError>
where
    S: Strategy + ?Sized,
{
    Backtest::new(config.clone()).run(strategy, bars).await
}

/// [`run`] driven to completion on the current thread.
pub fn run_blocking<S>(
    strategy: &S,
    bars: &[Bar],
    config: &BacktestConfig,
) -> Result<BacktestResult, TradesimError>
where
    S: Strategy + ?Sized,
{
    futures::executor::block_on(run(strategy, bars, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::context::Regime;
    use crate::domain::execution::Side;
    use crate::domain::execution::Fill;
    use crate::domain::strategy::StrategyParams;
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::collections::HashMap;

    fn ts(day: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + chrono::Duration::days(day)
    }

    fn bar(day: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: ts(day),
            open,
            high,
            low,
            close,
            volume: 1_000.0,
        }
    }

    fn flat_bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| bar(i as i64, c, c, c, c))
            .collect()
    }

    /// Emits preset signals on preset bar indices.
    struct Scripted {
        params: StrategyParams,
        script: HashMap<usize, Signal>,
    }

    impl Scripted {
        fn new(script: Vec<(usize, Signal)>) -> Self {
            Scripted {
                params: StrategyParams::new(),
                script: script.into_iter().collect(),
            }
        }
    }

    #[async_trait]
    impl Strategy for Scripted {
        fn id(&self) -> &str {
            "scripted"
        }

        fn params(&self) -> &StrategyParams {
            &self.params
        }

        async fn on_bar(
            &self,
            _bar: &Bar,
            ctx: &mut StrategyContext<'_>,
        ) -> Result<Option<Signal>, TradesimError> {
            Ok(self.script.get(&ctx.bar_index).cloned())
        }
    }

    struct RegimeProbe {
        params: StrategyParams,
    }

    #[async_trait]
    impl Strategy for RegimeProbe {
        fn id(&self) -> &str {
            "regime_probe"
        }

        fn params(&self) -> &StrategyParams {
            &self.params
        }

        async fn on_bar(
            &self,
            _bar: &Bar,
            ctx: &mut StrategyContext<'_>,
        ) -> Result<Option<Signal>, TradesimError> {
            if ctx.regime.as_str() != "trending" {
                return Err(TradesimError::Strategy {
                    strategy: "regime_probe".into(),
                    reason: format!("unexpected regime {}", ctx.regime),
                });
            }
            Ok(None)
        }
    }

    struct DoubleSlippage;

    impl FrictionModel for DoubleSlippage {
        fn fill(&self, requested_price: f64, side: Side) -> Fill {
            execution::apply_friction(requested_price, side, 200.0)
        }
    }

    #[tokio::test]
    async fn empty_bars_returns_capital() {
        let engine = Backtest::new(BacktestConfig::new(5_000.0));
        let result = engine.run(&Scripted::new(vec![]), &[]).await.unwrap();

        assert!(result.trades.is_empty());
        assert!(result.equity_curve.is_empty());
        assert!(result.daily_returns.is_empty());
        assert!((result.final_equity() - 5_000.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn invalid_config_rejected_before_loop() {
        let engine = Backtest::new(BacktestConfig::new(-1.0));
        let bars = flat_bars(&[100.0, 101.0]);
        let err = engine
            .run(&Scripted::new(vec![]), &bars)
            .await
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[tokio::test]
    async fn round_trip_long() {
        let bars = flat_bars(&[100.0, 110.0, 120.0, 120.0]);
        let strategy = Scripted::new(vec![
            (0, Signal::buy("BTC", 100.0)),
            (2, Signal::sell("BTC")),
        ]);
        let result = Backtest::new(BacktestConfig::new(10_000.0))
            .run(&strategy, &bars)
            .await
            .unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::Signal);
        assert!((trade.quantity - 100.0).abs() < 1e-9);
        assert!((trade.pnl - 2_000.0).abs() < 1e-9);

        let equities: Vec<f64> = result.equity_curve.iter().map(|p| p.equity).collect();
        assert_eq!(equities.len(), 4);
        assert!((equities[1] - 11_000.0).abs() < 1e-9);
        assert!((equities[3] - 12_000.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn duplicate_buy_ignored() {
        let bars = flat_bars(&[100.0, 100.0, 100.0]);
        let strategy = Scripted::new(vec![
            (0, Signal::buy("BTC", 50.0)),
            (1, Signal::buy("BTC", 50.0)),
        ]);
        let result = run(&strategy, &bars, &BacktestConfig::new(10_000.0))
            .await
            .unwrap();

        assert_eq!(result.trades.len(), 1);
        assert!((result.trades[0].quantity - 50.0).abs() < 1e-9);
        assert_eq!(result.trades[0].exit_reason, ExitReason::EndOfData);
    }

    #[tokio::test]
    async fn sell_without_position_ignored_when_shorting_disabled() {
        let bars = flat_bars(&[100.0, 90.0]);
        let strategy = Scripted::new(vec![(0, Signal::sell("BTC"))]);
        let result = run(&strategy, &bars, &BacktestConfig::new(10_000.0))
            .await
            .unwrap();

        assert!(result.trades.is_empty());
        assert!((result.final_equity() - 10_000.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn short_round_trip() {
        let bars = flat_bars(&[100.0, 90.0, 80.0]);
        let strategy = Scripted::new(vec![
            (0, Signal::sell("BTC")),
            (2, Signal::buy("BTC", 100.0)),
        ]);
        let config = BacktestConfig {
            allow_shorting: true,
            ..BacktestConfig::new(10_000.0)
        };
        let result = run(&strategy, &bars, &config).await.unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.side, PositionSide::Short);
        assert!((trade.pnl - 2_000.0).abs() < 1e-9);
        assert!((result.equity_curve[1].equity - 11_000.0).abs() < 1e-9);
        assert!((result.final_equity() - 12_000.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn stop_fires_before_hook() {
        let bars = vec![
            bar(0, 100.0, 100.0, 100.0, 100.0),
            bar(1, 100.0, 101.0, 94.0, 98.0),
            bar(2, 98.0, 98.0, 98.0, 98.0),
        ];
        let strategy = Scripted::new(vec![(0, Signal::buy("BTC", 100.0).with_stop_loss(95.0))]);
        let result = run(&strategy, &bars, &BacktestConfig::new(10_000.0))
            .await
            .unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::Stop);
        assert!((trade.exit_price - 95.0).abs() < 1e-9);
        assert_eq!(trade.exit_timestamp, ts(1));
        assert!((result.final_equity() - 9_500.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn custom_friction_model_used() {
        let bars = flat_bars(&[100.0, 100.0]);
        let strategy = Scripted::new(vec![(0, Signal::buy("BTC", 100.0))]);
        let result = Backtest::new(BacktestConfig::new(10_000.0))
            .with_friction(DoubleSlippage)
            .run(&strategy, &bars)
            .await
            .unwrap();

        let trade = &result.trades[0];
        assert!((trade.entry_price - 102.0).abs() < 1e-9);
        assert!((trade.exit_price - 98.0).abs() < 1e-9);
        assert!(result.final_equity() < 10_000.0);
    }

    #[tokio::test]
    async fn regime_classifier_reaches_context() {
        let bars = flat_bars(&[100.0, 101.0]);
        let probe = RegimeProbe {
            params: StrategyParams::new(),
        };

        let ok = Backtest::new(BacktestConfig::default())
            .with_regime(FixedRegime(Regime::new("trending")))
            .run(&probe, &bars)
            .await;
        assert!(ok.is_ok());

        let err = Backtest::new(BacktestConfig::default())
            .run(&probe, &bars)
            .await
            .unwrap_err();
        match err {
            TradesimError::StrategyFailed {
                strategy,
                bar_index,
                ..
            } => {
                assert_eq!(strategy, "regime_probe");
                assert_eq!(bar_index, 0);
            }
            other => panic!("expected StrategyFailed, got {:?}", other),
        }
    }

    #[test]
    fn run_blocking_matches_async() {
        let bars = flat_bars(&[100.0, 105.0, 103.0]);
        let strategy = Scripted::new(vec![(0, Signal::buy("BTC", 80.0))]);
        let config = BacktestConfig::new(1_000.0);

        let blocking = run_blocking(&strategy, &bars, &config).unwrap();
        let driven = futures::executor::block_on(run(&strategy, &bars, &config)).unwrap();
        assert_eq!(blocking, driven);
        assert_eq!(blocking.daily_returns.len(), 2);
    }
}

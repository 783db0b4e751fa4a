#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
pub use tradesim::domain::context::StrategyContext;
use tradesim::domain::error::TradesimError;
pub use tradesim::domain::ohlcv::Bar;
use tradesim::domain::signal::Signal;
use tradesim::domain::strategy::{Strategy, StrategyParams};
use tradesim::ports::data_port::DataPort;

pub const SYMBOL: &str = "TEST";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn day(offset: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + chrono::Duration::days(offset as i64)
}

pub fn make_bar(offset: usize, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        timestamp: day(offset),
        open,
        high,
        low,
        close,
        volume: 1_000.0,
    }
}

/// Bars whose open, high, low and close are all `close`.
pub fn flat_bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c, c, c, c))
        .collect()
}

/// `count` bars with closes rising linearly from `start` to `end`.
pub fn linear_bars(start: f64, end: f64, count: usize) -> Vec<Bar> {
    let step = if count > 1 {
        (end - start) / (count - 1) as f64
    } else {
        0.0
    };
    let closes: Vec<f64> = (0..count).map(|i| start + step * i as f64).collect();
    flat_bars(&closes)
}

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, TradesimError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TradesimError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.timestamp >= start && b.timestamp <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradesimError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Never emits a signal.
pub struct Idle {
    params: StrategyParams,
}

impl Idle {
    pub fn new() -> Self {
        Idle {
            params: StrategyParams::new(),
        }
    }
}

#[async_trait]
impl Strategy for Idle {
    fn id(&self) -> &str {
        "idle"
    }

    fn params(&self) -> &StrategyParams {
        &self.params
    }

    async fn on_bar(
        &self,
        _bar: &Bar,
        _ctx: &mut StrategyContext<'_>,
    ) -> Result<Option<Signal>, TradesimError> {
        Ok(None)
    }
}

/// Fails on the given bar index.
pub struct FailsAt {
    params: StrategyParams,
    pub bar_index: usize,
}

impl FailsAt {
    pub fn new(bar_index: usize) -> Self {
        FailsAt {
            params: StrategyParams::new(),
            bar_index,
        }
    }
}

#[async_trait]
impl Strategy for FailsAt {
    fn id(&self) -> &str {
        "fails_at"
    }

    fn params(&self) -> &StrategyParams {
        &self.params
    }

    async fn on_bar(
        &self,
        _bar: &Bar,
        ctx: &mut StrategyContext<'_>,
    ) -> Result<Option<Signal>, TradesimError> {
        if ctx.bar_index == self.bar_index {
            return Err(TradesimError::Strategy {
                strategy: "fails_at".into(),
                reason: "model unavailable".into(),
            });
        }
        Ok(None)
    }
}

/// Emits preset signals on preset bar indices.
pub struct Scripted {
    params: StrategyParams,
    script: HashMap<usize, Signal>,
}

impl Scripted {
    pub fn new(script: Vec<(usize, Signal)>) -> Self {
        Scripted {
            params: StrategyParams::new(),
            script: script.into_iter().collect(),
        }
    }

    /// Buy `size_pct` on the first bar and hold.
    pub fn buy_first(size_pct: f64) -> Self {
        Scripted::new(vec![(0, Signal::buy(SYMBOL, size_pct))])
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

/// Counts the bars it has seen in strategy memory and records, on each bar,
/// the count it found on entry.
pub struct Counter {
    params: StrategyParams,
    pub seen: std::sync::Mutex<Vec<f64>>,
}

impl Counter {
    pub fn new() -> Self {
        Counter {
            params: StrategyParams::new(),
            seen: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Strategy for Counter {
    fn id(&self) -> &str {
        "counter"
    }

    fn params(&self) -> &StrategyParams {
        &self.params
    }

    async fn on_bar(
        &self,
        _bar: &Bar,
        ctx: &mut StrategyContext<'_>,
    ) -> Result<Option<Signal>, TradesimError> {
        let count = ctx.memory.number("count").unwrap_or(0.0);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(count);
        }
        ctx.memory.set("count", count + 1.0);
        Ok(None)
    }
}

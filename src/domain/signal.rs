//! Trading signals emitted by strategies.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SignalAction {
    Buy,
    Sell,
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalAction::Buy => write!(f, "buy"),
            SignalAction::Sell => write!(f, "sell"),
        }
    }
}

/// Order type requested by a strategy. Every order is filled at the
/// friction-adjusted close of the bar that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OrderType {
    #[default]
    Market,
    Limit,
}

/// A single bar's trading intent.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signal {
    pub action: SignalAction,
    pub symbol: String,
    /// Percentage of current equity to allocate, in (0, 100].
    pub size_pct: f64,
    pub order_type: OrderType,
    pub reason: String,
    /// Strategy confidence in [0, 1].
    pub confidence: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl Signal {
    pub fn buy(symbol: impl Into<String>, size_pct: f64) -> Self {
        Signal::new(SignalAction::Buy, symbol, size_pct)
    }

    /// Sell signals default to full size; the engine closes whole positions.
    pub fn sell(symbol: impl Into<String>) -> Self {
        Signal::new(SignalAction::Sell, symbol, 100.0)
    }

    fn new(action: SignalAction, symbol: impl Into<String>, size_pct: f64) -> Self {
        Signal {
            action,
            symbol: symbol.into(),
            size_pct,
            order_type: OrderType::Market,
            reason: String::new(),
            confidence: 1.0,
            stop_loss: None,
            take_profit: None,
        }
    }

    pub fn with_size_pct(mut self, size_pct: f64) -> Self {
        self.size_pct = size_pct;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = order_type;
        self
    }

    pub fn with_stop_loss(mut self, price: f64) -> Self {
        self.stop_loss = Some(price);
        self
    }

    pub fn with_take_profit(mut self, price: f64) -> Self {
        self.take_profit = Some(price);
        self
    }

    pub fn is_buy(&self) -> bool {
        self.action == SignalAction::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.action == SignalAction::Sell
    }
}

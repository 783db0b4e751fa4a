//! Open positions and completed round-trip trades.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            PositionSide::Long => 1.0,
            PositionSide::Short => -1.0,
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Long => write!(f, "long"),
            PositionSide::Short => write!(f, "short"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub side: PositionSide,
    pub symbol: String,
    /// Always positive; direction lives in `side`.
    pub quantity: f64,
    /// Slippage-adjusted entry fill.
    pub entry_price: f64,
    pub requested_entry_price: f64,
    pub entry_commission: f64,
    pub entry_timestamp: NaiveDateTime,
    pub entry_reason: String,
    pub mark_price: f64,
    pub unrealized_pnl: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.side == PositionSide::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == PositionSide::Short
    }

    /// Value the position contributes to equity at `price`.
    ///
    /// Shorts escrow their entry notional, so their value is the escrow plus
    /// the price-move profit: q * (2 * entry - price).
    pub fn market_value(&self, price: f64) -> f64 {
        match self.side {
            PositionSide::Long => self.quantity * price,
            PositionSide::Short => self.quantity * (2.0 * self.entry_price - price),
        }
    }

    pub fn price_pnl(&self, price: f64) -> f64 {
        self.side.sign() * self.quantity * (price - self.entry_price)
    }

    pub fn mark(&mut self, price: f64) {
        self.mark_price = price;
        self.unrealized_pnl = self.price_pnl(price);
    }

    /// Whether the bar range [low, high] touched the stop-loss.
    pub fn stop_touched(&self, high: f64, low: f64) -> bool {
        match (self.stop_loss, self.side) {
            (Some(stop), PositionSide::Long) => low <= stop,
            (Some(stop), PositionSide::Short) => high >= stop,
            (None, _) => false,
        }
    }

    /// Whether the bar range [low, high] touched the take-profit.
    pub fn target_touched(&self, high: f64, low: f64) -> bool {
        match (self.take_profit, self.side) {
            (Some(target), PositionSide::Long) => high >= target,
            (Some(target), PositionSide::Short) => low <= target,
            (None, _) => false,
        }
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ExitReason {
    Signal,
    Stop,
    Target,
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Signal => write!(f, "signal"),
            ExitReason::Stop => write!(f, "stop"),
            ExitReason::Target => write!(f, "target"),
            ExitReason::EndOfData => write!(f, "end_of_data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trade {
    pub symbol: String,
    pub side: PositionSide,
    pub quantity: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub requested_entry_price: f64,
    pub requested_exit_price: f64,
    pub entry_commission: f64,
    pub exit_commission: f64,
    /// entry_commission + exit_commission
    pub commission: f64,
    /// Net of both commissions.
    pub pnl: f64,
    pub entry_timestamp: NaiveDateTime,
    pub exit_timestamp: NaiveDateTime,
    pub entry_reason: String,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }

    /// Return on the entry notional, in percent.
    pub fn return_pct(&self) -> f64 {
        let notional = self.quantity * self.entry_price;
        if notional > 0.0 {
            self.pnl / notional * 100.0
        } else {
            0.0
        }
    }
}

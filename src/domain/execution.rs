//! Trade execution and fill simulation.
//!
//! Implements friction-adjusted fills, equity-percentage sizing, commissions,
//! and stop-loss/take-profit trigger checking.

use chrono::NaiveDateTime;
use log::{debug, warn};
use std::fmt;

use super::ohlcv::Bar;
use super::portfolio::Portfolio;
use super::position::{ExitReason, Position, PositionSide, Trade};
use super::signal::Signal;

const BPS_PER_UNIT: f64 = 10_000.0;

/// Direction of a single order leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

impl PositionSide {
    /// Order side that opens a position on this side.
    pub fn entry_side(self) -> Side {
        match self {
            PositionSide::Long => Side::Buy,
            PositionSide::Short => Side::Sell,
        }
    }

    /// Order side that closes a position on this side.
    pub fn exit_side(self) -> Side {
        match self {
            PositionSide::Long => Side::Sell,
            PositionSide::Short => Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub fill_price: f64,
}

/// Constant basis-point slippage that always works against the trader.
///
/// Buy: requested * (1 + bps / 10000)
/// Sell: requested * (1 - bps / 10000)
pub fn apply_friction(requested_price: f64, side: Side, slippage_bps: f64) -> Fill {
    let fill_price = match side {
        Side::Buy => requested_price * (1.0 + slippage_bps / BPS_PER_UNIT),
        Side::Sell => requested_price * (1.0 - slippage_bps / BPS_PER_UNIT),
    };
    Fill { fill_price }
}

/// Converts a requested price into a realistic fill.
pub trait FrictionModel: Send + Sync {
    fn fill(&self, requested_price: f64, side: Side) -> Fill;
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BpsSlippage {
    pub bps: f64,
}

impl BpsSlippage {
    pub fn new(bps: f64) -> Self {
        BpsSlippage { bps }
    }
}

impl FrictionModel for BpsSlippage {
    fn fill(&self, requested_price: f64, side: Side) -> Fill {
        apply_friction(requested_price, side, self.bps)
    }
}

/// Proportional commission on trade notional.
pub fn calculate_commission(notional: f64, commission_rate: f64) -> f64 {
    notional * commission_rate
}

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        quantity: f64,
        fill_price: f64,
        commission: f64,
    },
    /// Sizing produced a non-finite or non-positive quantity.
    InvalidSize { quantity: f64 },
}

/// Open a position sized as a percentage of current equity.
///
/// 1. Fill the bar close through the friction model on the entry side
/// 2. quantity = equity * size_pct / 100 / fill_price
/// 3. commission = quantity * fill_price * rate
/// 4. Debit notional + commission from cash (shorts escrow their notional)
/// 5. Store the signal's stop-loss/take-profit on the position
pub fn enter_position(
    portfolio: &mut Portfolio,
    side: PositionSide,
    signal: &Signal,
    bar: &Bar,
    friction: &dyn FrictionModel,
    commission_rate: f64,
) -> EntryResult {
    let fill = friction.fill(bar.close, side.entry_side());
    let equity = portfolio.equity();
    let quantity = (equity * signal.size_pct / 100.0) / fill.fill_price;

    if !quantity.is_finite() || quantity <= 0.0 {
        warn!(
            "skipping {} entry for {}: size_pct={} equity={} fill={} gives quantity {}",
            side, signal.symbol, signal.size_pct, equity, fill.fill_price, quantity
        );
        return EntryResult::InvalidSize { quantity };
    }

    let notional = quantity * fill.fill_price;
    let commission = calculate_commission(notional, commission_rate);
    portfolio.cash -= notional + commission;

    let mut position = Position {
        side,
        symbol: signal.symbol.clone(),
        quantity,
        entry_price: fill.fill_price,
        requested_entry_price: bar.close,
        entry_commission: commission,
        entry_timestamp: bar.timestamp,
        entry_reason: signal.reason.clone(),
        mark_price: bar.close,
        unrealized_pnl: 0.0,
        stop_loss: signal.stop_loss,
        take_profit: signal.take_profit,
    };
    position.mark(bar.close);

    debug!(
        "opened {} {} qty={:.6} fill={:.6} commission={:.6} cash={:.2}",
        side, signal.symbol, quantity, fill.fill_price, commission, portfolio.cash
    );

    portfolio.add_position(position);

    EntryResult::Entered {
        quantity,
        fill_price: fill.fill_price,
        commission,
    }
}

/// Close the position for `symbol` at `requested_price`.
///
/// The exit leg goes through the friction model on the closing side. PnL is
/// the signed price move times quantity, minus entry and exit commission.
/// Cash is credited with the position's value at the fill, minus exit
/// commission; for shorts this returns the escrow plus the price-move profit.
pub fn exit_position(
    portfolio: &mut Portfolio,
    symbol: &str,
    requested_price: f64,
    timestamp: NaiveDateTime,
    reason: ExitReason,
    friction: &dyn FrictionModel,
    commission_rate: f64,
) -> Option<Trade> {
    let position = portfolio.remove_position(symbol)?;

    let fill = friction.fill(requested_price, position.side.exit_side());
    let exit_value = position.quantity * fill.fill_price;
    let exit_commission = calculate_commission(exit_value, commission_rate);

    let pnl = position.price_pnl(fill.fill_price) - position.entry_commission - exit_commission;
    portfolio.cash += position.market_value(fill.fill_price) - exit_commission;

    let trade = Trade {
        symbol: position.symbol,
        side: position.side,
        quantity: position.quantity,
        entry_price: position.entry_price,
        exit_price: fill.fill_price,
        requested_entry_price: position.requested_entry_price,
        requested_exit_price: requested_price,
        entry_commission: position.entry_commission,
        exit_commission,
        commission: position.entry_commission + exit_commission,
        pnl,
        entry_timestamp: position.entry_timestamp,
        exit_timestamp: timestamp,
        entry_reason: position.entry_reason,
        exit_reason: reason,
    };

    debug!(
        "closed {} {} ({}) fill={:.6} pnl={:.6} cash={:.2}",
        trade.side, trade.symbol, reason, fill.fill_price, pnl, portfolio.cash
    );

    portfolio.record_trade(trade.clone());
    Some(trade)
}

/// Stop/target level touched by `bar`, if any. The stop is checked first, so
/// a bar that spans both levels exits at the stop.
pub fn check_trigger(position: &Position, bar: &Bar) -> Option<(ExitReason, f64)> {
    let high = bar.high.max(bar.close);
    let low = bar.low.min(bar.close);

    if position.stop_touched(high, low) {
        return position.stop_loss.map(|price| (ExitReason::Stop, price));
    }
    if position.target_touched(high, low) {
        return position.take_profit.map(|price| (ExitReason::Target, price));
    }
    None
}

/// Force-close every position whose stop or target `bar` touched.
///
/// Two passes: collect triggered symbols first, then exit each one.
pub fn check_triggers(
    portfolio: &mut Portfolio,
    bar: &Bar,
    friction: &dyn FrictionModel,
    commission_rate: f64,
) -> Vec<Trade> {
    let triggered: Vec<(String, ExitReason, f64)> = portfolio
        .open_symbols()
        .into_iter()
        .filter_map(|symbol| {
            let position = portfolio.get_position(&symbol)?;
            check_trigger(position, bar).map(|(reason, price)| (symbol, reason, price))
        })
        .collect();

    triggered
        .into_iter()
        .filter_map(|(symbol, reason, price)| {
            exit_position(
                portfolio,
                &symbol,
                price,
                bar.timestamp,
                reason,
                friction,
                commission_rate,
            )
        })
        .collect()
}

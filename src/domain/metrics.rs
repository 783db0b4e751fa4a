//! Performance metrics derived from the trade ledger and equity curve.
//!
//! Returns, drawdown and win rate are percentages. Ratios are annualized
//! with `periods_per_year`.

use super::portfolio::EquityPoint;
use super::position::Trade;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub final_equity: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Non-positive percentage.
    pub max_drawdown: f64,
    /// Longest run of bars spent below a prior peak.
    pub max_drawdown_duration: usize,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    /// Magnitude of the average losing trade.
    pub avg_loss: f64,
    pub largest_win: f64,
    /// Magnitude of the largest losing trade.
    pub largest_loss: f64,
    pub total_commission: f64,
}

impl Metrics {
    pub fn compute(
        trades: &[Trade],
        equity_curve: &[EquityPoint],
        initial_capital: f64,
        risk_free_rate: f64,
        periods_per_year: f64,
    ) -> Self {
        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            (final_equity - initial_capital) / initial_capital * 100.0
        } else {
            0.0
        };

        let annualized_return =
            compute_annualized_return(total_return, equity_curve.len(), periods_per_year);

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);

        let returns = valid_returns(equity_curve);
        let per_period_rf = if periods_per_year > 0.0 {
            risk_free_rate / periods_per_year
        } else {
            0.0
        };
        let (sharpe_ratio, sortino_ratio) =
            compute_risk_adjusted(&returns, per_period_rf, periods_per_year);

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_commission = 0.0_f64;

        for trade in trades {
            let pnl = trade.pnl;
            if pnl > 0.0 {
                trades_won += 1;
                total_wins += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                trades_lost += 1;
                total_losses += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            } else {
                trades_breakeven += 1;
            }
            total_commission += trade.commission;
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            trades_won as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if trades_won > 0 {
            total_wins / trades_won as f64
        } else {
            0.0
        };

        let avg_loss = if trades_lost > 0 {
            total_losses / trades_lost as f64
        } else {
            0.0
        };

        Metrics {
            total_return,
            annualized_return,
            final_equity,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            total_trades,
            trades_won,
            trades_lost,
            trades_breakeven,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            total_commission,
        }
    }
}

/// Per-bar returns, one fewer than the curve. A return measured from a
/// zero-equity point is reported as 0.0.
pub fn per_bar_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| bar_return(w[0].equity, w[1].equity).unwrap_or(0.0))
        .collect()
}

fn bar_return(prev: f64, curr: f64) -> Option<f64> {
    if prev == 0.0 {
        None
    } else {
        Some((curr - prev) / prev)
    }
}

/// Returns usable for statistics: zero-equity points are dropped.
fn valid_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .filter_map(|w| bar_return(w[0].equity, w[1].equity))
        .collect()
}

fn compute_annualized_return(total_return: f64, points: usize, periods_per_year: f64) -> f64 {
    if points < 2 || periods_per_year <= 0.0 {
        return 0.0;
    }
    let growth = 1.0 + total_return / 100.0;
    if growth <= 0.0 {
        return -100.0;
    }
    let years = (points - 1) as f64 / periods_per_year;
    (growth.powf(1.0 / years) - 1.0) * 100.0
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut current_duration = 0usize;
    let mut max_duration = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_duration = 0;
        } else {
            if peak > 0.0 {
                let dd = (point.equity - peak) / peak * 100.0;
                max_dd = max_dd.min(dd);
            }
            current_duration += 1;
            max_duration = max_duration.max(current_duration);
        }
    }

    (max_dd, max_duration)
}

fn population_stats(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn compute_risk_adjusted(returns: &[f64], per_period_rf: f64, periods_per_year: f64) -> (f64, f64) {
    if returns.is_empty() || periods_per_year <= 0.0 {
        return (0.0, 0.0);
    }

    let (mean, stddev) = population_stats(returns);
    let excess_return = mean - per_period_rf;
    let annualization = periods_per_year.sqrt();

    let sharpe = if stddev > 0.0 {
        excess_return / stddev * annualization
    } else {
        0.0
    };

    let downside_sum: f64 = returns
        .iter()
        .filter(|&&r| r < per_period_rf)
        .map(|&r| (r - per_period_rf).powi(2))
        .sum();
    let downside_stddev = (downside_sum / returns.len() as f64).sqrt();

    let sortino = if downside_stddev > 0.0 {
        excess_return / downside_stddev * annualization
    } else {
        0.0
    };

    (sharpe, sortino)
}

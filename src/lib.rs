//! tradesim: deterministic bar-by-bar strategy backtester.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;

pub use domain::backtest::{run, run_blocking, Backtest, BacktestResult};
pub use domain::config::BacktestConfig;
pub use domain::error::TradesimError;
pub use domain::strategy::Strategy;

//! Core domain types and logic.

pub mod ohlcv;
pub mod signal;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod indicator;
pub mod memory;
pub mod context;
pub mod strategy;
pub mod strategies;
pub mod config;
pub mod backtest;
pub mod metrics;
pub mod error;

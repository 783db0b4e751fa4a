//! Reference strategies and the factory that builds them from a
//! [`StrategyDefinition`].

pub mod buy_and_hold;
pub mod rsi_reversion;
pub mod sma_crossover;

pub use buy_and_hold::BuyAndHold;
pub use rsi_reversion::RsiReversion;
pub use sma_crossover::SmaCrossover;

use super::error::TradesimError;
use super::strategy::{Strategy, StrategyDefinition};

/// Symbol used in signals when the caller does not set one. Runs are
/// single-instrument, so the label only shows up in trades.
pub const DEFAULT_SYMBOL: &str = "ASSET";

pub const TEMPLATE_IDS: [&str; 3] = [
    buy_and_hold::TEMPLATE_ID,
    sma_crossover::TEMPLATE_ID,
    rsi_reversion::TEMPLATE_ID,
];

pub fn create_strategy(
    definition: &StrategyDefinition,
) -> Result<Box<dyn Strategy>, TradesimError> {
    let params = definition.params.clone();
    match definition.id.as_str() {
        buy_and_hold::TEMPLATE_ID => Ok(Box::new(BuyAndHold::new(params))),
        sma_crossover::TEMPLATE_ID => Ok(Box::new(SmaCrossover::new(params)?)),
        rsi_reversion::TEMPLATE_ID => Ok(Box::new(RsiReversion::new(params))),
        other => Err(TradesimError::UnknownStrategy {
            id: other.to_string(),
        }),
    }
}

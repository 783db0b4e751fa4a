//! Market-data access port trait.
//!
//! The engine never fetches data itself; callers load bars through a
//! `DataPort` and pass them to a run.

use crate::domain::error::TradesimError;
use crate::domain::ohlcv::Bar;
use chrono::NaiveDateTime;

pub trait DataPort {
    /// Bars for `symbol` with `start <= timestamp <= end`, oldest first.
    fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, TradesimError>;

    fn list_symbols(&self) -> Result<Vec<String>, TradesimError>;
}

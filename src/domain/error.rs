//! Domain error types.

/// Top-level error type for tradesim.
#[derive(Debug, thiserror::Error)]
pub enum TradesimError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    /// Raised by a strategy's per-bar hook.
    #[error("strategy {strategy} failed: {reason}")]
    Strategy { strategy: String, reason: String },

    /// A hook failure as surfaced by the engine, with the bar it aborted on.
    #[error("backtest aborted at bar {bar_index} by strategy {strategy}: {source}")]
    StrategyFailed {
        strategy: String,
        bar_index: usize,
        #[source]
        source: Box<TradesimError>,
    },

    #[error("unknown strategy: {id}")]
    UnknownStrategy { id: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TradesimError {
    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        TradesimError::ConfigInvalid {
            section: "backtest".to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            TradesimError::ConfigParse { .. }
                | TradesimError::ConfigMissing { .. }
                | TradesimError::ConfigInvalid { .. }
        )
    }
}

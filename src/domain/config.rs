//! Backtest configuration and validation.
//!
//! Configuration is validated eagerly, before any bar is processed.

use crate::domain::error::TradesimError;
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "backtest";

pub const DEFAULT_PERIODS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Fraction of notional charged on entry and on exit.
    pub commission_rate: f64,
    pub slippage_bps: f64,
    pub market: String,
    pub allow_shorting: bool,
    /// Annual rate, de-annualized per bar for Sharpe/Sortino.
    pub risk_free_rate: f64,
    pub periods_per_year: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
            commission_rate: 0.0,
            slippage_bps: 0.0,
            market: "default".to_string(),
            allow_shorting: false,
            risk_free_rate: 0.0,
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
        }
    }
}

impl BacktestConfig {
    pub fn new(initial_capital: f64) -> Self {
        BacktestConfig {
            initial_capital,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), TradesimError> {
        validate_initial_capital(self.initial_capital)?;
        validate_commission(self.commission_rate)?;
        validate_slippage(self.slippage_bps)?;
        validate_risk_free_rate(self.risk_free_rate)?;
        validate_periods_per_year(self.periods_per_year)?;
        Ok(())
    }

    /// Build and validate a config from the `[backtest]` section.
    ///
    /// `initial_capital` is required; everything else falls back to
    /// [`BacktestConfig::default`].
    pub fn from_config_port(config: &dyn ConfigPort) -> Result<Self, TradesimError> {
        let defaults = BacktestConfig::default();

        let loaded = BacktestConfig {
            initial_capital: require_double(config, "initial_capital")?,
            commission_rate: optional_double(config, "commission_rate", defaults.commission_rate)?,
            slippage_bps: optional_double(config, "slippage_bps", defaults.slippage_bps)?,
            market: config
                .get_string(SECTION, "market")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.market),
            allow_shorting: config.get_bool(SECTION, "allow_shorting", defaults.allow_shorting),
            risk_free_rate: optional_double(config, "risk_free_rate", defaults.risk_free_rate)?,
            periods_per_year: optional_double(
                config,
                "periods_per_year",
                defaults.periods_per_year,
            )?,
        };

        loaded.validate()?;
        Ok(loaded)
    }
}

fn require_double(config: &dyn ConfigPort, key: &str) -> Result<f64, TradesimError> {
    if config.get_string(SECTION, key).is_none() {
        return Err(TradesimError::ConfigMissing {
            section: SECTION.to_string(),
            key: key.to_string(),
        });
    }
    optional_double(config, key, f64::NAN)
}

/// A present key must parse as a number; a missing key takes `default`.
fn optional_double(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, TradesimError> {
    match config.get_string(SECTION, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| TradesimError::invalid(key, format!("{} must be a number, got {:?}", key, raw))),
    }
}

fn validate_initial_capital(value: f64) -> Result<(), TradesimError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(TradesimError::invalid(
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_commission(value: f64) -> Result<(), TradesimError> {
    if !value.is_finite() || value < 0.0 {
        return Err(TradesimError::invalid(
            "commission_rate",
            "commission_rate must be non-negative",
        ));
    }
    Ok(())
}

fn validate_slippage(value: f64) -> Result<(), TradesimError> {
    if !value.is_finite() || value < 0.0 {
        return Err(TradesimError::invalid(
            "slippage_bps",
            "slippage_bps must be non-negative",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(value: f64) -> Result<(), TradesimError> {
    if !(0.0..1.0).contains(&value) {
        return Err(TradesimError::invalid(
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_periods_per_year(value: f64) -> Result<(), TradesimError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(TradesimError::invalid(
            "periods_per_year",
            "periods_per_year must be positive",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockConfig {
        data: HashMap<(String, String), String>,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                data: HashMap::new(),
            }
        }

        fn set(mut self, key: &str, value: &str) -> Self {
            self.data
                .insert((SECTION.to_string(), key.to_string()), value.to_string());
            self
        }
    }

    impl ConfigPort for MockConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.data
                .get(&(section.to_string(), key.to_string()))
                .cloned()
        }

        fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
            self.get_string(section, key)
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        }

        fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
            self.get_string(section, key)
                .map(|s| s == "true")
                .unwrap_or(default)
        }
    }

    fn expect_invalid(result: Result<(), TradesimError>, expected_key: &str) {
        match result {
            Err(TradesimError::ConfigInvalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected ConfigInvalid for {}, got {:?}", expected_key, other),
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(BacktestConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_capital() {
        expect_invalid(BacktestConfig::new(0.0).validate(), "initial_capital");
        expect_invalid(BacktestConfig::new(-5.0).validate(), "initial_capital");
        expect_invalid(BacktestConfig::new(f64::NAN).validate(), "initial_capital");
    }

    #[test]
    fn rejects_negative_commission() {
        let config = BacktestConfig {
            commission_rate: -0.001,
            ..Default::default()
        };
        expect_invalid(config.validate(), "commission_rate");
    }

    #[test]
    fn rejects_negative_slippage() {
        let config = BacktestConfig {
            slippage_bps: -1.0,
            ..Default::default()
        };
        expect_invalid(config.validate(), "slippage_bps");
    }

    #[test]
    fn rejects_risk_free_out_of_range() {
        let config = BacktestConfig {
            risk_free_rate: 1.0,
            ..Default::default()
        };
        expect_invalid(config.validate(), "risk_free_rate");
    }

    #[test]
    fn rejects_zero_periods_per_year() {
        let config = BacktestConfig {
            periods_per_year: 0.0,
            ..Default::default()
        };
        expect_invalid(config.validate(), "periods_per_year");
    }

    #[test]
    fn from_config_port_full() {
        let port = MockConfig::new()
            .set("initial_capital", "25000")
            .set("commission_rate", "0.001")
            .set("slippage_bps", "5")
            .set("market", " crypto ")
            .set("allow_shorting", "true")
            .set("risk_free_rate", "0.02")
            .set("periods_per_year", "365");

        let config = BacktestConfig::from_config_port(&port).unwrap();
        assert_eq!(config.initial_capital, 25_000.0);
        assert_eq!(config.commission_rate, 0.001);
        assert_eq!(config.slippage_bps, 5.0);
        assert_eq!(config.market, "crypto");
        assert!(config.allow_shorting);
        assert_eq!(config.risk_free_rate, 0.02);
        assert_eq!(config.periods_per_year, 365.0);
    }

    #[test]
    fn from_config_port_defaults() {
        let port = MockConfig::new().set("initial_capital", "1000");
        let config = BacktestConfig::from_config_port(&port).unwrap();
        assert_eq!(config.commission_rate, 0.0);
        assert_eq!(config.market, "default");
        assert_eq!(config.periods_per_year, DEFAULT_PERIODS_PER_YEAR);
    }

    #[test]
    fn from_config_port_missing_capital() {
        let result = BacktestConfig::from_config_port(&MockConfig::new());
        assert!(matches!(result, Err(TradesimError::ConfigMissing { .. })));
    }

    #[test]
    fn from_config_port_non_numeric() {
        let port = MockConfig::new()
            .set("initial_capital", "1000")
            .set("slippage_bps", "lots");
        match BacktestConfig::from_config_port(&port) {
            Err(TradesimError::ConfigInvalid { key, .. }) => assert_eq!(key, "slippage_bps"),
            other => panic!("expected ConfigInvalid, got {:?}", other),
        }
    }

    #[test]
    fn from_config_port_validates() {
        let port = MockConfig::new()
            .set("initial_capital", "1000")
            .set("commission_rate", "-1");
        assert!(BacktestConfig::from_config_port(&port).is_err());
    }
}

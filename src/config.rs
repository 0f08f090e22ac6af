//! Agent configuration
//!
//! The agent reads its settings from a JSON document. Every field is optional
//! and falls back to [`AgentConfig::default`].
//!
//! # Example
//!
//! ```json
//! {
//!   "instrument": { "symbol": "EURUSD", "point": 0.0001, "digits": 4 },
//!   "timeframe": "H1",
//!   "lot_size": 0.1,
//!   "stop_loss": 100,
//!   "take_profit": 200,
//!   "magic": 123456,
//!   "trailing_enabled": true,
//!   "trailing_distance": 50,
//!   "trailing_step": 10
//! }
//! ```
//!
//! Distances are in points. Negative distances and non-positive lot sizes are
//! rejected while parsing, so a bad file never produces a running agent.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    detector::EngulfingDetector, trailing::TrailingStop, AgentError, Lots, Points, Result,
};

// ============================================================
// TIMEFRAME
// ============================================================

/// Bar period of the traded chart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    #[default]
    H1,
    H4,
    D1,
    W1,
    MN1,
}

impl Timeframe {
    /// Nominal bar length in seconds (30 days for MN1)
    pub fn seconds(self) -> i64 {
        match self {
            Timeframe::M1 => 60,
            Timeframe::M5 => 5 * 60,
            Timeframe::M15 => 15 * 60,
            Timeframe::M30 => 30 * 60,
            Timeframe::H1 => 3_600,
            Timeframe::H4 => 4 * 3_600,
            Timeframe::D1 => 86_400,
            Timeframe::W1 => 7 * 86_400,
            Timeframe::MN1 => 30 * 86_400,
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
            Timeframe::W1 => "W1",
            Timeframe::MN1 => "MN1",
        };
        f.write_str(s)
    }
}

// ============================================================
// INSTRUMENT
// ============================================================

/// Traded symbol and its price grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    pub symbol: String,
    /// Smallest price increment
    pub point: f64,
    /// Decimal places prices are rounded to
    pub digits: u32,
}

impl Default for InstrumentSpec {
    fn default() -> Self {
        Self {
            symbol: "EURUSD".to_string(),
            point: 0.00001,
            digits: 5,
        }
    }
}

impl InstrumentSpec {
    pub fn new(symbol: impl Into<String>, point: f64, digits: u32) -> Self {
        Self {
            symbol: symbol.into(),
            point,
            digits,
        }
    }

    /// Round a price to this instrument's digits
    #[inline]
    pub fn normalize(&self, price: f64) -> f64 {
        crate::normalize_price(price, self.digits)
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(AgentError::InvalidConfiguration(
                "instrument.symbol is empty".into(),
            ));
        }
        if !self.point.is_finite() || self.point <= 0.0 {
            return Err(AgentError::InvalidConfiguration(format!(
                "instrument.point must be > 0, got {}",
                self.point
            )));
        }
        if self.digits > 10 {
            return Err(AgentError::InvalidConfiguration(format!(
                "instrument.digits must be <= 10, got {}",
                self.digits
            )));
        }
        Ok(())
    }
}

// ============================================================
// AGENT CONFIG
// ============================================================

/// Full agent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub instrument: InstrumentSpec,
    pub timeframe: Timeframe,
    /// Fixed volume of every entry
    pub lot_size: Lots,
    /// Stop-loss distance from entry; zero places no stop
    pub stop_loss: Points,
    /// Take-profit distance from entry; zero places no target
    pub take_profit: Points,
    pub enable_bullish: bool,
    pub enable_bearish: bool,
    /// Agent identifier stamped on orders and used to recognise own positions
    pub magic: u64,
    pub comment: String,
    /// Allow at most one entry per completed bar
    pub single_trade_per_signal: bool,
    /// Minimum body of both pattern bars
    pub min_body: Points,
    pub trailing_enabled: bool,
    pub trailing_distance: Points,
    pub trailing_step: Points,
    /// Maximum accepted slippage on market orders
    pub deviation: Points,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            instrument: InstrumentSpec::default(),
            timeframe: Timeframe::default(),
            lot_size: Lots::new_const(0.1),
            stop_loss: Points::new_const(100.0),
            take_profit: Points::new_const(200.0),
            enable_bullish: true,
            enable_bearish: true,
            magic: 123_456,
            comment: "Engulfing".to_string(),
            single_trade_per_signal: true,
            min_body: Points::new_const(10.0),
            trailing_enabled: false,
            trailing_distance: Points::new_const(50.0),
            trailing_step: Points::new_const(10.0),
            deviation: Points::new_const(10.0),
        }
    }
}

impl AgentConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AgentConfig = serde_json::from_str(json).map_err(|e| match e.classify() {
            serde_json::error::Category::Data => AgentError::InvalidConfiguration(e.to_string()),
            _ => AgentError::Config(e.to_string()),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| AgentError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Cross-field checks that single-field validation cannot express
    pub fn validate(&self) -> Result<()> {
        self.instrument.validate()?;

        if self.magic == 0 {
            return Err(AgentError::InvalidConfiguration(
                "magic must be non-zero; 0 is shared with manual trades".into(),
            ));
        }
        if self.trailing_enabled && self.trailing_distance.is_zero() {
            return Err(AgentError::InvalidConfiguration(
                "trailing_distance must be > 0 when trailing is enabled".into(),
            ));
        }
        if !self.enable_bullish && !self.enable_bearish {
            tracing::warn!("both pattern directions disabled, agent will never enter");
        }
        Ok(())
    }

    pub fn detector(&self) -> EngulfingDetector {
        EngulfingDetector::new(self.min_body, self.enable_bullish, self.enable_bearish)
    }

    /// Trailing stop settings, if trailing is enabled
    pub fn trailing_stop(&self) -> Option<TrailingStop> {
        self.trailing_enabled
            .then(|| TrailingStop::new(self.trailing_distance, self.trailing_step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AgentConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = AgentConfig::from_json_str("{}").unwrap();
        assert_eq!(config, AgentConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config = AgentConfig::from_json_str(
            r#"{
                "instrument": { "symbol": "GBPUSD", "point": 0.0001, "digits": 4 },
                "timeframe": "M15",
                "lot_size": 0.5,
                "trailing_enabled": true,
                "trailing_distance": 30
            }"#,
        )
        .unwrap();
        assert_eq!(config.instrument.symbol, "GBPUSD");
        assert_eq!(config.timeframe, Timeframe::M15);
        assert_eq!(config.lot_size.get(), 0.5);
        assert_eq!(config.trailing_distance.get(), 30.0);
        assert_eq!(config.trailing_step.get(), 10.0);
        assert!(config.trailing_stop().is_some());
    }

    #[test]
    fn test_negative_distance_is_invalid_configuration() {
        let err = AgentConfig::from_json_str(r#"{ "stop_loss": -5 }"#).unwrap_err();
        assert!(matches!(err, AgentError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_zero_lot_is_invalid_configuration() {
        let err = AgentConfig::from_json_str(r#"{ "lot_size": 0 }"#).unwrap_err();
        assert!(matches!(err, AgentError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = AgentConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[test]
    fn test_trailing_without_distance_rejected() {
        let config = AgentConfig {
            trailing_enabled: true,
            trailing_distance: Points::new_const(0.0),
            ..AgentConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_magic_rejected() {
        let config = AgentConfig {
            magic: 0,
            ..AgentConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AgentError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_bad_instrument_rejected() {
        let mut config = AgentConfig::default();
        config.instrument.point = 0.0;
        assert!(config.validate().is_err());

        let mut config = AgentConfig::default();
        config.instrument.symbol = " ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_trailing_disabled_gives_none() {
        assert!(AgentConfig::default().trailing_stop().is_none());
    }

    #[test]
    fn test_timeframe_seconds_and_display() {
        assert_eq!(Timeframe::M5.seconds(), 300);
        assert_eq!(Timeframe::H4.seconds(), 14_400);
        assert_eq!(Timeframe::MN1.to_string(), "MN1");
        let tf: Timeframe = serde_json::from_str("\"D1\"").unwrap();
        assert_eq!(tf, Timeframe::D1);
    }

    #[test]
    fn test_instrument_normalize() {
        let spec = InstrumentSpec::new("EURUSD", 0.0001, 4);
        assert_eq!(spec.normalize(1.100_06), 1.1001);
    }
}

//! # engulfing-agent
//!
//! Trading agent core that detects two-bar engulfing reversals on each newly
//! closed bar, opens protected market orders, and trails stops on every tick.
//!
//! All I/O goes through the [`PriceFeed`](venue::PriceFeed),
//! [`ExecutionGateway`](venue::ExecutionGateway) and
//! [`PositionRegistry`](venue::PositionRegistry) traits. All mutable state
//! lives in an explicit [`AgentState`](agent::AgentState) that the host
//! threads through each update.
//!
//! ## Quick Start
//!
//! ```rust
//! use engulfing_agent::prelude::*;
//!
//! let config = AgentConfig::default();
//! let agent = EngulfingAgent::new(config.clone()).unwrap();
//! let mut state = AgentState::default();
//!
//! let mut venue = PaperVenue::new(config.instrument.clone());
//! venue.push_bar(Bar::new(1.1050, 1.1055, 1.1015, 1.1020, 0));
//! venue.push_bar(Bar::new(1.1015, 1.1065, 1.1010, 1.1060, 3_600));
//! venue.push_bar(Bar::new(1.1060, 1.1062, 1.1058, 1.1061, 7_200));
//! venue.set_quote(1.10610, 1.10620);
//!
//! // Called by the host on every price change.
//! agent.on_market_update(&mut state, &mut venue);
//! assert_eq!(state.stats.orders_opened, 1);
//! ```

pub mod agent;
pub mod clock;
pub mod config;
pub mod detector;
pub mod entry;
pub mod logging;
pub mod paper;
pub mod trailing;
pub mod venue;

pub mod prelude {
    pub use crate::{
        // Agent
        agent::{AgentState, AgentStats, EngulfingAgent},
        // Bar gate
        clock::BarClock,
        // Configuration
        config::{AgentConfig, InstrumentSpec, Timeframe},
        // Detection
        detector::{classify, EngulfingDetector, PatternResult},
        // Position management
        entry::{EntryManager, OrderRequest, Signal},
        paper::PaperVenue,
        trailing::TrailingStop,
        venue::{ExecutionGateway, OrderTicket, Position, PositionRegistry, PriceFeed, Quote, Venue},
        // Errors
        AgentError,
        // Types
        Bar,
        Lots,
        OHLCExt,
        Points,
        Result,
        Side,
        OHLC,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors raised by the agent core and its collaborators
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgentError {
    /// Bar or quote data could not be retrieved for this cycle
    #[error("Feed unavailable: {0}")]
    FeedUnavailable(String),

    /// The gateway declined an order or a modification
    #[error("Execution rejected (code {code}): {reason}")]
    ExecutionRejected { code: u32, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid bar: {reason}")]
    InvalidBar { reason: &'static str },

    #[error("Config error: {0}")]
    Config(String),
}

impl AgentError {
    /// Shorthand for a gateway rejection
    pub fn rejected(code: u32, reason: impl Into<String>) -> Self {
        AgentError::ExecutionRejected {
            code,
            reason: reason.into(),
        }
    }

    /// True for errors that only affect the current update cycle
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AgentError::FeedUnavailable(_) | AgentError::ExecutionRejected { .. }
        )
    }
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Distance measured in instrument points (finite, >= 0).
///
/// Zero is meaningful: a zero stop-loss or take-profit distance means
/// "no stop" / "no target".
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Points(f64);

impl Points {
    /// Create a new distance, rejecting NaN, infinity and negatives
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(AgentError::InvalidValue(
                "Points cannot be NaN or infinite",
            ));
        }
        if value < 0.0 {
            return Err(AgentError::OutOfRange {
                field: "Points",
                value,
                min: 0.0,
                max: f64::MAX,
            });
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }

    /// Convert to a price offset for an instrument with the given point size
    #[inline]
    pub fn to_price(self, point: f64) -> f64 {
        self.0 * point
    }
}

impl serde::Serialize for Points {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Points {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Points::new(value).map_err(serde::de::Error::custom)
    }
}

/// Order volume in lots (finite, > 0)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Lots(f64);

impl Lots {
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(AgentError::InvalidValue("Lots cannot be NaN or infinite"));
        }
        if value <= 0.0 {
            return Err(AgentError::InvalidValue("Lots must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Lots {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Lots {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Lots::new(value).map_err(serde::de::Error::custom)
    }
}

/// Tolerance used when comparing distances expressed in points.
///
/// Prices like 1.1025 - 1.1010 are not exact in binary floating point, so
/// point comparisons allow this much slack.
pub const POINT_EPSILON: f64 = 1e-6;

/// Round a price to the instrument's number of digits
#[inline]
pub fn normalize_price(price: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (price * factor).round() / factor
}

// ============================================================
// OHLC TRAITS
// ============================================================

/// Core bar data trait
pub trait OHLC {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;

    fn timestamp(&self) -> i64;
}

/// Extension trait with computed properties for bar data
pub trait OHLCExt: OHLC {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    /// Body size expressed in instrument points
    #[inline]
    fn body_points(&self, point: f64) -> f64 {
        self.body() / point
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Validate bar data consistency
    fn validate(&self) -> Result<()> {
        let values = [self.open(), self.high(), self.low(), self.close()];
        if values.iter().any(|v| v.is_nan()) {
            return Err(AgentError::InvalidBar {
                reason: "NaN in OHLC",
            });
        }
        if values.iter().any(|v| v.is_infinite()) {
            return Err(AgentError::InvalidBar {
                reason: "Infinite value in OHLC",
            });
        }
        if self.high() < self.low() {
            return Err(AgentError::InvalidBar {
                reason: "high < low",
            });
        }
        Ok(())
    }
}

impl<T: OHLC> OHLCExt for T {}

/// A completed price bar as supplied by the feed
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Bar open time, seconds since the epoch
    pub timestamp: i64,
}

impl Bar {
    pub fn new(open: f64, high: f64, low: f64, close: f64, timestamp: i64) -> Self {
        Self {
            open,
            high,
            low,
            close,
            timestamp,
        }
    }
}

impl OHLC for Bar {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

// ============================================================
// SIDE
// ============================================================

/// Trade direction. `Buy` opens or denotes a long position, `Sell` a short one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    #[inline]
    pub fn is_buy(self) -> bool {
        matches!(self, Side::Buy)
    }

    #[inline]
    pub fn is_sell(self) -> bool {
        matches!(self, Side::Sell)
    }

    /// +1.0 for buys, -1.0 for sells
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => f.write_str("BUY"),
            Side::Sell => f.write_str("SELL"),
        }
    }
}

// ============================================================
// TESTS
// ============================================================

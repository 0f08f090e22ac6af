//! Collaborator interfaces
//!
//! The agent never talks to a broker directly. Price data, order execution
//! and the list of open positions come from implementations of these traits,
//! supplied by the host (or [`crate::paper::PaperVenue`] for dry runs).

use crate::{config::Timeframe, entry::OrderRequest, Bar, Result, Side};

// ============================================================
// MARKET DATA
// ============================================================

/// Current top-of-book prices
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Quote {
    pub bid: f64,
    pub ask: f64,
}

impl Quote {
    pub fn new(bid: f64, ask: f64) -> Self {
        Self { bid, ask }
    }

    /// Price at which a new position on `side` is opened (ask for buys)
    #[inline]
    pub fn entry_price(&self, side: Side) -> f64 {
        match side {
            Side::Buy => self.ask,
            Side::Sell => self.bid,
        }
    }

    /// Price at which an existing position on `side` is closed (bid for longs)
    #[inline]
    pub fn exit_price(&self, side: Side) -> f64 {
        match side {
            Side::Buy => self.bid,
            Side::Sell => self.ask,
        }
    }

    #[inline]
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }
}

/// Source of bar history and live quotes
pub trait PriceFeed {
    /// Bar `bars_ago` bars back. 0 is the bar currently forming, 1 the last
    /// closed bar.
    fn bar(&self, symbol: &str, timeframe: Timeframe, bars_ago: usize) -> Result<Bar>;

    fn quote(&self, symbol: &str) -> Result<Quote>;
}

// ============================================================
// EXECUTION
// ============================================================

/// Acknowledgement of a filled market order
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrderTicket {
    pub position_id: u64,
    /// Fill price reported by the venue
    pub price: f64,
}

/// Order submission and position modification.
///
/// Calls block until the venue acknowledges them.
pub trait ExecutionGateway {
    fn submit_market_order(&mut self, request: &OrderRequest) -> Result<OrderTicket>;

    /// Replace the protective levels of an open position. `None` clears a level.
    fn modify_position(
        &mut self,
        position_id: u64,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
    ) -> Result<()>;
}

// ============================================================
// POSITIONS
// ============================================================

/// Open position as reported by the venue
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub id: u64,
    pub symbol: String,
    pub side: Side,
    pub volume: f64,
    pub open_price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    /// Identifier of the agent that opened the position
    pub magic: u64,
}

impl Position {
    #[inline]
    pub fn is_owned_by(&self, symbol: &str, magic: u64) -> bool {
        self.magic == magic && self.symbol == symbol
    }
}

/// Enumerates currently open positions
pub trait PositionRegistry {
    /// Positions on `symbol` opened under `magic`. Implementations may be
    /// permissive; callers filter again.
    fn open_positions(&self, symbol: &str, magic: u64) -> Vec<Position>;
}

/// Everything the agent needs from the outside world
pub trait Venue: PriceFeed + ExecutionGateway + PositionRegistry {}

impl<T: PriceFeed + ExecutionGateway + PositionRegistry + ?Sized> Venue for T {}

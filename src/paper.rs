//! In-memory paper venue
//!
//! Implements all three collaborator traits for dry runs, tests and benches.
//! Market orders fill instantly at the requested price. Failures can be
//! injected to exercise the agent's error paths.

use crate::{
    config::{InstrumentSpec, Timeframe},
    entry::OrderRequest,
    venue::{ExecutionGateway, OrderTicket, Position, PositionRegistry, PriceFeed, Quote},
    AgentError, Bar, Result, Side,
};

/// Request rejected by the venue
pub const RETCODE_REJECT: u32 = 10006;
/// Malformed request (wrong symbol, bad volume)
pub const RETCODE_INVALID: u32 = 10013;
/// Stop level on the wrong side of the market
pub const RETCODE_INVALID_STOPS: u32 = 10016;
/// Position no longer exists
pub const RETCODE_POSITION_CLOSED: u32 = 10036;

/// A stop/target modification seen by the venue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modification {
    pub position_id: u64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct PaperVenue {
    instrument: InstrumentSpec,
    bars: Vec<Bar>,
    quote: Option<Quote>,
    positions: Vec<Position>,
    orders: Vec<OrderRequest>,
    modifications: Vec<Modification>,
    next_position_id: u64,
    reject_orders: usize,
    reject_modifications: usize,
    feed_available: bool,
    permissive_registry: bool,
}

impl PaperVenue {
    pub fn new(instrument: InstrumentSpec) -> Self {
        Self {
            instrument,
            bars: Vec::new(),
            quote: None,
            positions: Vec::new(),
            orders: Vec::new(),
            modifications: Vec::new(),
            next_position_id: 1,
            reject_orders: 0,
            reject_modifications: 0,
            feed_available: true,
            permissive_registry: false,
        }
    }

    // ===========================================
    // Market data
    // ===========================================

    /// Append a bar. The last pushed bar is the one currently forming.
    pub fn push_bar(&mut self, bar: Bar) {
        self.bars.push(bar);
    }

    /// Update the forming bar in place, or push one if there is none
    pub fn update_last_bar(&mut self, bar: Bar) {
        match self.bars.last_mut() {
            Some(last) => *last = bar,
            None => self.bars.push(bar),
        }
    }

    pub fn set_quote(&mut self, bid: f64, ask: f64) {
        self.quote = Some(Quote::new(bid, ask));
    }

    /// Simulate a data outage: bars and quotes fail while `false`
    pub fn set_feed_available(&mut self, available: bool) {
        self.feed_available = available;
    }

    // ===========================================
    // Failure injection
    // ===========================================

    pub fn reject_next_orders(&mut self, n: usize) {
        self.reject_orders = n;
    }

    pub fn reject_next_modifications(&mut self, n: usize) {
        self.reject_modifications = n;
    }

    /// List every position regardless of the symbol/magic filter, like venues
    /// whose position query ignores it
    pub fn set_permissive_registry(&mut self, permissive: bool) {
        self.permissive_registry = permissive;
    }

    // ===========================================
    // Inspection
    // ===========================================

    /// Insert a position opened elsewhere (another agent, a manual trade)
    pub fn add_position(&mut self, mut position: Position) -> u64 {
        position.id = self.next_position_id;
        self.next_position_id += 1;
        let id = position.id;
        self.positions.push(position);
        id
    }

    pub fn close_position(&mut self, position_id: u64) -> Option<Position> {
        let index = self.positions.iter().position(|p| p.id == position_id)?;
        Some(self.positions.remove(index))
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn position(&self, position_id: u64) -> Option<&Position> {
        self.positions.iter().find(|p| p.id == position_id)
    }

    pub fn submitted_orders(&self) -> &[OrderRequest] {
        &self.orders
    }

    pub fn modifications(&self) -> &[Modification] {
        &self.modifications
    }

    fn check_feed(&self) -> Result<()> {
        if self.feed_available {
            Ok(())
        } else {
            Err(AgentError::FeedUnavailable("paper feed offline".into()))
        }
    }

    fn check_symbol(&self, symbol: &str) -> Result<()> {
        if symbol == self.instrument.symbol {
            Ok(())
        } else {
            Err(AgentError::FeedUnavailable(format!("unknown symbol {symbol}")))
        }
    }
}

impl PriceFeed for PaperVenue {
    /// Single series: the timeframe is not checked
    fn bar(&self, symbol: &str, _timeframe: Timeframe, bars_ago: usize) -> Result<Bar> {
        self.check_feed()?;
        self.check_symbol(symbol)?;
        let len = self.bars.len();
        if bars_ago >= len {
            return Err(AgentError::FeedUnavailable(format!(
                "need {} bars, have {len}",
                bars_ago + 1
            )));
        }
        Ok(self.bars[len - 1 - bars_ago])
    }

    fn quote(&self, symbol: &str) -> Result<Quote> {
        self.check_feed()?;
        self.check_symbol(symbol)?;
        self.quote
            .ok_or_else(|| AgentError::FeedUnavailable("no quote yet".into()))
    }
}

impl ExecutionGateway for PaperVenue {
    fn submit_market_order(&mut self, request: &OrderRequest) -> Result<OrderTicket> {
        self.orders.push(request.clone());

        if self.reject_orders > 0 {
            self.reject_orders -= 1;
            return Err(AgentError::rejected(RETCODE_REJECT, "request rejected"));
        }
        if request.symbol != self.instrument.symbol || request.volume <= 0.0 {
            return Err(AgentError::rejected(RETCODE_INVALID, "invalid request"));
        }

        let position_id = self.next_position_id;
        self.next_position_id += 1;
        self.positions.push(Position {
            id: position_id,
            symbol: request.symbol.clone(),
            side: request.side,
            volume: request.volume,
            open_price: request.price,
            stop_loss: request.stop_loss,
            take_profit: request.take_profit,
            magic: request.magic,
        });

        Ok(OrderTicket {
            position_id,
            price: request.price,
        })
    }

    fn modify_position(
        &mut self,
        position_id: u64,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
    ) -> Result<()> {
        self.modifications.push(Modification {
            position_id,
            stop_loss,
            take_profit,
        });

        if self.reject_modifications > 0 {
            self.reject_modifications -= 1;
            return Err(AgentError::rejected(RETCODE_REJECT, "modification rejected"));
        }

        let quote = self.quote;
        let position = self
            .positions
            .iter_mut()
            .find(|p| p.id == position_id)
            .ok_or_else(|| AgentError::rejected(RETCODE_POSITION_CLOSED, "position not found"))?;

        // A stop must sit on the losing side of the close price
        if let (Some(stop), Some(quote)) = (stop_loss, quote) {
            let valid = match position.side {
                Side::Buy => stop < quote.bid,
                Side::Sell => stop > quote.ask,
            };
            if !valid {
                return Err(AgentError::rejected(RETCODE_INVALID_STOPS, "invalid stops"));
            }
        }

        position.stop_loss = stop_loss;
        position.take_profit = take_profit;
        Ok(())
    }
}

impl PositionRegistry for PaperVenue {
    fn open_positions(&self, symbol: &str, magic: u64) -> Vec<Position> {
        self.positions
            .iter()
            .filter(|p| self.permissive_registry || p.is_owned_by(symbol, magic))
            .cloned()
            .collect()
    }
}

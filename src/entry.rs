//! Entry side of position management
//!
//! Turns a detected [`Signal`] into a market [`OrderRequest`] with fixed
//! stop-loss / take-profit offsets and submits it once.

use tracing::{info, warn};

use crate::{
    clock::BarClock,
    config::{AgentConfig, InstrumentSpec},
    venue::{ExecutionGateway, OrderTicket, PriceFeed, Quote},
    Lots, Points, Result, Side,
};

/// A detected engulfing signal, consumed immediately
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Signal {
    pub side: Side,
    /// Timestamp of the bar that completed the pattern
    pub detected_at: i64,
}

/// Market order handed to the execution gateway
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub volume: f64,
    /// Expected fill price (ask for buys, bid for sells)
    pub price: f64,
    /// `None` when the configured distance is zero
    pub stop_loss: Option<f64>,
    /// `None` when the configured distance is zero
    pub take_profit: Option<f64>,
    /// Maximum slippage in points
    pub deviation: u64,
    pub magic: u64,
    pub comment: String,
}

/// Builds and submits entry orders
#[derive(Debug, Clone, PartialEq)]
pub struct EntryManager {
    pub instrument: InstrumentSpec,
    pub lot_size: Lots,
    pub stop_loss: Points,
    pub take_profit: Points,
    pub deviation: Points,
    pub magic: u64,
    pub comment: String,
}

impl EntryManager {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            instrument: config.instrument.clone(),
            lot_size: config.lot_size,
            stop_loss: config.stop_loss,
            take_profit: config.take_profit,
            deviation: config.deviation,
            magic: config.magic,
            comment: config.comment.clone(),
        }
    }

    /// Stop-loss and take-profit for an entry at `price`
    pub fn protective_levels(&self, side: Side, price: f64) -> (Option<f64>, Option<f64>) {
        let point = self.instrument.point;
        let sign = side.sign();

        let stop_loss = (!self.stop_loss.is_zero()).then(|| {
            self.instrument
                .normalize(price - sign * self.stop_loss.to_price(point))
        });
        let take_profit = (!self.take_profit.is_zero()).then(|| {
            self.instrument
                .normalize(price + sign * self.take_profit.to_price(point))
        });

        (stop_loss, take_profit)
    }

    pub fn build_request(&self, side: Side, quote: &Quote) -> OrderRequest {
        let price = self.instrument.normalize(quote.entry_price(side));
        let (stop_loss, take_profit) = self.protective_levels(side, price);

        OrderRequest {
            symbol: self.instrument.symbol.clone(),
            side,
            volume: self.lot_size.get(),
            price,
            stop_loss,
            take_profit,
            deviation: self.deviation.get().round() as u64,
            magic: self.magic,
            comment: self.comment.clone(),
        }
    }

    /// Submit one market order for `signal`.
    ///
    /// On success the bar gate is marked so no second entry happens in the
    /// same bar. On failure the gate is left alone and the error is returned;
    /// there is no retry.
    pub fn open_position<V>(
        &self,
        signal: &Signal,
        venue: &mut V,
        clock: &mut BarClock,
    ) -> Result<OrderTicket>
    where
        V: PriceFeed + ExecutionGateway + ?Sized,
    {
        let quote = venue.quote(&self.instrument.symbol)?;
        let request = self.build_request(signal.side, &quote);

        match venue.submit_market_order(&request) {
            Ok(ticket) => {
                clock.mark_trade_taken();
                info!(
                    side = %request.side,
                    position_id = ticket.position_id,
                    price = ticket.price,
                    stop_loss = ?request.stop_loss,
                    take_profit = ?request.take_profit,
                    "position opened"
                );
                Ok(ticket)
            }
            Err(e) => {
                warn!(side = %request.side, price = request.price, error = %e, "error opening order");
                Err(e)
            }
        }
    }
}

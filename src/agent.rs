//! The agent: per-update orchestration
//!
//! [`EngulfingAgent`] holds immutable settings; everything that changes
//! between updates lives in [`AgentState`], which the host owns and passes
//! back in on every call.

use tracing::{debug, info};

use crate::{
    clock::BarClock,
    config::AgentConfig,
    detector::EngulfingDetector,
    entry::{EntryManager, Signal},
    trailing::TrailingStop,
    venue::{PriceFeed, Venue},
    AgentError, OHLCExt, Result,
};

/// Counters for operator visibility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentStats {
    /// Bar transitions observed
    pub bars_seen: u64,
    pub signals: u64,
    pub orders_opened: u64,
    pub orders_rejected: u64,
    pub stops_modified: u64,
    pub modify_rejected: u64,
    /// Cycles skipped because bar or quote data was missing
    pub feed_errors: u64,
}

/// Mutable agent state, threaded through every update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentState {
    pub clock: BarClock,
    /// Position id returned by the most recent successful entry
    pub last_position_id: Option<u64>,
    pub last_signal: Option<Signal>,
    pub stats: AgentStats,
}

/// Engulfing-pattern trading agent
#[derive(Debug, Clone)]
pub struct EngulfingAgent {
    config: AgentConfig,
    detector: EngulfingDetector,
    entry: EntryManager,
    trailing: Option<TrailingStop>,
}

impl EngulfingAgent {
    /// Build an agent, rejecting invalid configuration up front
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            detector: config.detector(),
            entry: EntryManager::from_config(&config),
            trailing: config.trailing_stop(),
            config,
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Entry point invoked by the host on every price change.
    ///
    /// Trails stops on every call, then evaluates the pattern once per new
    /// bar. Feed and execution failures are logged and counted; they never
    /// stop the agent.
    pub fn on_market_update<V: Venue + ?Sized>(&self, state: &mut AgentState, venue: &mut V) {
        if let Some(trailing) = &self.trailing {
            let report = trailing.apply(venue, &self.config.instrument, self.config.magic);
            state.stats.stops_modified += report.modified as u64;
            state.stats.modify_rejected += report.rejected as u64;
        }

        self.on_bar(state, venue);
    }

    fn on_bar<V: Venue + ?Sized>(&self, state: &mut AgentState, venue: &mut V) {
        let symbol = &self.config.instrument.symbol;

        let current = match venue.bar(symbol, self.config.timeframe, 0) {
            Ok(bar) => bar,
            Err(e) => {
                debug!(error = %e, "current bar unavailable");
                state.stats.feed_errors += 1;
                return;
            }
        };

        if !state.clock.on_update(current.timestamp) {
            return;
        }
        state.stats.bars_seen += 1;

        if !state
            .clock
            .entry_allowed(self.config.single_trade_per_signal)
        {
            return;
        }

        let signal = match self.detect(&*venue) {
            Ok(Some(signal)) => signal,
            Ok(None) => return,
            Err(e) => {
                debug!(error = %e, "pattern evaluation skipped");
                state.stats.feed_errors += 1;
                return;
            }
        };

        info!(side = %signal.side, bar = signal.detected_at, "engulfing signal");
        state.stats.signals += 1;
        state.last_signal = Some(signal);

        match self.entry.open_position(&signal, venue, &mut state.clock) {
            Ok(ticket) => {
                state.stats.orders_opened += 1;
                state.last_position_id = Some(ticket.position_id);
            }
            Err(AgentError::FeedUnavailable(_)) => state.stats.feed_errors += 1,
            Err(_) => state.stats.orders_rejected += 1,
        }
    }

    /// Classify the two most recently closed bars
    pub fn detect<V: PriceFeed + ?Sized>(&self, feed: &V) -> Result<Option<Signal>> {
        let symbol = &self.config.instrument.symbol;
        let bar1 = feed.bar(symbol, self.config.timeframe, 1)?;
        let bar2 = feed.bar(symbol, self.config.timeframe, 2)?;
        bar1.validate()?;
        bar2.validate()?;

        let result = self
            .detector
            .classify(&bar1, &bar2, self.config.instrument.point);

        Ok(result.side().map(|side| Signal {
            side,
            detected_at: bar1.timestamp,
        }))
    }
}

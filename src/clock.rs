//! Per-bar gate
//!
//! Debounces pattern evaluation to once per bar transition and tracks whether
//! an entry was already taken in the current bar.

/// Bar clock with the per-bar trade gate.
///
/// The first observed timestamp counts as a new bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BarClock {
    last_processed_bar: Option<i64>,
    trade_taken: bool,
}

impl BarClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the timestamp of the bar currently forming.
    ///
    /// Returns `true` exactly once per bar transition. On a transition the
    /// stored timestamp is replaced and the trade flag is cleared; otherwise
    /// nothing changes.
    pub fn on_update(&mut self, current_bar_timestamp: i64) -> bool {
        if self.last_processed_bar == Some(current_bar_timestamp) {
            return false;
        }
        self.last_processed_bar = Some(current_bar_timestamp);
        self.trade_taken = false;
        true
    }

    #[inline]
    pub fn last_processed_bar(&self) -> Option<i64> {
        self.last_processed_bar
    }

    #[inline]
    pub fn trade_taken(&self) -> bool {
        self.trade_taken
    }

    pub fn mark_trade_taken(&mut self) {
        self.trade_taken = true;
    }

    /// Whether a new entry is allowed in the current bar
    #[inline]
    pub fn entry_allowed(&self, single_trade_per_signal: bool) -> bool {
        !(single_trade_per_signal && self.trade_taken)
    }
}

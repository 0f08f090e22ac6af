//! Engulfing pattern detection
//!
//! Classifies the two most recently completed bars. `bar1` is the latest
//! closed bar, `bar2` the one immediately before it.

use crate::{OHLCExt, Points, Side, OHLC, POINT_EPSILON};

// ============================================================
// PATTERN RESULT
// ============================================================

/// Outcome of classifying a bar pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PatternResult {
    #[default]
    None,
    BullishEngulfing,
    BearishEngulfing,
}

impl PatternResult {
    /// Order side implied by the pattern, if any
    #[inline]
    pub fn side(self) -> Option<Side> {
        match self {
            PatternResult::None => None,
            PatternResult::BullishEngulfing => Some(Side::Buy),
            PatternResult::BearishEngulfing => Some(Side::Sell),
        }
    }

    #[inline]
    pub fn is_match(self) -> bool {
        !matches!(self, PatternResult::None)
    }
}

// ============================================================
// ENGULFING DETECTOR
// ============================================================

/// Two-bar engulfing detector with a minimum body filter.
///
/// Unlike the TA-Lib variant, both body edges must be strictly engulfed.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EngulfingDetector {
    /// Minimum body of both bars, in points
    pub min_body: Points,
    pub enable_bullish: bool,
    pub enable_bearish: bool,
}

impl Default for EngulfingDetector {
    fn default() -> Self {
        Self {
            min_body: Points::new_const(10.0),
            enable_bullish: true,
            enable_bearish: true,
        }
    }
}

impl EngulfingDetector {
    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn new(min_body: Points, enable_bullish: bool, enable_bearish: bool) -> Self {
        Self {
            min_body,
            enable_bullish,
            enable_bearish,
        }
    }

    /// Classify `bar1` (latest closed) against `bar2` (the bar before it)
    pub fn classify<T: OHLC>(&self, bar1: &T, bar2: &T, point: f64) -> PatternResult {
        if !has_min_body(bar1, self.min_body, point) || !has_min_body(bar2, self.min_body, point)
        {
            return PatternResult::None;
        }

        if self.enable_bullish && is_bullish_engulfing(bar1, bar2) {
            return PatternResult::BullishEngulfing;
        }

        if self.enable_bearish && is_bearish_engulfing(bar1, bar2) {
            return PatternResult::BearishEngulfing;
        }

        PatternResult::None
    }
}

/// Free-function form of [`EngulfingDetector::classify`]
pub fn classify<T: OHLC>(
    bar1: &T,
    bar2: &T,
    min_body: Points,
    point: f64,
    enable_bullish: bool,
    enable_bearish: bool,
) -> PatternResult {
    EngulfingDetector::new(min_body, enable_bullish, enable_bearish).classify(bar1, bar2, point)
}

// ============================================================
// SHAPE CHECKS
// ============================================================

/// Zero-size bodies never pass, whatever the threshold.
#[inline]
fn has_min_body<T: OHLC>(bar: &T, min_body: Points, point: f64) -> bool {
    let body = bar.body();
    body > 0.0 && bar.body_points(point) + POINT_EPSILON >= min_body.get()
}

/// Bearish bar2 whose body is fully engulfed by bullish bar1
#[inline]
fn is_bullish_engulfing<T: OHLC>(bar1: &T, bar2: &T) -> bool {
    bar2.is_bearish()
        && bar1.is_bullish()
        && bar1.open() < bar2.close()
        && bar1.close() > bar2.open()
}

/// Bullish bar2 whose body is fully engulfed by bearish bar1
#[inline]
fn is_bearish_engulfing<T: OHLC>(bar1: &T, bar2: &T) -> bool {
    bar2.is_bullish()
        && bar1.is_bearish()
        && bar1.open() > bar2.close()
        && bar1.close() < bar2.open()
}

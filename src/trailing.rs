//! Trailing-stop management
//!
//! Runs on every update, independent of the bar gate. A stop only ever moves
//! in the profit-protecting direction, and only by at least `step` points at a
//! time.

use tracing::{debug, info, warn};

use crate::{
    config::InstrumentSpec,
    venue::{Position, Quote, Venue},
    Points, Side, POINT_EPSILON,
};

/// Trailing distance and hysteresis step, both in points
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrailingStop {
    /// Gap kept between the close price and the stop; also the profit needed
    /// before trailing starts
    pub distance: Points,
    /// Minimum improvement over the current stop
    pub step: Points,
}

/// Outcome of one trailing pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrailingReport {
    pub evaluated: usize,
    pub modified: usize,
    pub rejected: usize,
}

impl TrailingStop {
    pub fn new(distance: Points, step: Points) -> Self {
        Self { distance, step }
    }

    /// New stop for `position`, or `None` when it should stay where it is
    pub fn evaluate(
        &self,
        position: &Position,
        quote: &Quote,
        instrument: &InstrumentSpec,
    ) -> Option<f64> {
        let point = instrument.point;
        let gap = self.distance.to_price(point);
        // bid for longs, ask for shorts
        let price = quote.exit_price(position.side);

        let (profit_points, candidate) = match position.side {
            Side::Buy => (
                (price - position.open_price) / point,
                instrument.normalize(price - gap),
            ),
            Side::Sell => (
                (position.open_price - price) / point,
                instrument.normalize(price + gap),
            ),
        };

        if profit_points + POINT_EPSILON < self.distance.get() {
            return None;
        }

        match position.stop_loss {
            None => Some(candidate),
            Some(stop) => {
                let improvement = position.side.sign() * (candidate - stop) / point;
                (improvement > POINT_EPSILON && improvement + POINT_EPSILON >= self.step.get())
                    .then_some(candidate)
            }
        }
    }

    /// Trail every open position on `instrument` owned by `magic`.
    ///
    /// Rejected modifications are logged and skipped; the next update will
    /// try again while the condition still holds.
    pub fn apply<V: Venue + ?Sized>(
        &self,
        venue: &mut V,
        instrument: &InstrumentSpec,
        magic: u64,
    ) -> TrailingReport {
        let mut report = TrailingReport::default();

        let positions: Vec<Position> = venue
            .open_positions(&instrument.symbol, magic)
            .into_iter()
            .filter(|p| p.is_owned_by(&instrument.symbol, magic))
            .collect();
        if positions.is_empty() {
            return report;
        }

        let quote = match venue.quote(&instrument.symbol) {
            Ok(q) => q,
            Err(e) => {
                debug!(error = %e, "no quote, trailing skipped");
                return report;
            }
        };

        for position in &positions {
            report.evaluated += 1;
            let Some(new_stop) = self.evaluate(position, &quote, instrument) else {
                continue;
            };

            match venue.modify_position(position.id, Some(new_stop), position.take_profit) {
                Ok(()) => {
                    report.modified += 1;
                    info!(
                        position_id = position.id,
                        side = %position.side,
                        old_stop = ?position.stop_loss,
                        new_stop,
                        "trailing stop advanced"
                    );
                }
                Err(e) => {
                    report.rejected += 1;
                    warn!(position_id = position.id, error = %e, "trailing stop modification failed");
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instrument() -> InstrumentSpec {
        InstrumentSpec::new("EURUSD", 0.0001, 4)
    }

    fn trailing(distance: f64, step: f64) -> TrailingStop {
        TrailingStop::new(Points::new(distance).unwrap(), Points::new(step).unwrap())
    }

    fn position(side: Side, open: f64, stop: Option<f64>) -> Position {
        Position {
            id: 1,
            symbol: "EURUSD".into(),
            side,
            volume: 0.1,
            open_price: open,
            stop_loss: stop,
            take_profit: None,
            magic: 123_456,
        }
    }

    #[test]
    fn test_long_scenario_with_step() {
        let rule = trailing(50.0, 10.0);
        let spec = instrument();

        let pos = position(Side::Buy, 1.1000, None);
        let first = rule.evaluate(&pos, &Quote::new(1.1060, 1.1062), &spec);
        assert_eq!(first, Some(1.1010));

        // Only 5 pts better: held back by the step
        let pos = position(Side::Buy, 1.1000, Some(1.1010));
        assert_eq!(rule.evaluate(&pos, &Quote::new(1.1065, 1.1067), &spec), None);

        // 15 pts better: advances
        assert_eq!(
            rule.evaluate(&pos, &Quote::new(1.1075, 1.1077), &spec),
            Some(1.1025)
        );
    }

    #[test]
    fn test_long_not_activated_before_distance() {
        let rule = trailing(50.0, 10.0);
        let pos = position(Side::Buy, 1.1000, None);
        assert_eq!(
            rule.evaluate(&pos, &Quote::new(1.1040, 1.1042), &instrument()),
            None
        );
    }

    #[test]
    fn test_long_exactly_at_distance_activates() {
        let rule = trailing(50.0, 10.0);
        let pos = position(Side::Buy, 1.1000, None);
        assert_eq!(
            rule.evaluate(&pos, &Quote::new(1.1050, 1.1052), &instrument()),
            Some(1.1000)
        );
    }

    #[test]
    fn test_long_never_moves_back() {
        let rule = trailing(50.0, 0.0);
        let pos = position(Side::Buy, 1.1000, Some(1.1030));
        // Price pulled back; candidate 1.1020 is worse than 1.1030
        assert_eq!(
            rule.evaluate(&pos, &Quote::new(1.1070, 1.1072), &instrument()),
            None
        );
        // Candidate equal to the stop is not a move either
        assert_eq!(
            rule.evaluate(&pos, &Quote::new(1.1080, 1.1082), &instrument()),
            None
        );
    }

    #[test]
    fn test_short_uses_ask_and_mirrors() {
        let rule = trailing(50.0, 10.0);
        let spec = instrument();

        let pos = position(Side::Sell, 1.2000, None);
        // bid would qualify but ask is only 48 pts in profit
        assert_eq!(rule.evaluate(&pos, &Quote::new(1.1940, 1.1952), &spec), None);
        assert_eq!(
            rule.evaluate(&pos, &Quote::new(1.1938, 1.1940), &spec),
            Some(1.1990)
        );

        let pos = position(Side::Sell, 1.2000, Some(1.1990));
        assert_eq!(rule.evaluate(&pos, &Quote::new(1.1933, 1.1935), &spec), None);
        assert_eq!(
            rule.evaluate(&pos, &Quote::new(1.1918, 1.1920), &spec),
            Some(1.1970)
        );
    }

    #[test]
    fn test_initial_stop_is_replaced_once_in_profit() {
        let rule = trailing(50.0, 10.0);
        let pos = position(Side::Buy, 1.1000, Some(1.0900));
        assert_eq!(
            rule.evaluate(&pos, &Quote::new(1.1060, 1.1062), &instrument()),
            Some(1.1010)
        );
    }
}

//! Property tests for classification, the bar gate and trailing stops.

use engulfing_agent::prelude::*;
use proptest::prelude::*;

const POINT: f64 = 0.0001;
const BASE: f64 = 1.0;

/// Bar whose open and close sit on whole points above BASE
fn bar_pts(open_pts: i64, close_pts: i64) -> Bar {
    let open = BASE + open_pts as f64 * POINT;
    let close = BASE + close_pts as f64 * POINT;
    Bar::new(open, open.max(close) + 5.0 * POINT, open.min(close) - 5.0 * POINT, close, 0)
}

fn min_body(v: u32) -> Points {
    Points::new(v as f64).unwrap()
}

prop_compose! {
    /// (bar1, bar2, min_body) forming a bullish engulfing with both bodies >= min_body
    fn bullish_pair()(
        min in 1u32..60,
        start in 100i64..5_000,
        extra2 in 0i64..100,
        below in 1i64..50,
        above in 1i64..50,
    ) -> (Bar, Bar, u32) {
        let body2 = min as i64 + extra2;
        let open2 = start + body2;
        let close2 = start;
        let bar2 = bar_pts(open2, close2);
        let bar1 = bar_pts(close2 - below, open2 + above);
        (bar1, bar2, min)
    }
}

prop_compose! {
    fn bearish_pair()(
        min in 1u32..60,
        start in 100i64..5_000,
        extra2 in 0i64..100,
        below in 1i64..50,
        above in 1i64..50,
    ) -> (Bar, Bar, u32) {
        let body2 = min as i64 + extra2;
        let open2 = start;
        let close2 = start + body2;
        let bar2 = bar_pts(open2, close2);
        let bar1 = bar_pts(close2 + above, open2 - below);
        (bar1, bar2, min)
    }
}

proptest! {
    #[test]
    fn small_body_never_classifies(
        min in 2u32..80,
        open1 in 100i64..5_000,
        open2 in 100i64..5_000,
        small in 0i64..80,
        any in -200i64..200,
        small_is_bar1 in any::<bool>(),
        small_bullish in any::<bool>(),
    ) {
        let small = small % min as i64;
        let small = if small_bullish { small } else { -small };
        let (bar1, bar2) = if small_is_bar1 {
            (bar_pts(open1, open1 + small), bar_pts(open2, open2 + any))
        } else {
            (bar_pts(open1, open1 + any), bar_pts(open2, open2 + small))
        };
        prop_assert_eq!(
            classify(&bar1, &bar2, min_body(min), POINT, true, true),
            PatternResult::None
        );
    }

    #[test]
    fn bullish_shape_classifies_when_enabled((bar1, bar2, min) in bullish_pair()) {
        prop_assert_eq!(
            classify(&bar1, &bar2, min_body(min), POINT, true, true),
            PatternResult::BullishEngulfing
        );
        prop_assert_eq!(
            classify(&bar1, &bar2, min_body(min), POINT, true, false),
            PatternResult::BullishEngulfing
        );
        prop_assert_eq!(
            classify(&bar1, &bar2, min_body(min), POINT, false, true),
            PatternResult::None
        );
    }

    #[test]
    fn bearish_shape_classifies_when_enabled((bar1, bar2, min) in bearish_pair()) {
        prop_assert_eq!(
            classify(&bar1, &bar2, min_body(min), POINT, true, true),
            PatternResult::BearishEngulfing
        );
        prop_assert_eq!(
            classify(&bar1, &bar2, min_body(min), POINT, false, true),
            PatternResult::BearishEngulfing
        );
        prop_assert_eq!(
            classify(&bar1, &bar2, min_body(min), POINT, true, false),
            PatternResult::None
        );
    }

    #[test]
    fn at_most_one_order_per_bar(
        updates in 1usize..60,
        single_trade in any::<bool>(),
    ) {
        let config = AgentConfig {
            instrument: InstrumentSpec::new("EURUSD", POINT, 4),
            single_trade_per_signal: single_trade,
            ..AgentConfig::default()
        };
        let agent = EngulfingAgent::new(config.clone()).unwrap();
        let mut state = AgentState::default();
        let mut venue = PaperVenue::new(config.instrument.clone());
        venue.push_bar(Bar::new(1.1050, 1.1055, 1.1015, 1.1020, 0));
        venue.push_bar(Bar::new(1.1015, 1.1065, 1.1010, 1.1060, 3_600));
        venue.push_bar(Bar::new(1.1060, 1.1062, 1.1058, 1.1061, 7_200));
        venue.set_quote(1.1060, 1.1062);

        for _ in 0..updates {
            agent.on_market_update(&mut state, &mut venue);
        }
        prop_assert_eq!(venue.submitted_orders().len(), 1);
    }

    #[test]
    fn trailing_stop_is_monotonic(
        side_is_buy in any::<bool>(),
        moves in prop::collection::vec(-40i64..40, 1..80),
        distance in 5u32..80,
        step in 0u32..20,
    ) {
        let spec = InstrumentSpec::new("EURUSD", POINT, 4);
        let side = if side_is_buy { Side::Buy } else { Side::Sell };
        let trailing = TrailingStop::new(min_body(distance), min_body(step));

        let mut venue = PaperVenue::new(spec.clone());
        let open_pts = 10_000i64;
        let id = venue.add_position(Position {
            id: 0,
            symbol: "EURUSD".into(),
            side,
            volume: 0.1,
            open_price: BASE + open_pts as f64 * POINT,
            stop_loss: None,
            take_profit: None,
            magic: 1,
        });

        let mut mid = open_pts;
        let mut last_stop: Option<f64> = None;
        for m in moves {
            mid += m;
            let price = BASE + mid as f64 * POINT;
            venue.set_quote(price - POINT, price + POINT);
            trailing.apply(&mut venue, &spec, 1);

            let stop = venue.position(id).unwrap().stop_loss;
            if let (Some(prev), Some(now)) = (last_stop, stop) {
                match side {
                    Side::Buy => prop_assert!(now >= prev - 1e-9),
                    Side::Sell => prop_assert!(now <= prev + 1e-9),
                }
            }
            if last_stop.is_some() {
                prop_assert!(stop.is_some());
            }
            last_stop = stop;
        }
    }
}

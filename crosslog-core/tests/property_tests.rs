//! Property tests for strategy invariants.
//!
//! Uses proptest to verify:
//! 1. At most one outstanding order for any signal/notification sequence
//! 2. Limit prices sit exactly `p` percent below (buy) / above (sell) the close
//! 3. Expiry is `date + N` days, or absent for N = 0
//! 4. A short position plus a bullish signal always closes

use chrono::{NaiveDate, NaiveDateTime};
use crosslog_core::domain::{
    Bar, ExecType, OrderId, OrderNotification, OrderRequest, OrderSide, OrderStatus, Position,
};
use crosslog_core::log::NullLog;
use crosslog_core::strategy::{
    decide, expiry, limit_price, BarContext, CrossoverStrategy, Decision, OrderRouter,
    Strategy as _, StrategyConfig, StrategyState,
};
use proptest::prelude::*;

struct CountingRouter {
    next: u64,
}

impl OrderRouter for CountingRouter {
    fn submit(&mut self, _request: OrderRequest, _created: NaiveDateTime) -> OrderId {
        self.next += 1;
        OrderId(self.next)
    }
}

fn bar(close: f64) -> Bar {
    Bar {
        datetime: NaiveDate::from_ymd_opt(2019, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        open: close,
        high: close,
        low: close,
        close,
        volume: 0.0,
        open_interest: 0.0,
        pe: f64::NAN,
    }
}

/// One step of a randomized driver: either a bar with a signal, or a broker
/// notification for the currently pending order.
#[derive(Debug, Clone)]
enum Step {
    Bar { signal: f64, position: i64 },
    Notify(OrderStatus),
}

fn arb_status() -> impl Strategy<Value = OrderStatus> {
    prop_oneof![
        Just(OrderStatus::Submitted),
        Just(OrderStatus::Accepted),
        Just(OrderStatus::Completed),
        Just(OrderStatus::Expired),
        Just(OrderStatus::Canceled),
        Just(OrderStatus::Margin),
    ]
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (prop_oneof![Just(-1.0), Just(0.0), Just(1.0), -3.0..3.0_f64], -2i64..=2)
            .prop_map(|(signal, position)| Step::Bar { signal, position }),
        arb_status().prop_map(Step::Notify),
    ]
}

fn arb_price() -> impl Strategy<Value = f64> {
    (1.0..10_000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

proptest! {
    /// No order is routed while another is outstanding.
    #[test]
    fn at_most_one_outstanding_order(
        steps in proptest::collection::vec(arb_step(), 1..80),
        only_long in any::<bool>(),
    ) {
        let mut strat = CrossoverStrategy::new(StrategyConfig { only_long, ..Default::default() });
        let mut router = CountingRouter { next: 0 };
        let b = bar(100.0);

        for step in steps {
            match step {
                Step::Bar { signal, position } => {
                    let was_pending = strat.state().pending();
                    let before = router.next;
                    let ctx = BarContext { bar: &b, signal, position: Position::new(position, 100.0) };
                    strat.on_bar(&ctx, &mut router, &mut NullLog);
                    if was_pending.is_some() {
                        prop_assert_eq!(router.next, before);
                        prop_assert_eq!(strat.state().pending(), was_pending);
                    }
                    prop_assert!(router.next - before <= 1);
                }
                Step::Notify(status) => {
                    if let Some(id) = strat.state().pending() {
                        let n = OrderNotification {
                            order_id: id,
                            side: OrderSide::Buy,
                            status,
                            datetime: b.datetime,
                            executed: None,
                        };
                        strat.on_order(&n, &mut NullLog);
                        prop_assert_eq!(strat.state().is_idle(), status.is_terminal());
                    }
                }
            }
        }
    }

    #[test]
    fn limit_prices_are_offset_by_percent(close in arb_price(), p in 0.0..50.0_f64) {
        let buy = limit_price(OrderSide::Buy, close, p);
        let sell = limit_price(OrderSide::Sell, close, p);
        prop_assert!((buy - close * (1.0 - p / 100.0)).abs() < 1e-9);
        prop_assert!((sell - close * (1.0 + p / 100.0)).abs() < 1e-9);
        prop_assert!(buy <= close && sell >= close);
    }

    #[test]
    fn expiry_is_date_plus_days(offset in 0i64..3000, days in 0u32..400) {
        let date = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap() + chrono::Duration::days(offset);
        let exp = expiry(date, days);
        if days == 0 {
            prop_assert_eq!(exp, None);
        } else {
            prop_assert_eq!(exp, Some(date + chrono::Duration::days(i64::from(days))));
        }
    }

    #[test]
    fn short_and_bullish_always_closes(
        signal in 0.001..10.0_f64,
        size in 1i64..50,
        limit in any::<bool>(),
    ) {
        let cfg = StrategyConfig {
            exec_type: if limit { ExecType::Limit } else { ExecType::Market },
            ..Default::default()
        };
        let b = bar(50.0);
        let ctx = BarContext { bar: &b, signal, position: Position::new(-size, 55.0) };
        let d = decide(&cfg, &StrategyState::Idle, &ctx);
        prop_assert_eq!(d, Decision::Close(OrderRequest::market(OrderSide::Buy, size as u32)));
    }
}

//! Crossover strategy: buys/sells on the close crossing its moving average.
//!
//! Wraps the pure `decide` rule with order routing, pending-order tracking
//! and log output. Can be restricted to long-only via `only_long`.

use super::config::StrategyConfig;
use super::decision::{decide, BarContext, Decision};
use super::state::StrategyState;
use super::{OrderRouter, Strategy};
use crate::domain::{ExecType, OrderNotification, OrderRequest, OrderStatus, TradeNotification};
use crate::log::{iso_timestamp, log_float, LogLine, StrategyLog};
use chrono::NaiveDateTime;

#[derive(Debug, Clone)]
pub struct CrossoverStrategy {
    config: StrategyConfig,
    state: StrategyState,
}

impl CrossoverStrategy {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            config,
            state: StrategyState::Idle,
        }
    }

    pub fn state(&self) -> StrategyState {
        self.state
    }

    fn log(&self, log: &mut dyn StrategyLog, datetime: NaiveDateTime, message: String) {
        if self.config.printout {
            log.log(LogLine::new(datetime, message));
        }
    }

    fn creation_message(&self, request: &OrderRequest, close: f64) -> String {
        let side = request.side.label();
        match (request.exec_type, request.limit_price) {
            (ExecType::Limit, Some(price)) => match request.valid_until {
                Some(valid) => format!(
                    "{side} CREATE, exectype Limit, price {price:.2}, valid: {}",
                    valid.format("%Y-%m-%d")
                ),
                None => format!("{side} CREATE, exectype Limit, price {price:.2}"),
            },
            _ => format!(
                "{side} CREATE, exectype Market, on {} price, vol = {}",
                log_float(close),
                request.size
            ),
        }
    }
}

impl Strategy for CrossoverStrategy {
    fn name(&self) -> &str {
        "crossover"
    }

    fn on_bar(
        &mut self,
        ctx: &BarContext<'_>,
        router: &mut dyn OrderRouter,
        log: &mut dyn StrategyLog,
    ) -> Decision {
        let bar = ctx.bar;
        self.log(
            log,
            bar.datetime,
            format!(
                "Tick... Close: {}, pe: {},  date: {}",
                log_float(bar.close),
                log_float(bar.pe),
                iso_timestamp(&bar.datetime)
            ),
        );

        let decision = decide(&self.config, &self.state, ctx);

        let message = match &decision {
            Decision::Hold(_) => None,
            Decision::Close(_) => {
                let which = if ctx.position.is_short() { "SHORT" } else { "LONG" };
                Some(format!(
                    "CLOSING {which} POSITION ({}) at {} price",
                    ctx.position,
                    log_float(bar.close)
                ))
            }
            Decision::Open(request) => Some(self.creation_message(request, bar.close)),
        };
        if let Some(message) = message {
            self.log(log, bar.datetime, message);
        }

        if let Some(request) = decision.request() {
            let order_id = router.submit(request.clone(), bar.datetime);
            self.state = self.state.submitted(order_id);
        }

        decision
    }

    fn on_order(&mut self, notification: &OrderNotification, log: &mut dyn StrategyLog) {
        match notification.status {
            OrderStatus::Submitted | OrderStatus::Accepted => {
                self.log(
                    log,
                    notification.datetime,
                    format!(".. Order {}, waiting...", notification.status),
                );
                return;
            }
            OrderStatus::Completed => {
                let (datetime, price) = notification
                    .executed
                    .as_ref()
                    .map(|e| (e.datetime, e.price))
                    .unwrap_or((notification.datetime, f64::NAN));
                let side = notification.side.label();
                self.log(log, datetime, format!("{side} COMPLETED, {price:.2}"));
            }
            OrderStatus::Expired | OrderStatus::Canceled | OrderStatus::Margin => {
                self.log(
                    log,
                    notification.datetime,
                    format!(".. Order is {} ,", notification.status),
                );
            }
        }

        self.state = self.state.on_status(notification.order_id, notification.status);
    }

    fn on_trade(&mut self, notification: &TradeNotification, log: &mut dyn StrategyLog) {
        let message = match notification {
            TradeNotification::Closed { pnl, pnl_comm, .. } => {
                format!("TRADE PROFIT, GROSS {pnl:.2}, NET {pnl_comm:.2}")
            }
            TradeNotification::Opened { size, .. } => format!("TRADE OPENED, SIZE {size:2}"),
        };
        self.log(log, notification.datetime(), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, Execution, OrderId, OrderSide, Position};
    use crate::log::LogLine;
    use chrono::NaiveDate;

    #[derive(Default)]
    struct RecordingRouter {
        submitted: Vec<OrderRequest>,
    }

    impl OrderRouter for RecordingRouter {
        fn submit(&mut self, request: OrderRequest, _created: NaiveDateTime) -> OrderId {
            self.submitted.push(request);
            OrderId(self.submitted.len() as u64)
        }
    }

    fn dt() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 5, 3)
            .unwrap()
            .and_hms_opt(11, 0, 0)
            .unwrap()
    }

    fn bar(close: f64) -> Bar {
        Bar {
            datetime: dt(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
            open_interest: 0.0,
            pe: 9.5,
        }
    }

    fn verbose() -> StrategyConfig {
        StrategyConfig {
            printout: true,
            ..Default::default()
        }
    }

    fn notification(id: u64, status: OrderStatus) -> OrderNotification {
        OrderNotification {
            order_id: OrderId(id),
            side: OrderSide::Buy,
            status,
            datetime: dt(),
            executed: None,
        }
    }

    #[test]
    fn market_entry_logs_tick_and_creation() {
        let mut strat = CrossoverStrategy::new(verbose());
        let mut router = RecordingRouter::default();
        let mut log: Vec<LogLine> = Vec::new();
        let b = bar(101.5);
        let ctx = BarContext {
            bar: &b,
            signal: 1.0,
            position: Position::flat(),
        };

        strat.on_bar(&ctx, &mut router, &mut log);

        assert_eq!(router.submitted.len(), 1);
        assert_eq!(log.len(), 2);
        assert_eq!(
            log[0].message,
            "Tick... Close: 101.5, pe: 9.5,  date: 2018-05-03T11:00:00"
        );
        assert_eq!(
            log[1].message,
            "BUY CREATE, exectype Market, on 101.5 price, vol = 1"
        );
        assert_eq!(strat.state().pending(), Some(OrderId(1)));
    }

    #[test]
    fn limit_entry_message_includes_validity() {
        let mut strat = CrossoverStrategy::new(StrategyConfig {
            exec_type: ExecType::Limit,
            percent_offset: 2.0,
            valid_days: 5,
            ..verbose()
        });
        let mut router = RecordingRouter::default();
        let mut log: Vec<LogLine> = Vec::new();
        let b = bar(100.0);
        let ctx = BarContext {
            bar: &b,
            signal: 1.0,
            position: Position::flat(),
        };
        strat.on_bar(&ctx, &mut router, &mut log);
        assert_eq!(
            log[1].message,
            "BUY CREATE, exectype Limit, price 98.00, valid: 2018-05-08"
        );
    }

    #[test]
    fn close_logs_position() {
        let mut strat = CrossoverStrategy::new(verbose());
        let mut router = RecordingRouter::default();
        let mut log: Vec<LogLine> = Vec::new();
        let b = bar(100.0);
        let ctx = BarContext {
            bar: &b,
            signal: -1.0,
            position: Position::new(1, 95.0),
        };
        let decision = strat.on_bar(&ctx, &mut router, &mut log);
        assert!(matches!(decision, Decision::Close(_)));
        assert_eq!(
            log[1].message,
            "CLOSING LONG POSITION (size: 1, price: 95.00) at 100.0 price"
        );
    }

    #[test]
    fn silent_when_printout_disabled() {
        let mut strat = CrossoverStrategy::new(StrategyConfig::default());
        let mut router = RecordingRouter::default();
        let mut log: Vec<LogLine> = Vec::new();
        let b = bar(100.0);
        let ctx = BarContext {
            bar: &b,
            signal: 1.0,
            position: Position::flat(),
        };
        strat.on_bar(&ctx, &mut router, &mut log);
        strat.on_order(&notification(1, OrderStatus::Accepted), &mut log);
        assert!(log.is_empty());
        assert_eq!(router.submitted.len(), 1);
    }

    #[test]
    fn accepted_keeps_pending_and_completed_clears() {
        let mut strat = CrossoverStrategy::new(verbose());
        let mut router = RecordingRouter::default();
        let mut log: Vec<LogLine> = Vec::new();
        let b = bar(100.0);
        let ctx = BarContext {
            bar: &b,
            signal: 1.0,
            position: Position::flat(),
        };
        strat.on_bar(&ctx, &mut router, &mut log);

        strat.on_order(&notification(1, OrderStatus::Submitted), &mut log);
        strat.on_order(&notification(1, OrderStatus::Accepted), &mut log);
        assert_eq!(strat.state().pending(), Some(OrderId(1)));

        let mut done = notification(1, OrderStatus::Completed);
        done.executed = Some(Execution {
            datetime: dt(),
            price: 100.25,
            size: 1,
            commission: 2.0,
        });
        strat.on_order(&done, &mut log);
        assert!(strat.state().is_idle());

        let messages: Vec<&str> = log.iter().map(|l| l.message.as_str()).collect();
        assert!(messages.contains(&".. Order Submitted, waiting..."));
        assert!(messages.contains(&".. Order Accepted, waiting..."));
        assert_eq!(*messages.last().unwrap(), "BUY COMPLETED, 100.25");
    }

    #[test]
    fn trade_notifications_are_logged() {
        let mut strat = CrossoverStrategy::new(verbose());
        let mut log: Vec<LogLine> = Vec::new();
        strat.on_trade(
            &TradeNotification::Opened {
                datetime: dt(),
                size: 1,
                price: 100.0,
            },
            &mut log,
        );
        strat.on_trade(
            &TradeNotification::Closed {
                datetime: dt(),
                pnl: 25.0,
                pnl_comm: 21.0,
            },
            &mut log,
        );
        assert_eq!(log[0].message, "TRADE OPENED, SIZE  1");
        assert_eq!(log[1].message, "TRADE PROFIT, GROSS 25.00, NET 21.00");
    }
}

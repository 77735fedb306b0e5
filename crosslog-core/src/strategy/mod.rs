//! Signal-driven position management.
//!
//! A strategy has three entry points, all called by an external driver loop
//! that serializes them:
//! - `on_bar` once per bar, after pending notifications were delivered
//! - `on_order` for every broker order status change
//! - `on_trade` when a position opens or returns to flat
//!
//! Orders leave the strategy through the `OrderRouter` seam; the strategy
//! never touches position state directly.

pub mod config;
pub mod crossover;
pub mod decision;
pub mod state;

pub use config::{ConfigError, StrategyConfig, MAX_VALID_DAYS};
pub use crossover::CrossoverStrategy;
pub use decision::{decide, entry_request, expiry, limit_price, BarContext, Decision, HoldReason};
pub use state::StrategyState;

use crate::domain::{OrderId, OrderNotification, OrderRequest, TradeNotification};
use crate::log::StrategyLog;
use chrono::NaiveDateTime;

/// Where order requests go. Implemented by brokers.
pub trait OrderRouter {
    /// Accept `request`, created at `created`, and return its id.
    fn submit(&mut self, request: OrderRequest, created: NaiveDateTime) -> OrderId;
}

/// Callback surface driven by the bar loop.
pub trait Strategy {
    fn name(&self) -> &str;

    fn on_bar(
        &mut self,
        ctx: &BarContext<'_>,
        router: &mut dyn OrderRouter,
        log: &mut dyn StrategyLog,
    ) -> Decision;

    fn on_order(&mut self, notification: &OrderNotification, log: &mut dyn StrategyLog);

    fn on_trade(&mut self, notification: &TradeNotification, log: &mut dyn StrategyLog);
}

//! Pending-order state of the strategy.

use crate::domain::{OrderId, OrderStatus};

/// Whether the strategy is waiting on an order.
///
/// Invariant: at most one outstanding order. New orders are only issued from
/// `Idle`; `AwaitingOrder` returns to `Idle` only on a terminal status for
/// the same order id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyState {
    #[default]
    Idle,
    AwaitingOrder(OrderId),
}

impl StrategyState {
    pub fn is_idle(&self) -> bool {
        matches!(self, StrategyState::Idle)
    }

    pub fn pending(&self) -> Option<OrderId> {
        match self {
            StrategyState::Idle => None,
            StrategyState::AwaitingOrder(id) => Some(*id),
        }
    }

    /// State after an order was handed to the broker.
    pub fn submitted(self, order_id: OrderId) -> Self {
        debug_assert!(self.is_idle(), "order submitted while another is pending");
        StrategyState::AwaitingOrder(order_id)
    }

    /// State after a status notification for `order_id`.
    pub fn on_status(self, order_id: OrderId, status: OrderStatus) -> Self {
        match self {
            StrategyState::AwaitingOrder(pending) if pending == order_id && status.is_terminal() => {
                StrategyState::Idle
            }
            other => other,
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broker-assigned order identifier.
///
/// Opaque to the strategy: it only stores the id of its outstanding order
/// and compares it against incoming notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequential id generator for orders.
#[derive(Debug, Clone, Default)]
pub struct IdGen {
    next_order: u64,
}

impl IdGen {
    pub fn new() -> Self {
        Self { next_order: 1 }
    }

    pub fn next_order_id(&mut self) -> OrderId {
        if self.next_order == 0 {
            self.next_order = 1;
        }
        let id = OrderId(self.next_order);
        self.next_order += 1;
        id
    }
}

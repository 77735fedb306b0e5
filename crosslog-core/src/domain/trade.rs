//! Trades: round trips from flat to flat, and the notifications the broker
//! sends while they open and close.

use super::position::PositionDirection;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Portfolio-level trade event delivered to the strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TradeNotification {
    /// A position was opened from flat.
    Opened {
        datetime: NaiveDateTime,
        size: i64,
        price: f64,
    },
    /// A position returned to flat.
    Closed {
        datetime: NaiveDateTime,
        /// Gross PnL.
        pnl: f64,
        /// PnL net of entry and exit commission.
        pnl_comm: f64,
    },
}

impl TradeNotification {
    pub fn datetime(&self) -> NaiveDateTime {
        match self {
            TradeNotification::Opened { datetime, .. } | TradeNotification::Closed { datetime, .. } => {
                *datetime
            }
        }
    }
}

/// A complete round-trip trade record: entry → exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub direction: PositionDirection,
    pub entry_datetime: NaiveDateTime,
    pub entry_price: f64,
    pub exit_datetime: NaiveDateTime,
    pub exit_price: f64,
    /// Contracts traded.
    pub size: u32,
    pub gross_pnl: f64,
    pub commission: f64,
    pub net_pnl: f64,
    pub bars_held: usize,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }
}

//! Order requests, execution types, and broker order notifications.

use super::ids::OrderId;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// +1 for buys, -1 for sells.
    pub fn sign(self) -> i64 {
        match self {
            OrderSide::Buy => 1,
            OrderSide::Sell => -1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

/// How an order is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExecType {
    /// Fill at the next available price, unpriced.
    #[default]
    Market,
    /// Fill at the limit price or better, optionally until an expiry date.
    Limit,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported execution type '{0}' (expected Market or Limit)")]
pub struct ParseExecTypeError(pub String);

impl FromStr for ExecType {
    type Err = ParseExecTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "market" => Ok(ExecType::Market),
            "limit" => Ok(ExecType::Limit),
            _ => Err(ParseExecTypeError(s.to_string())),
        }
    }
}

impl fmt::Display for ExecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecType::Market => write!(f, "Market"),
            ExecType::Limit => write!(f, "Limit"),
        }
    }
}

/// An order the strategy asks the broker to place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub side: OrderSide,
    pub exec_type: ExecType,
    /// Number of contracts, always positive.
    pub size: u32,
    /// Set for limit orders only.
    pub limit_price: Option<f64>,
    /// Last calendar date on which the order may fill. `None` = good till canceled.
    pub valid_until: Option<NaiveDate>,
}

impl OrderRequest {
    pub fn market(side: OrderSide, size: u32) -> Self {
        Self {
            side,
            exec_type: ExecType::Market,
            size,
            limit_price: None,
            valid_until: None,
        }
    }

    pub fn limit(side: OrderSide, size: u32, limit_price: f64, valid_until: Option<NaiveDate>) -> Self {
        Self {
            side,
            exec_type: ExecType::Limit,
            size,
            limit_price: Some(limit_price),
            valid_until,
        }
    }
}

/// Order lifecycle states as reported by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Submitted,
    Accepted,
    Completed,
    Expired,
    Canceled,
    /// Rejected for insufficient margin/cash.
    Margin,
}

impl OrderStatus {
    /// Terminal statuses end the order's life; no further notifications follow.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Expired | OrderStatus::Canceled | OrderStatus::Margin
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStatus::Submitted => "Submitted",
            OrderStatus::Accepted => "Accepted",
            OrderStatus::Completed => "Completed",
            OrderStatus::Expired => "Expired",
            OrderStatus::Canceled => "Canceled",
            OrderStatus::Margin => "Margin",
        };
        f.write_str(name)
    }
}

/// Execution details attached to a completed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub datetime: NaiveDateTime,
    pub price: f64,
    pub size: u32,
    pub commission: f64,
}

/// A status change reported by the broker for one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderNotification {
    pub order_id: OrderId,
    pub side: OrderSide,
    pub status: OrderStatus,
    /// When the broker produced this notification.
    pub datetime: NaiveDateTime,
    /// Present when `status == Completed`.
    pub executed: Option<Execution>,
}

//! Paper broker for a single futures-style instrument.
//!
//! Orders are matched bar by bar against OHLC prices. Every fill pays a flat
//! commission per contract; opening exposure reserves a fixed margin per
//! contract and closing releases it together with the realized PnL
//! (`price move × contracts × multiplier`).
//!
//! Status changes and trade events are queued and drained by the driver, so
//! the strategy sees them in the order they happened.

use std::fmt;

use chrono::NaiveDateTime;
use crosslog_core::domain::{
    Bar, ExecType, Execution, IdGen, OrderId, OrderNotification, OrderRequest, OrderSide,
    OrderStatus, Position, PositionDirection, TradeNotification, TradeRecord,
};
use crosslog_core::strategy::OrderRouter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BrokerConfigError {
    #[error("starting cash must be positive and finite, got {0}")]
    Cash(f64),
    #[error("{name} must be non-negative and finite, got {value}")]
    Negative { name: &'static str, value: f64 },
    #[error("contract multiplier must be positive and finite, got {0}")]
    Multiplier(f64),
}

/// Cash and contract terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Starting cash.
    pub cash: f64,
    /// Commission per contract per fill.
    pub commission: f64,
    /// Contract multiplier applied to price moves.
    pub mult: f64,
    /// Margin reserved per open contract.
    pub margin: f64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            cash: 100_000.0,
            commission: 2.0,
            mult: 10.0,
            margin: 2000.0,
        }
    }
}

impl BrokerConfig {
    pub fn validated(self) -> Result<Self, BrokerConfigError> {
        if !(self.cash.is_finite() && self.cash > 0.0) {
            return Err(BrokerConfigError::Cash(self.cash));
        }
        for (name, value) in [("commission", self.commission), ("margin", self.margin)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(BrokerConfigError::Negative { name, value });
            }
        }
        if !(self.mult.is_finite() && self.mult > 0.0) {
            return Err(BrokerConfigError::Multiplier(self.mult));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone)]
struct WorkingOrder {
    id: OrderId,
    request: OrderRequest,
}

/// The round trip currently open, accumulated across fills.
#[derive(Debug, Clone)]
struct OpenTrade {
    direction: PositionDirection,
    entry_datetime: NaiveDateTime,
    entry_price: f64,
    entry_bar: usize,
    max_contracts: u32,
    gross_pnl: f64,
    commission: f64,
}

#[derive(Debug, Clone)]
pub struct PaperBroker {
    config: BrokerConfig,
    cash: f64,
    reserved: f64,
    position: Position,
    ids: IdGen,
    working: Vec<WorkingOrder>,
    order_events: Vec<OrderNotification>,
    trade_events: Vec<TradeNotification>,
    open_trade: Option<OpenTrade>,
    trades: Vec<TradeRecord>,
    bars_seen: usize,
    orders_submitted: usize,
}

impl PaperBroker {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            cash: config.cash,
            config,
            reserved: 0.0,
            position: Position::flat(),
            ids: IdGen::new(),
            working: Vec::new(),
            order_events: Vec::new(),
            trade_events: Vec::new(),
            open_trade: None,
            trades: Vec::new(),
            bars_seen: 0,
            orders_submitted: 0,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Free cash, excluding reserved margin.
    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Cash plus reserved margin plus unrealized PnL at `price`.
    pub fn value(&self, price: f64) -> f64 {
        let unrealized = if self.position.is_flat() {
            0.0
        } else {
            self.position.unrealized_pnl(price, self.config.mult)
        };
        self.cash + self.reserved + unrealized
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn orders_submitted(&self) -> usize {
        self.orders_submitted
    }

    pub fn has_working_orders(&self) -> bool {
        !self.working.is_empty()
    }

    /// Drain queued order status changes, oldest first.
    pub fn take_order_notifications(&mut self) -> Vec<OrderNotification> {
        std::mem::take(&mut self.order_events)
    }

    /// Drain queued trade events, oldest first.
    pub fn take_trade_notifications(&mut self) -> Vec<TradeNotification> {
        std::mem::take(&mut self.trade_events)
    }

    /// Match working orders against `bar`, in submission order.
    pub fn process_bar(&mut self, bar: &Bar) {
        self.bars_seen += 1;
        let working = std::mem::take(&mut self.working);

        for order in working {
            if order.request.valid_until.is_some_and(|until| bar.date() > until) {
                self.notify(&order, OrderStatus::Expired, bar.datetime, None);
                continue;
            }
            if bar.is_void() {
                self.working.push(order);
                continue;
            }
            match fill_price(&order.request, bar) {
                Some(price) => self.execute(&order, price, bar.datetime),
                None => self.working.push(order),
            }
        }
    }

    /// Cancel everything still working.
    pub fn cancel_all(&mut self, datetime: NaiveDateTime) {
        for order in std::mem::take(&mut self.working) {
            self.notify(&order, OrderStatus::Canceled, datetime, None);
        }
    }

    fn notify(
        &mut self,
        order: &WorkingOrder,
        status: OrderStatus,
        datetime: NaiveDateTime,
        executed: Option<Execution>,
    ) {
        self.order_events.push(OrderNotification {
            order_id: order.id,
            side: order.request.side,
            status,
            datetime,
            executed,
        });
    }

    fn execute(&mut self, order: &WorkingOrder, price: f64, datetime: NaiveDateTime) {
        let side = order.request.side;
        let size = i64::from(order.request.size);
        let current = self.position.size;

        let closing = if current != 0 && current.signum() != side.sign() {
            current.abs().min(size)
        } else {
            0
        };
        let opening = size - closing;

        let per_contract = self.config.commission;
        let close_comm = per_contract * closing as f64;
        let open_comm = per_contract * opening as f64;
        let close_pnl = (price - self.position.price) * (current.signum() * closing) as f64 * self.config.mult;

        if opening > 0 {
            let available = self.cash + self.config.margin * closing as f64 + close_pnl - close_comm;
            let required = self.config.margin * opening as f64 + open_comm;
            if required > available {
                self.notify(order, OrderStatus::Margin, datetime, None);
                return;
            }
        }

        if closing > 0 {
            self.close_contracts(closing, price, close_pnl, close_comm, datetime);
        }
        if opening > 0 {
            self.open_contracts(side, opening, price, open_comm, datetime);
        }

        let executed = Execution {
            datetime,
            price,
            size: order.request.size,
            commission: close_comm + open_comm,
        };
        self.notify(order, OrderStatus::Completed, datetime, Some(executed));
    }

    fn close_contracts(
        &mut self,
        contracts: i64,
        price: f64,
        pnl: f64,
        commission: f64,
        datetime: NaiveDateTime,
    ) {
        let released = self.config.margin * contracts as f64;
        self.cash += released + pnl - commission;
        self.reserved -= released;
        self.position.size -= self.position.size.signum() * contracts;

        if let Some(trade) = self.open_trade.as_mut() {
            trade.gross_pnl += pnl;
            trade.commission += commission;
        }

        if self.position.is_flat() {
            self.position = Position::flat();
            if let Some(trade) = self.open_trade.take() {
                let net = trade.gross_pnl - trade.commission;
                self.trade_events.push(TradeNotification::Closed {
                    datetime,
                    pnl: trade.gross_pnl,
                    pnl_comm: net,
                });
                self.trades.push(TradeRecord {
                    direction: trade.direction,
                    entry_datetime: trade.entry_datetime,
                    entry_price: trade.entry_price,
                    exit_datetime: datetime,
                    exit_price: price,
                    size: trade.max_contracts,
                    gross_pnl: trade.gross_pnl,
                    commission: trade.commission,
                    net_pnl: net,
                    bars_held: self.bars_seen.saturating_sub(trade.entry_bar),
                });
            }
        }
    }

    fn open_contracts(
        &mut self,
        side: OrderSide,
        contracts: i64,
        price: f64,
        commission: f64,
        datetime: NaiveDateTime,
    ) {
        let reserve = self.config.margin * contracts as f64;
        self.cash -= reserve + commission;
        self.reserved += reserve;

        let held = self.position.size.abs();
        let total = held + contracts;
        let avg = (self.position.price * held as f64 + price * contracts as f64) / total as f64;
        self.position = Position::new(side.sign() * total, avg);
        let total_contracts = u32::try_from(total).unwrap_or(u32::MAX);

        match self.open_trade.as_mut() {
            Some(trade) => {
                trade.commission += commission;
                trade.max_contracts = trade.max_contracts.max(total_contracts);
            }
            None => {
                self.open_trade = Some(OpenTrade {
                    direction: self.position.direction(),
                    entry_datetime: datetime,
                    entry_price: price,
                    entry_bar: self.bars_seen,
                    max_contracts: total_contracts,
                    gross_pnl: 0.0,
                    commission,
                });
                self.trade_events.push(TradeNotification::Opened {
                    datetime,
                    size: self.position.size,
                    price,
                });
            }
        }
    }
}

/// Price at which `request` would fill on `bar`, if at all.
fn fill_price(request: &OrderRequest, bar: &Bar) -> Option<f64> {
    match (request.exec_type, request.limit_price) {
        (ExecType::Limit, Some(limit)) => match request.side {
            OrderSide::Buy if bar.open <= limit => Some(bar.open),
            OrderSide::Buy if bar.low <= limit => Some(limit),
            OrderSide::Sell if bar.open >= limit => Some(bar.open),
            OrderSide::Sell if bar.high >= limit => Some(limit),
            _ => None,
        },
        _ => Some(bar.open),
    }
}

impl OrderRouter for PaperBroker {
    fn submit(&mut self, request: OrderRequest, created: NaiveDateTime) -> OrderId {
        let order = WorkingOrder {
            id: self.ids.next_order_id(),
            request,
        };
        self.orders_submitted += 1;
        self.notify(&order, OrderStatus::Submitted, created, None);
        self.notify(&order, OrderStatus::Accepted, created, None);
        let id = order.id;
        self.working.push(order);
        id
    }
}

impl fmt::Display for PaperBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PaperBroker cash={:.2} commission={:.2}/contract mult={} margin={:.2}",
            self.cash, self.config.commission, self.config.mult, self.config.margin
        )
    }
}

//! Per-bar decision rule: signal + position + pending state → what to do.
//!
//! `decide` is pure. It never submits anything itself; the caller routes the
//! returned request and records the resulting order id in `StrategyState`.

use super::config::StrategyConfig;
use super::state::StrategyState;
use crate::domain::{Bar, ExecType, OrderRequest, OrderSide, Position, PositionDirection};
use chrono::{Days, NaiveDate};

/// Inputs for one bar.
#[derive(Debug, Clone, Copy)]
pub struct BarContext<'a> {
    pub bar: &'a Bar,
    /// Crossover value for this bar: >0 bullish, <0 bearish, 0 or NaN nothing.
    pub signal: f64,
    pub position: Position,
}

/// Why no order was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    /// An order is outstanding.
    PendingOrder,
    /// No crossover on this bar.
    NoSignal,
    /// Bearish signal while flat, shorts disabled.
    LongOnly,
    /// Signal agrees with the open position.
    AlreadyPositioned,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Hold(HoldReason),
    /// Flatten the current position with a market order.
    Close(OrderRequest),
    /// Open a new position from flat.
    Open(OrderRequest),
}

impl Decision {
    /// The order to route, if any.
    pub fn request(&self) -> Option<&OrderRequest> {
        match self {
            Decision::Hold(_) => None,
            Decision::Close(req) | Decision::Open(req) => Some(req),
        }
    }
}

/// Limit price `percent_offset` percent away from `close`: below for buys,
/// above for sells.
pub fn limit_price(side: OrderSide, close: f64, percent_offset: f64) -> f64 {
    match side {
        OrderSide::Buy => close * (1.0 - percent_offset / 100.0),
        OrderSide::Sell => close * (1.0 + percent_offset / 100.0),
    }
}

/// Expiry date for a limit order placed on `date`. `None` when `valid_days == 0`.
///
/// `valid_days` is bounded by `MAX_VALID_DAYS` in validated configs, so the
/// addition only overflows for unvalidated input.
pub fn expiry(date: NaiveDate, valid_days: u32) -> Option<NaiveDate> {
    if valid_days == 0 {
        return None;
    }
    date.checked_add_days(Days::new(u64::from(valid_days)))
}

/// Entry order for `side` built from the configured execution type.
pub fn entry_request(config: &StrategyConfig, side: OrderSide, bar: &Bar) -> OrderRequest {
    match config.exec_type {
        ExecType::Market => OrderRequest::market(side, config.stake),
        ExecType::Limit => OrderRequest::limit(
            side,
            config.stake,
            limit_price(side, bar.close, config.percent_offset),
            expiry(bar.date(), config.valid_days),
        ),
    }
}

/// Decide what to do on this bar.
pub fn decide(config: &StrategyConfig, state: &StrategyState, ctx: &BarContext<'_>) -> Decision {
    if !state.is_idle() {
        return Decision::Hold(HoldReason::PendingOrder);
    }

    let signal = ctx.signal;
    if signal.is_nan() || signal == 0.0 {
        return Decision::Hold(HoldReason::NoSignal);
    }

    let direction = ctx.position.direction();

    if signal > 0.0 {
        match direction {
            PositionDirection::Short => Decision::Close(close_request(&ctx.position)),
            PositionDirection::Flat => Decision::Open(entry_request(config, OrderSide::Buy, ctx.bar)),
            PositionDirection::Long => Decision::Hold(HoldReason::AlreadyPositioned),
        }
    } else {
        match direction {
            PositionDirection::Long => Decision::Close(close_request(&ctx.position)),
            PositionDirection::Flat if config.only_long => Decision::Hold(HoldReason::LongOnly),
            PositionDirection::Flat => Decision::Open(entry_request(config, OrderSide::Sell, ctx.bar)),
            PositionDirection::Short => Decision::Hold(HoldReason::AlreadyPositioned),
        }
    }
}

fn close_request(position: &Position) -> OrderRequest {
    let side = if position.is_long() {
        OrderSide::Sell
    } else {
        OrderSide::Buy
    };
    OrderRequest::market(side, position.contracts())
}

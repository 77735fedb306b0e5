//! crosslog core: domain types, indicators, and the signal-driven position manager.
//!
//! This crate contains the decision logic of the crossover strategy:
//! - Domain types (bars, order requests and notifications, positions, trades)
//! - SMA and close-vs-SMA crossover indicators
//! - The strategy state machine with its three entry points
//!   (`on_bar`, `on_order`, `on_trade`) and the `OrderRouter` seam
//! - The strategy log line format and sink trait

pub mod domain;
pub mod indicators;
pub mod log;
pub mod strategy;

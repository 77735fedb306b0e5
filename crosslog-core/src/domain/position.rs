use serde::{Deserialize, Serialize};
use std::fmt;

/// Which way a position leans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionDirection {
    Long,
    Short,
    Flat,
}

/// Net holding in the traded instrument.
///
/// `size` is signed: positive = long, negative = short, zero = flat.
/// Owned and mutated by the broker; strategies receive copies.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub size: i64,
    /// Average entry price of the open contracts (0.0 when flat).
    pub price: f64,
}

impl Position {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn new(size: i64, price: f64) -> Self {
        Self { size, price }
    }

    pub fn direction(&self) -> PositionDirection {
        match self.size {
            s if s > 0 => PositionDirection::Long,
            s if s < 0 => PositionDirection::Short,
            _ => PositionDirection::Flat,
        }
    }

    pub fn is_long(&self) -> bool {
        self.size > 0
    }

    pub fn is_short(&self) -> bool {
        self.size < 0
    }

    pub fn is_flat(&self) -> bool {
        self.size == 0
    }

    /// Contracts held regardless of direction.
    pub fn contracts(&self) -> u32 {
        u32::try_from(self.size.unsigned_abs()).unwrap_or(u32::MAX)
    }

    /// Unrealized PnL at `current_price` with contract multiplier `mult`.
    pub fn unrealized_pnl(&self, current_price: f64, mult: f64) -> f64 {
        self.size as f64 * (current_price - self.price) * mult
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "size: {}, price: {:.2}", self.size, self.price)
    }
}

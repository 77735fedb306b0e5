//! Strategy configuration: set once at startup, immutable afterwards.

use crate::domain::{ExecType, ParseExecTypeError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("moving-average period must be >= 1 (got {0})")]
    InvalidPeriod(usize),

    #[error("stake must be >= 1 (got {0})")]
    InvalidStake(u32),

    #[error("percent offset must be a finite, non-negative number (got {0})")]
    InvalidPercentOffset(f64),

    #[error("limit validity must be at most {max} days (got {0})", max = MAX_VALID_DAYS)]
    InvalidValidDays(u32),

    #[error(transparent)]
    ExecType(#[from] ParseExecTypeError),
}

/// Longest limit-order lifetime accepted, in days.
pub const MAX_VALID_DAYS: u32 = 36_500;

/// Parameters of the crossover strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// SMA period the close is crossed against.
    pub period: usize,
    /// Contracts per new order.
    pub stake: u32,
    /// Never open short positions.
    pub only_long: bool,
    pub exec_type: ExecType,
    /// Limit distance from the close, in percent.
    pub percent_offset: f64,
    /// Limit order lifetime in days; 0 = no expiry.
    pub valid_days: u32,
    /// Emit strategy log lines.
    pub printout: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            period: 15,
            stake: 1,
            only_long: false,
            exec_type: ExecType::Market,
            percent_offset: 0.0,
            valid_days: 1,
            printout: false,
        }
    }
}

impl StrategyConfig {
    /// Check parameter ranges. Returns the config unchanged on success.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.period == 0 {
            return Err(ConfigError::InvalidPeriod(self.period));
        }
        if self.stake == 0 {
            return Err(ConfigError::InvalidStake(self.stake));
        }
        if !self.percent_offset.is_finite() || self.percent_offset < 0.0 {
            return Err(ConfigError::InvalidPercentOffset(self.percent_offset));
        }
        if self.valid_days > MAX_VALID_DAYS {
            return Err(ConfigError::InvalidValidDays(self.valid_days));
        }
        Ok(self)
    }
}

//! Strategy log lines and the sink they are written to.
//!
//! Lines render as `<ISO timestamp>  <message>` (two spaces). Where the lines
//! end up (console, CSV, memory) is decided by the `StrategyLog` implementation
//! the driver hands to the strategy.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// ISO-8601 rendering used in log lines. Fractional seconds only when non-zero.
pub fn iso_timestamp(datetime: &NaiveDateTime) -> String {
    datetime.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

/// Float rendering used for raw prices in log messages: whole numbers keep a
/// trailing `.0`, missing values print as `nan`.
pub fn log_float(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{value:?}")
    }
}

/// One timestamped strategy log message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub datetime: NaiveDateTime,
    pub message: String,
}

impl LogLine {
    pub fn new(datetime: NaiveDateTime, message: impl Into<String>) -> Self {
        Self {
            datetime,
            message: message.into(),
        }
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", iso_timestamp(&self.datetime), self.message)
    }
}

/// Destination for strategy log lines.
pub trait StrategyLog {
    fn log(&mut self, line: LogLine);
}

/// In-memory sink.
impl StrategyLog for Vec<LogLine> {
    fn log(&mut self, line: LogLine) {
        self.push(line);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl StrategyLog for NullLog {
    fn log(&mut self, _line: LogLine) {}
}

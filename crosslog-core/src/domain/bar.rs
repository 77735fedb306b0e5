//! Bar, the fundamental market data unit.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// OHLCV bar plus open interest and one extra numeric field (`pe`).
///
/// The first seven fields follow the usual generic-CSV layout; `pe` is
/// appended after them. Missing values in the source feed are carried as NaN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub datetime: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub open_interest: f64,
    pub pe: f64,
}

impl Bar {
    /// Calendar date of the bar.
    pub fn date(&self) -> NaiveDate {
        self.datetime.date()
    }

    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }
}

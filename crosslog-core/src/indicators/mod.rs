//! Indicators feeding the crossover strategy.
//!
//! Both implement the `Indicator` trait. They are precomputed once before the
//! bar loop and read per bar by the driver.

pub mod crossover;
pub mod indicator;
pub mod sma;

pub use crossover::CrossOver;
pub use indicator::{Indicator, IndicatorValues};
pub use sma::Sma;

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLC: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, one bar per day.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base = chrono::NaiveDate::from_ymd_opt(2018, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                datetime: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
                open_interest: 0.0,
                pe: 15.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

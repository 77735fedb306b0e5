//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    /// Panics if `period` is zero; strategy configs are validated before this.
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        let mut sum: f64 = bars.iter().take(self.period).map(|b| b.close).sum();
        result[self.period - 1] = sum / self.period as f64;

        for i in self.period..n {
            let leaving = bars[i - self.period].close;
            let entering = bars[i].close;

            if leaving.is_nan() || entering.is_nan() || sum.is_nan() {
                // A NaN poisons the running sum; rescan the window instead.
                sum = bars[(i + 1 - self.period)..=i].iter().map(|b| b.close).sum();
            } else {
                sum = sum - leaving + entering;
            }

            result[i] = sum / self.period as f64;
        }

        result
    }
}

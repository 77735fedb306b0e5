//! Close-vs-SMA crossover signal.
//!
//! Emits `+1.0` on the bar where the close crosses above its simple moving
//! average, `-1.0` where it crosses below, and `0.0` otherwise.
//!
//! The previous side is taken from the last *non-zero* close−SMA difference,
//! so a close that touches the average and then continues on the same side
//! does not count as a cross, while touching and then crossing does.

use super::{Indicator, Sma};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct CrossOver {
    sma: Sma,
    name: String,
}

impl CrossOver {
    pub fn new(period: usize) -> Self {
        Self {
            sma: Sma::new(period),
            name: format!("crossover_{period}"),
        }
    }

    /// The moving average the close is compared against.
    pub fn average(&self) -> &Sma {
        &self.sma
    }
}

impl Indicator for CrossOver {
    fn name(&self) -> &str {
        &self.name
    }

    /// One bar more than the SMA: a cross needs a previous difference.
    fn lookback(&self) -> usize {
        self.sma.lookback() + 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let average = self.sma.compute(bars);
        let mut result = vec![f64::NAN; bars.len()];
        let mut last_nonzero: Option<f64> = None;

        for (i, (bar, avg)) in bars.iter().zip(average.iter()).enumerate() {
            let diff = bar.close - avg;
            if diff.is_nan() {
                continue;
            }

            if let Some(prev) = last_nonzero {
                result[i] = if prev < 0.0 && diff > 0.0 {
                    1.0
                } else if prev > 0.0 && diff < 0.0 {
                    -1.0
                } else {
                    0.0
                };
            }

            if diff != 0.0 || last_nonzero.is_none() {
                last_nonzero = Some(diff);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn signals(closes: &[f64], period: usize) -> Vec<f64> {
        CrossOver::new(period).compute(&make_bars(closes))
    }

    #[test]
    fn upward_cross_fires_plus_one() {
        // SMA(2): [_, 10, 9.5, 9.5, 11]; close-sma: [_, 0, -0.5, 0.5, 1]
        let s = signals(&[10.0, 10.0, 9.0, 10.0, 12.0], 2);
        assert!(s[0].is_nan());
        assert!(s[1].is_nan());
        assert_eq!(s[2], 0.0);
        assert_eq!(s[3], 1.0);
        assert_eq!(s[4], 0.0);
    }

    #[test]
    fn downward_cross_fires_minus_one() {
        let s = signals(&[10.0, 12.0, 14.0, 11.0], 2);
        // close-sma: [_, 1, 1, -1.5]
        assert_eq!(s[2], 0.0);
        assert_eq!(s[3], -1.0);
    }

    #[test]
    fn touching_the_average_is_not_a_cross() {
        // SMA(2) close-sma: [_, 1, 0, 1] (above, touch, above)
        let s = signals(&[10.0, 12.0, 12.0, 14.0], 2);
        assert_eq!(s[2], 0.0);
        assert_eq!(s[3], 0.0);
    }

    #[test]
    fn touch_then_cross_uses_last_nonzero_side() {
        // close-sma: [_, 1, 0, -1]
        let s = signals(&[10.0, 12.0, 12.0, 10.0], 2);
        assert_eq!(s[3], -1.0);
    }

    #[test]
    fn lookback_is_period() {
        assert_eq!(CrossOver::new(15).lookback(), 15);
        assert_eq!(CrossOver::new(15).name(), "crossover_15");
    }

    #[test]
    fn first_defined_value_is_at_lookback() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let s = signals(&closes, 5);
        assert!(s[..5].iter().all(|v| v.is_nan()));
        assert!(s[5..].iter().all(|v| !v.is_nan()));
    }
}

//! Indicator trait and precomputed indicator values container.
//!
//! Indicators are pure functions: bar history in, numeric series out.
//! They are precomputed once before the bar loop and read per-bar by the
//! driver. No recomputation on each bar.

use crate::domain::Bar;
use std::collections::HashMap;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values should be `f64::NAN` (warmup).
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_15", "crossover_15").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Container for precomputed indicator values, keyed by indicator name.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute every indicator over `bars` and store the results by name.
    pub fn precompute(bars: &[Bar], indicators: &[&dyn Indicator]) -> Self {
        let mut values = Self::new();
        for ind in indicators {
            values.insert(ind.name(), ind.compute(bars));
        }
        values
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }
}

//! Backtest driver: feed, indicators, strategy and broker wired into one
//! bar loop.
//!
//! Two entry points:
//! - `run_backtest()`: loads the CSV feed named in the config, then runs. Used by the CLI.
//! - `run_on_bars()`: takes pre-loaded bars, no I/O. Used by tests and benches.
//!
//! Per bar, strictly in this order:
//! 1. the broker matches working orders against the bar
//! 2. order notifications go to `on_order`
//! 3. trade notifications go to `on_trade`
//! 4. `on_bar`, once the crossover value is defined
//!
//! After the last bar the broker cancels whatever is still working and those
//! notifications are delivered too.

use crosslog_core::domain::{Bar, Position, TradeRecord};
use crosslog_core::indicators::{CrossOver, Indicator, IndicatorValues};
use crosslog_core::log::{LogLine, StrategyLog};
use crosslog_core::strategy::{BarContext, CrossoverStrategy, Strategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::broker::PaperBroker;
use crate::config::{RunConfig, RunConfigError, RunId};
use crate::feed::{dataset_hash, load_bars, FeedError};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] RunConfigError),
    #[error("data error: {0}")]
    Feed(#[from] FeedError),
}

/// Current schema version for persisted run results.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// One bar with the indicator values computed for it.
#[derive(Debug, Clone)]
pub struct BarRow {
    pub bar: Bar,
    pub sma: f64,
    pub crossover: f64,
}

/// Complete result of a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub dataset_hash: String,
    pub config: RunConfig,
    pub bar_count: usize,
    /// Bars on which `on_bar` was called.
    pub signal_count: usize,
    pub orders_submitted: usize,
    pub trades: Vec<TradeRecord>,
    pub final_position: Position,
    pub final_cash: f64,
    pub final_value: f64,
    pub log: Vec<LogLine>,
    /// Per-bar data for `bars.csv`. Not persisted in JSON.
    #[serde(skip)]
    pub rows: Vec<BarRow>,
}

impl RunResult {
    /// Final value minus starting cash.
    pub fn net_pnl(&self) -> f64 {
        self.final_value - self.config.broker.cash
    }

    pub fn winning_trades(&self) -> usize {
        self.trades.iter().filter(|t| t.is_winner()).count()
    }
}

/// Strategy log sink that keeps every line and optionally echoes it to stdout.
#[derive(Debug, Default)]
pub struct RunLog {
    lines: Vec<LogLine>,
    echo: bool,
}

impl RunLog {
    pub fn new(echo: bool) -> Self {
        Self {
            lines: Vec::new(),
            echo,
        }
    }

    pub fn into_lines(self) -> Vec<LogLine> {
        self.lines
    }
}

impl StrategyLog for RunLog {
    fn log(&mut self, line: LogLine) {
        if self.echo {
            println!("{line}");
        }
        self.lines.push(line);
    }
}

/// Load the configured feed and run over it.
pub fn run_backtest(config: &RunConfig) -> Result<RunResult, RunError> {
    let config = config.clone().validated()?;
    let bars = load_bars(&config.data.path, &config.data.feed_options())?;
    info!(
        path = %config.data.path.display(),
        bars = bars.len(),
        first = %bars[0].datetime,
        last = %bars[bars.len() - 1].datetime,
        "bars loaded"
    );
    run_on_bars(&config, bars)
}

/// Run over pre-loaded bars. No I/O apart from the optional console echo.
///
/// The config is validated first; an out-of-range parameter is an error,
/// not a panic inside the indicators.
pub fn run_on_bars(config: &RunConfig, bars: Vec<Bar>) -> Result<RunResult, RunError> {
    let config = &config.clone().validated()?;
    let run_id = config.run_id();
    let dataset_hash = dataset_hash(&bars);
    info!(run_id = %&run_id[..12], period = config.strategy.period, "run started");

    let crossover = CrossOver::new(config.strategy.period);
    let sma = crossover.average().clone();
    let values = IndicatorValues::precompute(&bars, &[&sma, &crossover]);
    let signals = values.get_series(crossover.name()).unwrap_or_default();
    let averages = values.get_series(sma.name()).unwrap_or_default();

    let mut strategy = CrossoverStrategy::new(config.strategy.clone());
    let mut broker = PaperBroker::new(config.broker.clone());
    let mut log = RunLog::new(config.strategy.printout);
    let mut signal_count = 0;

    for (i, bar) in bars.iter().enumerate() {
        broker.process_bar(bar);
        deliver(&mut broker, &mut strategy, &mut log);

        let signal = signals.get(i).copied().unwrap_or(f64::NAN);
        if signal.is_nan() {
            continue;
        }
        signal_count += 1;

        let ctx = BarContext {
            bar,
            signal,
            position: broker.position(),
        };
        let decision = strategy.on_bar(&ctx, &mut broker, &mut log);
        if decision.request().is_some() {
            debug!(datetime = %bar.datetime, ?decision, "order routed");
        }
    }

    if let Some(last) = bars.last().filter(|_| broker.has_working_orders()) {
        debug!(datetime = %last.datetime, "canceling orders still working at end of data");
        broker.cancel_all(last.datetime);
        deliver(&mut broker, &mut strategy, &mut log);
    }

    let final_value = bars
        .last()
        .map_or(broker.cash(), |last| broker.value(last.close));

    let rows = bars
        .into_iter()
        .enumerate()
        .map(|(i, bar)| BarRow {
            bar,
            sma: averages.get(i).copied().unwrap_or(f64::NAN),
            crossover: signals.get(i).copied().unwrap_or(f64::NAN),
        })
        .collect::<Vec<_>>();

    info!(
        orders = broker.orders_submitted(),
        trades = broker.trades().len(),
        final_value,
        "run finished"
    );

    Ok(RunResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        dataset_hash,
        config: config.clone(),
        bar_count: rows.len(),
        signal_count,
        orders_submitted: broker.orders_submitted(),
        trades: broker.trades().to_vec(),
        final_position: broker.position(),
        final_cash: broker.cash(),
        final_value,
        log: log.into_lines(),
        rows,
    })
}

fn deliver(broker: &mut PaperBroker, strategy: &mut dyn Strategy, log: &mut RunLog) {
    for notification in broker.take_order_notifications() {
        debug!(order = %notification.order_id, status = %notification.status, "order notification");
        strategy.on_order(&notification, log);
    }
    for notification in broker.take_trade_notifications() {
        strategy.on_trade(&notification, log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        let base = NaiveDate::from_ymd_opt(2018, 1, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                datetime: base + chrono::Duration::hours(i as i64),
                open: c,
                high: c + 0.5,
                low: c - 0.5,
                close: c,
                volume: 100.0,
                open_interest: 0.0,
                pe: 10.0,
            })
            .collect()
    }

    fn config(period: usize) -> RunConfig {
        let mut cfg = RunConfig::for_data("unused.csv");
        cfg.strategy.period = period;
        cfg.strategy.printout = false;
        cfg
    }

    #[test]
    fn warmup_bars_never_reach_the_strategy() {
        let bars = bars_from_closes(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = run_on_bars(&config(3), bars).unwrap();
        assert_eq!(result.bar_count, 5);
        // SMA(3) defined from bar 2, crossover needs one more bar.
        assert_eq!(result.signal_count, 2);
        assert!(result.rows[1].sma.is_nan());
        assert!((result.rows[2].sma - 11.0).abs() < 1e-12);
    }

    #[test]
    fn no_cross_no_orders() {
        let bars = bars_from_closes(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        let result = run_on_bars(&config(2), bars).unwrap();
        assert_eq!(result.orders_submitted, 0);
        assert_eq!(result.final_value, result.config.broker.cash);
        assert_eq!(result.net_pnl(), 0.0);
    }

    #[test]
    fn cross_up_buys_at_next_open() {
        // Falling, then a sharp rise crosses the 2-bar average upward on bar 4.
        let bars = bars_from_closes(&[10.0, 9.0, 8.0, 7.0, 12.0, 13.0]);
        let result = run_on_bars(&config(2), bars).unwrap();
        assert_eq!(result.orders_submitted, 1);
        assert_eq!(result.final_position, Position::new(1, 13.0));
        assert!(result.trades.is_empty());
    }

    #[test]
    fn unfilled_orders_are_canceled_at_the_end() {
        let mut cfg = config(2);
        cfg.strategy.exec_type = crosslog_core::domain::ExecType::Limit;
        cfg.strategy.percent_offset = 50.0;
        cfg.strategy.valid_days = 0;
        cfg.strategy.printout = true;
        let bars = bars_from_closes(&[10.0, 9.0, 8.0, 7.0, 12.0, 13.0]);
        let result = run_on_bars(&cfg, bars).unwrap();

        assert_eq!(result.orders_submitted, 1);
        assert!(result.final_position.is_flat());
        let last = result.log.last().unwrap();
        assert_eq!(last.message, ".. Order is Canceled ,");
    }

    #[test]
    fn invalid_config_is_an_error_not_a_panic() {
        let bars = bars_from_closes(&[10.0, 11.0, 12.0]);
        let mut cfg = config(2);
        cfg.strategy.period = 0;
        let err = run_on_bars(&cfg, bars).unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
    }

    #[test]
    fn result_json_skips_bar_rows() {
        let bars = bars_from_closes(&[10.0, 11.0, 12.0]);
        let result = run_on_bars(&config(2), bars).unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let back: RunResult = serde_json::from_str(&json).unwrap();
        assert!(back.rows.is_empty());
        assert_eq!(back.run_id, result.run_id);
        assert_eq!(back.bar_count, 3);
    }
}

//! crosslog CLI: run the close-vs-SMA crossover strategy over a CSV feed.
//!
//! Every run parameter is a flag with a default, so `crosslog --printout`
//! runs the stock setup against `JISL_pe.csv`. Alternatively `--config`
//! loads the whole run from a TOML file; the data and strategy flags are
//! rejected alongside it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{ArgGroup, Parser};
use crosslog_core::domain::ExecType;
use crosslog_core::strategy::StrategyConfig;
use crosslog_runner::{
    run_backtest, save_artifacts, BrokerConfig, DataConfig, OutputConfig, PaperBroker, RunConfig,
    RunResult,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "crosslog",
    about = "crosslog: close/SMA crossover backtest with a per-bar strategy log",
    group(ArgGroup::new("params").multiple(true))
)]
struct Cli {
    /// Data file to read.
    #[arg(short = 'd', long, default_value = "JISL_pe.csv", group = "params")]
    data: PathBuf,

    /// Starting date (YYYY-MM-DD).
    #[arg(short = 'f', long, default_value = "2018-01-01", group = "params")]
    fromdate: NaiveDate,

    /// Ending date (YYYY-MM-DD), inclusive.
    #[arg(short = 't', long, default_value = "2019-02-10", group = "params")]
    todate: NaiveDate,

    /// Period of the moving average.
    #[arg(long, default_value_t = 15, group = "params")]
    period: usize,

    /// Never open short positions.
    #[arg(short = 'o', long, group = "params")]
    onlylong: bool,

    /// Print the strategy log as the run progresses.
    #[arg(long)]
    printout: bool,

    /// Write bars, log and trades as CSV into --log-dir.
    #[arg(long, group = "params")]
    writercsv: bool,

    /// Directory for CSV artifacts.
    #[arg(long, default_value = "logs/crossover_result", group = "params")]
    log_dir: PathBuf,

    /// Add the crossover column to bars.csv.
    #[arg(long, group = "params")]
    csvcross: bool,

    /// Starting cash.
    #[arg(long, default_value_t = 100_000.0, group = "params")]
    cash: f64,

    /// Commission per contract.
    #[arg(long, default_value_t = 2.0, group = "params")]
    comm: f64,

    /// Contract multiplier.
    #[arg(long, default_value_t = 10.0, group = "params")]
    mult: f64,

    /// Margin per contract.
    #[arg(long, default_value_t = 2000.0, group = "params")]
    margin: f64,

    /// Contracts per new order.
    #[arg(long, default_value_t = 1, group = "params")]
    stake: u32,

    /// Plot the result (not available; accepted for compatibility).
    #[arg(short = 'p', long)]
    plot: bool,

    /// Number of figures for --plot.
    #[arg(short = 'n', long, default_value_t = 1)]
    numfigs: u32,

    /// Execution type: Market or Limit.
    #[arg(short = 'e', long, default_value = "Market", group = "params")]
    exectype: ExecType,

    /// Limit distance from the close, in percent.
    #[arg(long, default_value_t = 0.01, group = "params")]
    perc1: f64,

    /// Limit order lifetime in days (0 = good till canceled).
    #[arg(short = 'v', long, default_value_t = 0, group = "params")]
    valid: u32,

    /// Load the run from a TOML config instead of flags.
    #[arg(long, conflicts_with = "params")]
    config: Option<PathBuf>,
}

impl Cli {
    fn run_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => self.config_from_flags().validated()?,
        };
        config.strategy.printout |= self.printout;
        Ok(config)
    }

    fn config_from_flags(&self) -> RunConfig {
        RunConfig {
            data: DataConfig {
                fromdate: Some(self.fromdate),
                todate: Some(self.todate),
                ..DataConfig::new(&self.data)
            },
            strategy: StrategyConfig {
                period: self.period,
                stake: self.stake,
                only_long: self.onlylong,
                exec_type: self.exectype,
                percent_offset: self.perc1,
                valid_days: self.valid,
                printout: self.printout,
            },
            broker: BrokerConfig {
                cash: self.cash,
                commission: self.comm,
                mult: self.mult,
                margin: self.margin,
            },
            output: OutputConfig {
                writercsv: self.writercsv,
                csvcross: self.csvcross,
                log_dir: self.log_dir.clone(),
            },
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if cli.plot {
        warn!(numfigs = cli.numfigs, "plotting is not available, --plot ignored");
    }

    let config = cli.run_config()?;
    println!("{}", PaperBroker::new(config.broker.clone()));

    let result = run_backtest(&config)
        .with_context(|| format!("run over {} failed", config.data.path.display()))?;

    print_summary(&result);

    if config.output.writercsv {
        let dir = save_artifacts(&result, &config.output.log_dir, config.output.csvcross)?;
        info!(dir = %dir.display(), "artifacts written");
        println!("Artifacts saved to: {}", dir.display());
    }

    Ok(())
}

fn print_summary(result: &RunResult) {
    let first = result.rows.first().map(|r| r.bar.datetime.to_string());
    let last = result.rows.last().map(|r| r.bar.datetime.to_string());

    println!();
    println!("=== Backtest Result ===");
    println!("Run ID:         {}", &result.run_id[..12.min(result.run_id.len())]);
    println!("Data:           {}", result.config.data.path.display());
    println!(
        "Period:         {} to {}",
        first.unwrap_or_default(),
        last.unwrap_or_default()
    );
    println!(
        "Bars:           {} ({} with a signal)",
        result.bar_count, result.signal_count
    );
    println!("Orders:         {}", result.orders_submitted);
    println!(
        "Trades:         {} ({} winners)",
        result.trades.len(),
        result.winning_trades()
    );
    println!();
    println!("--- Broker ---");
    println!("Final Cash:     {:.2}", result.final_cash);
    println!("Final Value:    {:.2}", result.final_value);
    println!("Net PnL:        {:.2}", result.net_pnl());
    println!("Position:       {}", result.final_position);
    println!();
}

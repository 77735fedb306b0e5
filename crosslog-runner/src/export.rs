//! Run artifacts: JSON result and CSV files.
//!
//! `save_artifacts` writes into the configured log directory:
//! - `run.json`: the `RunResult` without per-bar rows
//! - `bars.csv`: every bar with its SMA (and crossover, when enabled)
//! - `log.csv`: the strategy log
//! - `trades.csv`: closed round trips
//!
//! Persisted JSON carries a `schema_version`; unknown versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use crosslog_core::domain::TradeRecord;
use crosslog_core::log::{iso_timestamp, LogLine};

use crate::runner::{BarRow, RunResult, SCHEMA_VERSION};

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(result: &RunResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize RunResult to JSON")
}

/// Deserialize a `RunResult`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunResult> {
    let result: RunResult =
        serde_json::from_str(json).context("failed to deserialize RunResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Two decimals; missing values as empty fields.
fn f2(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        format!("{v:.2}")
    }
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: datetime, open, high, low, close, volume, open_interest, pe, sma,
/// and `crossover` when `with_crossover`.
pub fn export_bars_csv(rows: &[BarRow], with_crossover: bool) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec![
        "datetime",
        "open",
        "high",
        "low",
        "close",
        "volume",
        "open_interest",
        "pe",
        "sma",
    ];
    if with_crossover {
        header.push("crossover");
    }
    wtr.write_record(&header)?;

    for row in rows {
        let b = &row.bar;
        let mut record = vec![
            iso_timestamp(&b.datetime),
            f2(b.open),
            f2(b.high),
            f2(b.low),
            f2(b.close),
            f2(b.volume),
            f2(b.open_interest),
            f2(b.pe),
            f2(row.sma),
        ];
        if with_crossover {
            record.push(f2(row.crossover));
        }
        wtr.write_record(&record)?;
    }

    finish(wtr)
}

pub fn export_log_csv(lines: &[LogLine]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["datetime", "message"])?;
    for line in lines {
        wtr.write_record([iso_timestamp(&line.datetime).as_str(), line.message.as_str()])?;
    }
    finish(wtr)
}

/// Columns: direction, entry_datetime, entry_price, exit_datetime,
/// exit_price, size, gross_pnl, commission, net_pnl, bars_held
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "direction",
        "entry_datetime",
        "entry_price",
        "exit_datetime",
        "exit_price",
        "size",
        "gross_pnl",
        "commission",
        "net_pnl",
        "bars_held",
    ])?;

    for t in trades {
        wtr.write_record([
            &format!("{:?}", t.direction),
            &iso_timestamp(&t.entry_datetime),
            &format!("{:.2}", t.entry_price),
            &iso_timestamp(&t.exit_datetime),
            &format!("{:.2}", t.exit_price),
            &t.size.to_string(),
            &format!("{:.2}", t.gross_pnl),
            &format!("{:.2}", t.commission),
            &format!("{:.2}", t.net_pnl),
            &t.bars_held.to_string(),
        ])?;
    }

    finish(wtr)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write the full artifact set into `dir`, creating it if needed.
///
/// `bars.csv` includes the crossover column when `with_crossover` is set.
/// Returns `dir`.
pub fn save_artifacts(result: &RunResult, dir: &Path, with_crossover: bool) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create artifact dir: {}", dir.display()))?;

    let files = [
        ("run.json", export_json(result)?),
        ("bars.csv", export_bars_csv(&result.rows, with_crossover)?),
        ("log.csv", export_log_csv(&result.log)?),
        ("trades.csv", export_trades_csv(&result.trades)?),
    ];
    for (name, content) in files {
        let path = dir.join(name);
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(dir.to_path_buf())
}

/// Load a `RunResult` from an artifact directory's `run.json`.
pub fn load_artifacts(dir: &Path) -> Result<RunResult> {
    let path = dir.join("run.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

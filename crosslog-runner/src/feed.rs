//! CSV bar feed.
//!
//! Reads a generic tabular file into `Bar`s:
//! 1. The header row is skipped
//! 2. Each field is picked by a configurable column index
//! 3. Empty numeric fields become `NaN`
//! 4. Rows outside `[fromdate, todate]` (calendar dates, inclusive) are dropped
//!
//! Rows must be in chronological order. A file that yields no bars in the
//! requested window is an error rather than an empty run.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use crosslog_core::domain::Bar;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Datetime layout of the default feed, e.g. `2018-01-02T10:00:00.000000`.
pub const DEFAULT_DT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Errors from the feed layer.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("cannot open '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: cannot parse datetime '{value}' with format '{format}'")]
    Datetime {
        line: u64,
        value: String,
        format: String,
    },

    #[error("line {line}: column '{column}' is not a number: '{value}'")]
    Number {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("line {line}: column '{column}' (index {index}) is missing")]
    MissingColumn {
        line: u64,
        column: &'static str,
        index: usize,
    },

    #[error("line {line}: {datetime} is earlier than the previous row")]
    OutOfOrder { line: u64, datetime: NaiveDateTime },

    #[error("no bars in '{origin}' for the requested date range")]
    Empty { origin: String },
}

/// Column index of each field. `None` for optional fields means "not in the
/// file"; in TOML that is written as `-1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedColumns {
    pub datetime: usize,
    pub open: usize,
    pub high: usize,
    pub low: usize,
    pub close: usize,
    #[serde(with = "optional_index")]
    pub volume: Option<usize>,
    #[serde(with = "optional_index")]
    pub open_interest: Option<usize>,
    #[serde(with = "optional_index")]
    pub pe: Option<usize>,
}

mod optional_index {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(index: &Option<usize>, s: S) -> Result<S::Ok, S::Error> {
        match index {
            Some(i) => s.serialize_u64(*i as u64),
            None => s.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<usize>, D::Error> {
        let raw = i64::deserialize(d)?;
        Ok(usize::try_from(raw).ok())
    }
}

impl Default for FeedColumns {
    fn default() -> Self {
        Self {
            datetime: 0,
            open: 1,
            high: 2,
            low: 3,
            close: 4,
            volume: Some(5),
            open_interest: Some(6),
            pe: Some(7),
        }
    }
}

/// How to read and window a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedOptions {
    pub columns: FeedColumns,
    pub dt_format: String,
    pub fromdate: Option<NaiveDate>,
    pub todate: Option<NaiveDate>,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            columns: FeedColumns::default(),
            dt_format: DEFAULT_DT_FORMAT.to_string(),
            fromdate: None,
            todate: None,
        }
    }
}

impl FeedOptions {
    fn in_window(&self, date: NaiveDate) -> bool {
        self.fromdate.map_or(true, |from| date >= from) && self.todate.map_or(true, |to| date <= to)
    }
}

/// Load bars from a CSV file on disk.
pub fn load_bars(path: &Path, opts: &FeedOptions) -> Result<Vec<Bar>, FeedError> {
    let file = File::open(path).map_err(|source| FeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_bars(file, opts, &path.display().to_string())
}

/// Parse bars from any reader. `origin` names the source in errors.
pub fn read_bars<R: Read>(reader: R, opts: &FeedOptions, origin: &str) -> Result<Vec<Bar>, FeedError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let cols = &opts.columns;
    let mut bars = Vec::new();
    let mut previous: Option<NaiveDateTime> = None;

    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let raw_dt = field(&record, line, "datetime", cols.datetime)?;
        let datetime = parse_datetime(raw_dt, &opts.dt_format).ok_or_else(|| FeedError::Datetime {
            line,
            value: raw_dt.to_string(),
            format: opts.dt_format.clone(),
        })?;

        if let Some(prev) = previous {
            if datetime < prev {
                return Err(FeedError::OutOfOrder { line, datetime });
            }
        }
        previous = Some(datetime);

        if !opts.in_window(datetime.date()) {
            continue;
        }

        bars.push(Bar {
            datetime,
            open: number(&record, line, "open", Some(cols.open))?,
            high: number(&record, line, "high", Some(cols.high))?,
            low: number(&record, line, "low", Some(cols.low))?,
            close: number(&record, line, "close", Some(cols.close))?,
            volume: number(&record, line, "volume", cols.volume)?,
            open_interest: number(&record, line, "open_interest", cols.open_interest)?,
            pe: number(&record, line, "pe", cols.pe)?,
        });
    }

    if bars.is_empty() {
        return Err(FeedError::Empty {
            origin: origin.to_string(),
        });
    }
    Ok(bars)
}

fn field<'r>(
    record: &'r csv::StringRecord,
    line: u64,
    column: &'static str,
    index: usize,
) -> Result<&'r str, FeedError> {
    record.get(index).ok_or(FeedError::MissingColumn {
        line,
        column,
        index,
    })
}

fn number(
    record: &csv::StringRecord,
    line: u64,
    column: &'static str,
    index: Option<usize>,
) -> Result<f64, FeedError> {
    let Some(index) = index else {
        return Ok(f64::NAN);
    };
    let raw = field(record, line, column, index)?;
    if raw.is_empty() {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>().map_err(|_| FeedError::Number {
        line,
        column,
        value: raw.to_string(),
    })
}

/// Full datetime first; date-only formats land at midnight.
fn parse_datetime(raw: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Deterministic BLAKE3 hash over the loaded bars.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(bar.datetime.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
        hasher.update(&bar.open_interest.to_le_bytes());
        hasher.update(&bar.pe.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

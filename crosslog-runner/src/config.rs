//! Serializable run configuration.
//!
//! A `RunConfig` captures everything needed to reproduce a run: the data
//! window, strategy parameters, broker terms and output settings. It can be
//! loaded from TOML:
//!
//! ```toml
//! [data]
//! path = "data/JISL_pe.csv"
//! fromdate = "2018-01-01"
//! todate = "2019-02-10"
//!
//! [strategy]
//! period = 15
//! exec_type = "Limit"
//! percent_offset = 0.5
//! valid_days = 2
//!
//! [broker]
//! cash = 100000.0
//! margin = 2000.0
//!
//! [output]
//! writercsv = true
//! log_dir = "logs/crossover_result"
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use crosslog_core::strategy::{ConfigError, StrategyConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::broker::{BrokerConfig, BrokerConfigError};
use crate::feed::{FeedColumns, FeedOptions, DEFAULT_DT_FORMAT};

/// Unique identifier for a run configuration (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum RunConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid strategy config: {0}")]
    Strategy(#[from] ConfigError),

    #[error("invalid broker config: {0}")]
    Broker(#[from] BrokerConfigError),

    #[error("fromdate {from} is after todate {to}")]
    DateRange { from: NaiveDate, to: NaiveDate },
}

/// Where the bars come from and which window of them to use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub fromdate: Option<NaiveDate>,
    #[serde(default)]
    pub todate: Option<NaiveDate>,
    #[serde(default)]
    pub columns: FeedColumns,
    #[serde(default = "default_dt_format")]
    pub dt_format: String,
}

fn default_dt_format() -> String {
    DEFAULT_DT_FORMAT.to_string()
}

impl DataConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fromdate: None,
            todate: None,
            columns: FeedColumns::default(),
            dt_format: default_dt_format(),
        }
    }

    pub fn feed_options(&self) -> FeedOptions {
        FeedOptions {
            columns: self.columns.clone(),
            dt_format: self.dt_format.clone(),
            fromdate: self.fromdate,
            todate: self.todate,
        }
    }
}

/// CSV artifact settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write bars, log and trades as CSV into `log_dir`.
    pub writercsv: bool,
    /// Add the crossover column to `bars.csv`.
    pub csvcross: bool,
    pub log_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            writercsv: false,
            csvcross: false,
            log_dir: PathBuf::from("logs/crossover_result"),
        }
    }
}

/// Complete configuration of a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub data: DataConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl RunConfig {
    /// A run over `path` with every other setting at its default.
    pub fn for_data(path: impl Into<PathBuf>) -> Self {
        Self {
            data: DataConfig::new(path),
            strategy: StrategyConfig::default(),
            broker: BrokerConfig::default(),
            output: OutputConfig::default(),
        }
    }

    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RunConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| RunConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, RunConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validated()
    }

    /// Check every section. Returns the config unchanged on success.
    pub fn validated(self) -> Result<Self, RunConfigError> {
        let strategy = self.strategy.validated()?;
        let broker = self.broker.validated()?;
        if let (Some(from), Some(to)) = (self.data.fromdate, self.data.todate) {
            if from > to {
                return Err(RunConfigError::DateRange { from, to });
            }
        }
        Ok(Self {
            strategy,
            broker,
            ..self
        })
    }

    /// Deterministic BLAKE3 hash of the canonical JSON form.
    ///
    /// Two runs with identical configs share a `RunId`.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("RunConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosslog_core::domain::ExecType;

    const FULL: &str = r#"
[data]
path = "data/JISL_pe.csv"
fromdate = "2018-01-01"
todate = "2019-02-10"
dt_format = "%Y-%m-%d %H:%M:%S"

[data.columns]
pe = -1

[strategy]
period = 20
stake = 2
only_long = true
exec_type = "Limit"
percent_offset = 0.5
valid_days = 3

[broker]
cash = 50000.0
commission = 1.5

[output]
writercsv = true
csvcross = true
log_dir = "out"
"#;

    #[test]
    fn parses_every_section() {
        let config = RunConfig::from_toml(FULL).unwrap();
        assert_eq!(config.data.path, PathBuf::from("data/JISL_pe.csv"));
        assert_eq!(config.data.fromdate, NaiveDate::from_ymd_opt(2018, 1, 1));
        assert_eq!(config.data.columns.pe, None);
        assert_eq!(config.data.columns.close, 4);
        assert_eq!(config.strategy.period, 20);
        assert_eq!(config.strategy.exec_type, ExecType::Limit);
        assert!(config.strategy.only_long);
        assert_eq!(config.broker.cash, 50_000.0);
        assert_eq!(config.broker.mult, 10.0, "unset broker fields keep defaults");
        assert!(config.output.csvcross);
        assert_eq!(config.output.log_dir, PathBuf::from("out"));
    }

    #[test]
    fn only_data_path_is_required() {
        let config = RunConfig::from_toml("[data]\npath = \"bars.csv\"\n").unwrap();
        assert_eq!(config, RunConfig::for_data("bars.csv"));
    }

    #[test]
    fn missing_data_section_is_parse_error() {
        let err = RunConfig::from_toml("[strategy]\nperiod = 5\n").unwrap_err();
        assert!(matches!(err, RunConfigError::Parse(_)));
    }

    #[test]
    fn unknown_exec_type_is_rejected() {
        let err = RunConfig::from_toml("[data]\npath = \"a.csv\"\n[strategy]\nexec_type = \"Stop\"\n")
            .unwrap_err();
        assert!(matches!(err, RunConfigError::Parse(_)));
    }

    #[test]
    fn invalid_strategy_values_are_rejected() {
        let err = RunConfig::from_toml("[data]\npath = \"a.csv\"\n[strategy]\nperiod = 0\n")
            .unwrap_err();
        assert!(matches!(
            err,
            RunConfigError::Strategy(ConfigError::InvalidPeriod(0))
        ));
    }

    #[test]
    fn invalid_broker_values_are_rejected() {
        let err = RunConfig::from_toml("[data]\npath = \"a.csv\"\n[broker]\ncash = -5.0\n")
            .unwrap_err();
        assert!(matches!(err, RunConfigError::Broker(_)));
    }

    #[test]
    fn reversed_date_range_is_rejected() {
        let err = RunConfig::from_toml(
            "[data]\npath = \"a.csv\"\nfromdate = \"2019-01-01\"\ntodate = \"2018-01-01\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, RunConfigError::DateRange { .. }));
    }

    #[test]
    fn run_id_is_deterministic() {
        let config = RunConfig::from_toml(FULL).unwrap();
        assert_eq!(config.run_id(), config.clone().run_id());
        assert_eq!(config.run_id().len(), 64);
    }

    #[test]
    fn run_id_changes_with_params() {
        let a = RunConfig::for_data("bars.csv");
        let mut b = a.clone();
        b.strategy.period = 30;
        assert_ne!(a.run_id(), b.run_id());
    }

    #[test]
    fn from_file_reports_missing_file() {
        let err = RunConfig::from_file(Path::new("/nonexistent/run.toml")).unwrap_err();
        assert!(matches!(err, RunConfigError::Io { .. }));
    }
}

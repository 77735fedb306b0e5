//! crosslog runner: everything around the strategy needed to run it on a file.
//!
//! This crate builds on `crosslog-core` to provide:
//! - A CSV bar feed with configurable columns and a date window
//! - A paper broker (market/limit fills, margin, commission, trade events)
//! - The bar-loop driver that serializes the strategy's entry points
//! - TOML run configuration with content-addressed run ids
//! - JSON/CSV run artifacts

pub mod broker;
pub mod config;
pub mod export;
pub mod feed;
pub mod runner;

pub use broker::{BrokerConfig, BrokerConfigError, PaperBroker};
pub use config::{DataConfig, OutputConfig, RunConfig, RunConfigError, RunId};
pub use export::{load_artifacts, save_artifacts};
pub use feed::{dataset_hash, load_bars, read_bars, FeedColumns, FeedError, FeedOptions};
pub use runner::{run_backtest, run_on_bars, BarRow, RunError, RunLog, RunResult};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<FeedOptions>();
        assert_sync::<FeedOptions>();
        assert_send::<BrokerConfig>();
        assert_sync::<BrokerConfig>();
    }

    #[test]
    fn broker_is_send_sync() {
        assert_send::<PaperBroker>();
        assert_sync::<PaperBroker>();
    }

    #[test]
    fn run_result_is_send_sync() {
        assert_send::<RunResult>();
        assert_sync::<RunResult>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<FeedError>();
        assert_sync::<FeedError>();
    }
}

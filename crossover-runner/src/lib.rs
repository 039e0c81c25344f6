//! Crossover Runner — configuration, price acquisition, metrics and export.
//!
//! This crate builds on `crossover-core` to provide:
//! - TOML configuration with BTC-USD daily defaults
//! - Price providers: Yahoo Finance, local CSV files, synthetic walks
//! - A runner that turns a config into a flattened `BacktestReport`
//! - Strategy and buy-and-hold metrics
//! - JSON/CSV artifact export for external charting

pub mod config;
pub mod data;
pub mod export;
pub mod metrics;
pub mod runner;

pub use config::{BacktestConfig, ConfigError, Interval, SourceConfig};
pub use data::{
    CsvProvider, DataError, DataSource, FetchRequest, PriceProvider, SyntheticProvider,
    YahooProvider,
};
pub use export::{export_json, import_json, load_artifacts, save_artifacts};
pub use metrics::PerformanceMetrics;
pub use runner::{
    provider_for, run_backtest, run_from_prices, run_with_provider, BacktestReport, ReportRow,
    RunError, SCHEMA_VERSION,
};

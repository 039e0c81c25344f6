//! Backtest runner: wires configuration, price acquisition, the core
//! pipeline and metrics into a single report.
//!
//! Three entry points:
//! - `run_backtest()`: picks the provider named in the config. Used by the CLI.
//! - `run_with_provider()`: fetches through an explicit provider. Used by tests
//!   and callers with their own data source.
//! - `run_from_prices()`: takes an already-loaded series, no I/O.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crossover_core::{
    CoreError, CrossoverStrategy, Holding, PositionChange, PriceSeries, TradeMarker,
};

use crate::config::{BacktestConfig, ConfigError, Interval, RunId, SourceConfig};
use crate::data::{
    CsvProvider, DataError, DataSource, FetchRequest, PriceProvider, SyntheticProvider,
    YahooProvider,
};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("backtest error: {0}")]
    Core(#[from] CoreError),
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// One period of the run, flattened for export and charting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub short_ma: f64,
    pub long_ma: f64,
    pub holding: Holding,
    pub position: PositionChange,
    /// `None` at the first period.
    pub asset_return: Option<f64>,
    /// `None` at the first period.
    pub strategy_return: Option<f64>,
    pub baseline_balance: f64,
    pub strategy_balance: f64,
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub symbol: String,
    pub interval: Interval,
    pub source: DataSource,
    pub strategy: CrossoverStrategy,
    pub initial_balance: f64,
    pub rows: Vec<ReportRow>,
    pub markers: Vec<TradeMarker>,
    pub strategy_metrics: PerformanceMetrics,
    pub baseline_metrics: PerformanceMetrics,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestReport {
    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.rows.first().map(|r| r.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.rows.last().map(|r| r.timestamp)
    }

    /// Strategy final balance minus baseline final balance.
    pub fn excess_balance(&self) -> f64 {
        self.strategy_metrics.final_balance - self.baseline_metrics.final_balance
    }
}

/// Build the provider the config asks for.
pub fn provider_for(config: &BacktestConfig) -> Result<Box<dyn PriceProvider>, RunError> {
    let provider: Box<dyn PriceProvider> = match &config.data.source {
        SourceConfig::Yahoo => Box::new(YahooProvider::new()?),
        SourceConfig::Synthetic => Box::new(SyntheticProvider::new()),
        SourceConfig::Csv(path) => Box::new(CsvProvider::new(path.clone())),
    };
    Ok(provider)
}

/// Run a backtest end to end, fetching prices from the configured source.
pub fn run_backtest(config: &BacktestConfig) -> Result<BacktestReport, RunError> {
    config.validate()?;
    let provider = provider_for(config)?;
    run_with_provider(config, provider.as_ref())
}

/// Run a backtest with prices from an explicit provider.
pub fn run_with_provider(
    config: &BacktestConfig,
    provider: &dyn PriceProvider,
) -> Result<BacktestReport, RunError> {
    config.validate()?;
    let request = FetchRequest {
        symbol: config.data.symbol.clone(),
        start: config.data.start,
        end: config.data.end,
        interval: config.data.interval,
    };
    info!(provider = provider.name(), symbol = %request.symbol, "loading prices");
    let prices = provider.fetch(&request)?;
    run_from_prices(config, &prices, provider.source())
}

/// Run a backtest over already-loaded prices. No I/O.
pub fn run_from_prices(
    config: &BacktestConfig,
    prices: &PriceSeries,
    source: DataSource,
) -> Result<BacktestReport, RunError> {
    config.validate()?;
    let strategy =
        CrossoverStrategy::new(config.strategy.short_window, config.strategy.long_window)?;
    let initial_balance = config.backtest.initial_balance;
    let run = strategy.run(prices, initial_balance)?;
    let markers = run.markers()?;

    let bt = &run.backtest;
    let rows: Vec<ReportRow> = (0..prices.len())
        .map(|i| ReportRow {
            timestamp: prices.index()[i],
            price: prices.values()[i],
            short_ma: run.short_ma.values()[i],
            long_ma: run.long_ma.values()[i],
            holding: run.signals.holdings.values()[i],
            position: run.signals.positions.values()[i],
            asset_return: bt.returns.values()[i],
            strategy_return: bt.strategy_returns.values()[i],
            baseline_balance: bt.baseline_balance.values()[i],
            strategy_balance: bt.strategy_balance.values()[i],
        })
        .collect();

    let strategy_metrics = PerformanceMetrics::compute(
        bt.strategy_balance.values(),
        run.signals.holdings.values(),
    );
    let baseline_metrics = PerformanceMetrics::buy_and_hold(bt.baseline_balance.values());

    info!(
        symbol = %config.data.symbol,
        periods = rows.len(),
        trades = strategy_metrics.trades,
        strategy_final = strategy_metrics.final_balance,
        baseline_final = baseline_metrics.final_balance,
        "backtest complete"
    );

    Ok(BacktestReport {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        symbol: config.data.symbol.clone(),
        interval: config.data.interval,
        source,
        strategy,
        initial_balance,
        rows,
        markers,
        strategy_metrics,
        baseline_metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crossover_core::domain::daily_series;

    struct FixedProvider(PriceSeries);

    impl PriceProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        fn source(&self) -> DataSource {
            DataSource::CsvFile
        }

        fn fetch(&self, _request: &FetchRequest) -> Result<PriceSeries, DataError> {
            Ok(self.0.clone())
        }
    }

    struct FailingProvider;

    impl PriceProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn source(&self) -> DataSource {
            DataSource::YahooFinance
        }

        fn fetch(&self, request: &FetchRequest) -> Result<PriceSeries, DataError> {
            Err(DataError::SymbolNotFound {
                symbol: request.symbol.clone(),
            })
        }
    }

    fn scenario_config() -> BacktestConfig {
        let mut config = BacktestConfig::default();
        config.strategy.short_window = 2;
        config.strategy.long_window = 3;
        config.backtest.initial_balance = 1000.0;
        config
    }

    fn scenario_prices() -> PriceSeries {
        daily_series(
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            &[100.0, 110.0, 90.0, 95.0, 120.0],
        )
    }

    #[test]
    fn report_rows_follow_the_pipeline() {
        let report =
            run_from_prices(&scenario_config(), &scenario_prices(), DataSource::CsvFile).unwrap();

        assert_eq!(report.schema_version, SCHEMA_VERSION);
        assert_eq!(report.rows.len(), 5);
        assert_eq!(report.rows[0].asset_return, None);
        assert_eq!(report.rows[0].position, PositionChange::Hold);
        assert_eq!(report.rows[4].position, PositionChange::Entry);
        assert_eq!(report.rows[4].holding, Holding::InAsset);
        assert_eq!(report.rows[3].strategy_balance, 1000.0);
        let expected = 1000.0 * 120.0 / 95.0;
        assert!((report.rows[4].strategy_balance - expected).abs() < 1e-9);
        assert!((report.rows[4].baseline_balance - 1200.0).abs() < 1e-9);

        assert_eq!(report.markers.len(), 1);
        assert_eq!(report.markers[0].index, 4);

        assert_eq!(report.strategy_metrics.trades, 1);
        assert!((report.strategy_metrics.exposure - 0.2).abs() < 1e-12);
        assert_eq!(report.baseline_metrics.exposure, 1.0);
        assert!(report.excess_balance() > 0.0);
    }

    #[test]
    fn run_id_comes_from_config() {
        let config = scenario_config();
        let report = run_from_prices(&config, &scenario_prices(), DataSource::CsvFile).unwrap();
        assert_eq!(report.run_id, config.run_id());
    }

    #[test]
    fn provider_source_is_recorded() {
        let provider = FixedProvider(scenario_prices());
        let report = run_with_provider(&scenario_config(), &provider).unwrap();
        assert_eq!(report.source, DataSource::CsvFile);
        assert_eq!(
            report.first_timestamp().map(|t| t.date()),
            NaiveDate::from_ymd_opt(2022, 1, 1)
        );
        assert_eq!(
            report.last_timestamp().map(|t| t.date()),
            NaiveDate::from_ymd_opt(2022, 1, 5)
        );
    }

    #[test]
    fn provider_errors_surface_as_data_errors() {
        let err = run_with_provider(&scenario_config(), &FailingProvider).unwrap_err();
        assert!(matches!(err, RunError::Data(DataError::SymbolNotFound { .. })));
    }

    #[test]
    fn invalid_config_fails_before_fetching() {
        let mut config = scenario_config();
        config.backtest.initial_balance = -5.0;
        let err = run_with_provider(&config, &FailingProvider).unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
    }

    #[test]
    fn bad_prices_are_core_errors() {
        let prices = daily_series(
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            &[100.0, 0.0, 90.0],
        );
        let err = run_from_prices(&scenario_config(), &prices, DataSource::CsvFile).unwrap_err();
        assert!(matches!(err, RunError::Core(_)));
    }

    #[test]
    fn provider_for_matches_source() {
        let mut config = BacktestConfig::default();
        config.data.source = SourceConfig::Synthetic;
        assert_eq!(provider_for(&config).unwrap().source(), DataSource::Synthetic);
        config.data.source = SourceConfig::Csv("prices.csv".into());
        assert_eq!(provider_for(&config).unwrap().source(), DataSource::CsvFile);
    }
}

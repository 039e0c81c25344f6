//! End-to-end runs through the public runner API: config file in,
//! artifacts out, for the offline data sources.

use std::path::PathBuf;

use chrono::NaiveDate;
use crossover_core::domain::daily_series;
use crossover_core::{Holding, PositionChange};
use crossover_runner::data::write_prices_csv;
use crossover_runner::{
    load_artifacts, run_backtest, save_artifacts, BacktestConfig, DataSource, Interval,
    RunError, SourceConfig,
};

fn write_fixture(dir: &std::path::Path) -> PathBuf {
    // Falls, recovers, then falls again: one entry and one exit at 2/3.
    let prices = daily_series(
        NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
        &[100.0, 110.0, 90.0, 95.0, 120.0, 80.0, 70.0],
    );
    let path = dir.join("prices.csv");
    let file = std::fs::File::create(&path).unwrap();
    write_prices_csv(file, &prices).unwrap();
    path
}

fn csv_config(path: PathBuf) -> BacktestConfig {
    let toml = format!(
        r#"
        [strategy]
        short_window = 2
        long_window = 3

        [backtest]
        initial_balance = 1000.0

        [data]
        start = "2022-01-01"
        end = "2022-01-31"
        source = {{ csv = "{}" }}
        "#,
        path.display()
    );
    BacktestConfig::from_toml_str(&toml).unwrap()
}

#[test]
fn csv_config_to_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let config = csv_config(write_fixture(dir.path()));
    assert_eq!(config.data.source, SourceConfig::Csv(dir.path().join("prices.csv")));

    let report = run_backtest(&config).unwrap();
    assert_eq!(report.source, DataSource::CsvFile);
    assert_eq!(report.rows.len(), 7);

    let positions: Vec<i8> = report.rows.iter().map(|r| r.position.value()).collect();
    assert_eq!(positions, vec![0, 0, 0, 0, 1, 0, -1]);
    assert_eq!(report.rows[6].holding, Holding::InCash);

    // Invested over 95 -> 120 -> 80, cash on the final fall.
    let expected = 1000.0 * (120.0 / 95.0) * (80.0 / 120.0);
    assert!((report.strategy_metrics.final_balance - expected).abs() < 1e-9);
    assert!((report.baseline_metrics.final_balance - 700.0).abs() < 1e-9);
    assert_eq!(report.strategy_metrics.trades, 1);
    assert!(report.strategy_metrics.max_drawdown < 0.0);

    assert_eq!(report.markers.len(), 2);
    assert_eq!(report.markers[0].change, PositionChange::Entry);
    assert_eq!(report.markers[1].change, PositionChange::Exit);
    assert!((report.markers[1].level - 75.0).abs() < 1e-12);

    let out = tempfile::tempdir().unwrap();
    let run_dir = save_artifacts(&report, out.path()).unwrap();
    let loaded = load_artifacts(&run_dir).unwrap();
    assert_eq!(loaded.run_id, report.run_id);
    let series = std::fs::read_to_string(run_dir.join("series.csv")).unwrap();
    assert_eq!(series.lines().count(), 8);
}

#[test]
fn synthetic_source_is_deterministic() {
    let mut config = BacktestConfig::default();
    config.data.source = SourceConfig::Synthetic;
    config.data.start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    config.data.end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();

    let a = run_backtest(&config).unwrap();
    let b = run_backtest(&config).unwrap();
    assert_eq!(a.rows.len(), 365);
    assert_eq!(a.rows, b.rows);
    assert_eq!(a.run_id, b.run_id);

    // Every strategy balance is either flat or follows the asset.
    for pair in a.rows.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        if prev.holding == Holding::InCash && cur.holding == Holding::InCash {
            assert_eq!(cur.strategy_balance, prev.strategy_balance);
        }
    }
}

#[test]
fn weekly_synthetic_interval() {
    let mut config = BacktestConfig::default();
    config.data.source = SourceConfig::Synthetic;
    config.data.interval = Interval::Week1;
    let report = run_backtest(&config).unwrap();
    assert_eq!(report.interval, Interval::Week1);
    let step = report.rows[1].timestamp - report.rows[0].timestamp;
    assert_eq!(step, chrono::Duration::weeks(1));
}

#[test]
fn missing_csv_is_a_data_error() {
    let config = csv_config(PathBuf::from("/no/such/prices.csv"));
    let err = run_backtest(&config).unwrap_err();
    assert!(matches!(err, RunError::Data(_)));
}

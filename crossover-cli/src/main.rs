//! Crossover CLI — run and download commands.
//!
//! Commands:
//! - `run` — backtest the crossover strategy from a TOML config, flags
//!   overriding config values, and save report artifacts
//! - `download` — fetch prices from Yahoo Finance into a CSV usable by
//!   `run --csv`
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crossover_runner::config::DataSection;
use crossover_runner::data::write_prices_csv;
use crossover_runner::{
    run_backtest, save_artifacts, BacktestConfig, BacktestReport, FetchRequest, Interval,
    PriceProvider, SourceConfig, YahooProvider,
};

#[derive(Parser)]
#[command(
    name = "crossover",
    about = "Moving average crossover backtester"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest the crossover strategy and save artifacts.
    Run {
        #[command(flatten)]
        overrides: RunOverrides,

        /// Output directory for report.json, series.csv and markers.csv.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the metrics as JSON instead of the summary table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Download prices from Yahoo Finance into a CSV file.
    Download {
        /// Symbol to download (e.g., BTC-USD).
        symbol: String,

        /// Start date (YYYY-MM-DD). Defaults to 2022-01-01.
        #[arg(long)]
        start: Option<NaiveDate>,

        /// End date (YYYY-MM-DD), inclusive. Defaults to 2024-12-31.
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Sampling interval: 1m 2m 5m 15m 30m 60m 90m 1h 1d 5d 1wk 1mo 3mo.
        #[arg(long, default_value = "1d")]
        interval: Interval,

        /// Destination CSV path.
        #[arg(long)]
        out: PathBuf,
    },
}

/// Flags for `run`. Each one, when given, replaces the config value.
#[derive(clap::Args, Debug, Default)]
struct RunOverrides {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    symbol: Option<String>,

    /// Start date (YYYY-MM-DD).
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD), inclusive.
    #[arg(long)]
    end: Option<NaiveDate>,

    #[arg(long)]
    interval: Option<Interval>,

    /// Short moving average window.
    #[arg(long)]
    short: Option<usize>,

    /// Long moving average window.
    #[arg(long)]
    long: Option<usize>,

    /// Initial balance.
    #[arg(long)]
    balance: Option<f64>,

    /// Read prices from a CSV file instead of Yahoo Finance.
    #[arg(long, conflicts_with = "synthetic")]
    csv: Option<PathBuf>,

    /// Use a deterministic synthetic random walk instead of Yahoo Finance.
    #[arg(long, default_value_t = false)]
    synthetic: bool,
}

impl RunOverrides {
    fn load_config(&self) -> Result<BacktestConfig> {
        let base = match &self.config {
            Some(path) => BacktestConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => BacktestConfig::default(),
        };
        let config = self.apply(base);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, mut config: BacktestConfig) -> BacktestConfig {
        if let Some(symbol) = &self.symbol {
            config.data.symbol = symbol.clone();
        }
        if let Some(start) = self.start {
            config.data.start = start;
        }
        if let Some(end) = self.end {
            config.data.end = end;
        }
        if let Some(interval) = self.interval {
            config.data.interval = interval;
        }
        if let Some(short) = self.short {
            config.strategy.short_window = short;
        }
        if let Some(long) = self.long {
            config.strategy.long_window = long;
        }
        if let Some(balance) = self.balance {
            config.backtest.initial_balance = balance;
        }
        if let Some(path) = &self.csv {
            config.data.source = SourceConfig::Csv(path.clone());
        } else if self.synthetic {
            config.data.source = SourceConfig::Synthetic;
        }
        config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            overrides,
            output_dir,
            json,
        } => run_cmd(&overrides, output_dir, json),
        Commands::Download {
            symbol,
            start,
            end,
            interval,
            out,
        } => download_cmd(symbol, start, end, interval, out),
    }
}

fn run_cmd(overrides: &RunOverrides, output_dir: PathBuf, json: bool) -> Result<()> {
    let config = overrides.load_config()?;
    info!(
        symbol = %config.data.symbol,
        short = config.strategy.short_window,
        long = config.strategy.long_window,
        "running backtest"
    );
    let report = run_backtest(&config)?;

    if json {
        let metrics = serde_json::json!({
            "run_id": report.run_id,
            "strategy": report.strategy_metrics,
            "baseline": report.baseline_metrics,
        });
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        print_summary(&report);
    }

    let run_dir = save_artifacts(&report, &output_dir)?;
    if !json {
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn download_cmd(
    symbol: String,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    interval: Interval,
    out: PathBuf,
) -> Result<()> {
    let defaults = DataSection::default();
    let request = FetchRequest {
        symbol,
        start: start.unwrap_or(defaults.start),
        end: end.unwrap_or(defaults.end),
        interval,
    };
    if request.start > request.end {
        anyhow::bail!("start {} is after end {}", request.start, request.end);
    }

    let provider = YahooProvider::new()?;
    let prices = provider
        .fetch(&request)
        .with_context(|| format!("downloading {}", request.symbol))?;

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = std::fs::File::create(&out)
        .with_context(|| format!("creating {}", out.display()))?;
    write_prices_csv(file, &prices)?;

    println!(
        "Wrote {} {} prices for {} to {}",
        prices.len(),
        request.interval,
        request.symbol,
        out.display()
    );
    Ok(())
}

fn print_summary(report: &BacktestReport) {
    let period = match (report.first_timestamp(), report.last_timestamp()) {
        (Some(first), Some(last)) => format!("{} to {}", first.date(), last.date()),
        _ => "(empty)".to_string(),
    };
    let s = &report.strategy_metrics;
    let b = &report.baseline_metrics;

    println!();
    println!("=== Backtest Result ===");
    println!("Symbol:         {} ({})", report.symbol, report.interval);
    println!("Period:         {period}");
    println!("Periods:        {}", report.rows.len());
    println!(
        "Windows:        {} / {}",
        report.strategy.short_window, report.strategy.long_window
    );
    println!("Initial:        {:.2}", report.initial_balance);
    println!();
    println!("{:<16} {:>14} {:>14}", "", "Crossover", "Buy & Hold");
    println!("{}", "-".repeat(46));
    println!(
        "{:<16} {:>14.2} {:>14.2}",
        "Final Balance", s.final_balance, b.final_balance
    );
    println!(
        "{:<16} {:>13.2}% {:>13.2}%",
        "Total Return",
        s.total_return * 100.0,
        b.total_return * 100.0
    );
    println!(
        "{:<16} {:>13.2}% {:>13.2}%",
        "Max Drawdown",
        s.max_drawdown * 100.0,
        b.max_drawdown * 100.0
    );
    println!("{:<16} {:>14} {:>14}", "Trades", s.trades, b.trades);
    println!(
        "{:<16} {:>13.1}% {:>13.1}%",
        "Exposure",
        s.exposure * 100.0,
        b.exposure * 100.0
    );
    println!();
    println!("Entries/exits:  {}", report.markers.len());
    println!("Run ID:         {}", report.run_id);
}

//! Serializable backtest configuration.
//!
//! A config file is TOML with three optional sections; anything omitted
//! falls back to the defaults below:
//!
//! ```toml
//! [strategy]
//! short_window = 10
//! long_window = 40
//!
//! [backtest]
//! initial_balance = 10000.0
//!
//! [data]
//! symbol = "BTC-USD"
//! interval = "1d"
//! start = "2022-01-01"
//! end = "2024-12-31"
//! source = "yahoo"            # or "synthetic", or { csv = "prices.csv" }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use crossover_core::CrossoverStrategy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Sampling interval of the price series, spelled the way the Yahoo chart API
/// spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "2m")]
    Minute2,
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "60m")]
    Minute60,
    #[serde(rename = "90m")]
    Minute90,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "5d")]
    Day5,
    #[serde(rename = "1wk")]
    Week1,
    #[serde(rename = "1mo")]
    Month1,
    #[serde(rename = "3mo")]
    Month3,
}

impl Interval {
    pub const ALL: [Interval; 13] = [
        Interval::Minute1,
        Interval::Minute2,
        Interval::Minute5,
        Interval::Minute15,
        Interval::Minute30,
        Interval::Minute60,
        Interval::Minute90,
        Interval::Hour1,
        Interval::Day1,
        Interval::Day5,
        Interval::Week1,
        Interval::Month1,
        Interval::Month3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Minute1 => "1m",
            Interval::Minute2 => "2m",
            Interval::Minute5 => "5m",
            Interval::Minute15 => "15m",
            Interval::Minute30 => "30m",
            Interval::Minute60 => "60m",
            Interval::Minute90 => "90m",
            Interval::Hour1 => "1h",
            Interval::Day1 => "1d",
            Interval::Day5 => "5d",
            Interval::Week1 => "1wk",
            Interval::Month1 => "1mo",
            Interval::Month3 => "3mo",
        }
    }

    /// Nominal spacing between observations. Months are approximated.
    pub fn step(&self) -> Duration {
        match self {
            Interval::Minute1 => Duration::minutes(1),
            Interval::Minute2 => Duration::minutes(2),
            Interval::Minute5 => Duration::minutes(5),
            Interval::Minute15 => Duration::minutes(15),
            Interval::Minute30 => Duration::minutes(30),
            Interval::Minute60 | Interval::Hour1 => Duration::hours(1),
            Interval::Minute90 => Duration::minutes(90),
            Interval::Day1 => Duration::days(1),
            Interval::Day5 => Duration::days(5),
            Interval::Week1 => Duration::weeks(1),
            Interval::Month1 => Duration::days(30),
            Interval::Month3 => Duration::days(91),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::ALL
            .iter()
            .copied()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Interval::ALL.iter().map(|i| i.as_str()).collect();
                ConfigError::Invalid(format!(
                    "unknown interval '{s}' (expected one of: {})",
                    known.join(", ")
                ))
            })
    }
}

/// Where prices come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceConfig {
    /// Yahoo Finance chart API.
    Yahoo,
    /// Deterministic random walk, for offline experiments.
    Synthetic,
    /// A local CSV file with a timestamp and a close column.
    Csv(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub initial_balance: f64,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            initial_balance: 10_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub symbol: String,
    pub interval: Interval,
    /// Inclusive.
    pub start: NaiveDate,
    /// Inclusive.
    pub end: NaiveDate,
    pub source: SourceConfig,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            symbol: "BTC-USD".to_string(),
            interval: Interval::Day1,
            start: NaiveDate::from_ymd_opt(2022, 1, 1).expect("valid calendar date"),
            end: NaiveDate::from_ymd_opt(2024, 12, 31).expect("valid calendar date"),
            source: SourceConfig::Yahoo,
        }
    }
}

/// Serializable configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub strategy: CrossoverStrategy,
    pub backtest: BacktestSection,
    pub data: DataSection,
}

impl BacktestConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check everything that can be checked without touching data.
    pub fn validate(&self) -> Result<(), ConfigError> {
        CrossoverStrategy::new(self.strategy.short_window, self.strategy.long_window)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let balance = self.backtest.initial_balance;
        if !(balance > 0.0 && balance.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "initial_balance must be positive, got {balance}"
            )));
        }
        if self.data.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("symbol must not be empty".into()));
        }
        if self.data.start > self.data.end {
            return Err(ConfigError::Invalid(format!(
                "start {} is after end {}",
                self.data.start, self.data.end
            )));
        }
        Ok(())
    }

    /// Computes a deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> RunId {
        // Serializing plain data with string keys cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

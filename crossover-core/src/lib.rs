//! Crossover Core — moving averages, crossover signals, compounding backtest.
//!
//! Three pure stages over a timestamp-indexed price series:
//! - `indicators` — clamped-window simple moving averages
//! - `signal` — holding state and entry/exit transitions from two averages
//! - `backtest` — per-period returns and compounded balances for the
//!   strategy and a buy-and-hold baseline
//!
//! `strategy::CrossoverStrategy` chains them. Nothing here performs I/O.

pub mod backtest;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod signal;
pub mod strategy;

pub use backtest::{backtest, period_returns, Backtest};
pub use domain::{Holding, PositionChange, PriceSeries, TimeSeries};
pub use error::{CoreError, Misalignment};
pub use indicators::{rolling_mean, Indicator, Sma};
pub use signal::{generate, CrossoverSignals, TradeMarker};
pub use strategy::{CrossoverStrategy, StrategyRun};

//! The full crossover pipeline: prices → averages → signals → backtest.
//!
//! Stages run in order and the first failure halts the pipeline, so no
//! stage ever sees a partially valid series.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backtest::{backtest, Backtest};
use crate::domain::{PriceSeries, TimeSeries};
use crate::error::CoreError;
use crate::indicators::{Indicator, Sma};
use crate::signal::{generate, CrossoverSignals, TradeMarker};

pub const DEFAULT_SHORT_WINDOW: usize = 10;
pub const DEFAULT_LONG_WINDOW: usize = 40;

/// Window pair of a moving average crossover strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossoverStrategy {
    pub short_window: usize,
    pub long_window: usize,
}

/// Every intermediate series of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyRun {
    pub prices: PriceSeries,
    pub short_ma: TimeSeries<f64>,
    pub long_ma: TimeSeries<f64>,
    pub signals: CrossoverSignals,
    pub backtest: Backtest,
}

impl CrossoverStrategy {
    /// Both windows must be >= 1. A long window that is not longer than the
    /// short one is accepted, but the crossover is then meaningless.
    pub fn new(short_window: usize, long_window: usize) -> Result<Self, CoreError> {
        for window in [short_window, long_window] {
            if window < 1 {
                return Err(CoreError::InvalidWindow { window });
            }
        }
        if long_window <= short_window {
            warn!(
                short_window,
                long_window, "long window is not longer than short window"
            );
        }
        Ok(Self {
            short_window,
            long_window,
        })
    }

    pub fn run(&self, prices: &PriceSeries, initial_balance: f64) -> Result<StrategyRun, CoreError> {
        let short_ma = Sma::new(self.short_window)?.compute(prices)?;
        let long_ma = Sma::new(self.long_window)?.compute(prices)?;
        debug!(
            periods = prices.len(),
            short_window = self.short_window,
            long_window = self.long_window,
            "moving averages computed"
        );

        let signals = generate(&short_ma, &long_ma)?;
        debug!(
            entries = signals.entry_count(),
            exposure = signals.exposure(),
            "signals generated"
        );

        let backtest = backtest(prices, &signals.holdings, initial_balance)?;
        debug!(
            final_baseline = backtest.final_baseline(),
            final_strategy = backtest.final_strategy(),
            "backtest complete"
        );

        Ok(StrategyRun {
            prices: prices.clone(),
            short_ma,
            long_ma,
            signals,
            backtest,
        })
    }
}

impl Default for CrossoverStrategy {
    fn default() -> Self {
        Self {
            short_window: DEFAULT_SHORT_WINDOW,
            long_window: DEFAULT_LONG_WINDOW,
        }
    }
}

impl StrategyRun {
    /// Entry/exit markers at the short average.
    pub fn markers(&self) -> Result<Vec<TradeMarker>, CoreError> {
        self.signals.markers(&self.short_ma)
    }
}

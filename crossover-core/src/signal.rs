//! Moving average crossover signal.
//!
//! Compares a short-window and a long-window average at every index:
//! the strategy holds the asset while short > long (strictly) and cash
//! otherwise. A tie is cash. Transitions between consecutive holdings are
//! reported as entries (+1) and exits (-1); index 0 has no predecessor and
//! is always `Hold`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Holding, PositionChange, TimeSeries};
use crate::error::CoreError;

/// Output of [`generate`]: holding state and transitions, aligned with the inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossoverSignals {
    pub holdings: TimeSeries<Holding>,
    pub positions: TimeSeries<PositionChange>,
}

/// An entry or exit event, positioned for plotting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeMarker {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub change: PositionChange,
    /// Short moving average at the marker, where the chart places the arrow.
    pub level: f64,
}

/// Holding for a single pair of averages. Ties resolve to cash.
pub fn holding_for(short: f64, long: f64) -> Holding {
    if short > long {
        Holding::InAsset
    } else {
        Holding::InCash
    }
}

/// Derive holding states and position changes from two moving averages.
///
/// Fails with `LengthMismatch` if the averages are not on the same index,
/// `EmptyInput` if they are empty, and `UndefinedValue` if either contains NaN.
pub fn generate(
    short_ma: &TimeSeries<f64>,
    long_ma: &TimeSeries<f64>,
) -> Result<CrossoverSignals, CoreError> {
    short_ma.ensure_aligned(long_ma, "signal generation")?;
    if short_ma.is_empty() {
        return Err(CoreError::EmptyInput);
    }

    let mut holdings = Vec::with_capacity(short_ma.len());
    for (i, (&short, &long)) in short_ma.values().iter().zip(long_ma.values()).enumerate() {
        if short.is_nan() {
            return Err(CoreError::UndefinedValue {
                what: "short moving average",
                index: i,
            });
        }
        if long.is_nan() {
            return Err(CoreError::UndefinedValue {
                what: "long moving average",
                index: i,
            });
        }
        holdings.push(holding_for(short, long));
    }

    let positions = std::iter::once(PositionChange::Hold)
        .chain(holdings.windows(2).map(|w| w[1].transition_from(w[0])))
        .collect();

    Ok(CrossoverSignals {
        holdings: short_ma.with_values(holdings),
        positions: short_ma.with_values(positions),
    })
}

impl CrossoverSignals {
    /// Number of entries (cash → asset transitions).
    pub fn entry_count(&self) -> usize {
        self.positions
            .values()
            .iter()
            .filter(|p| **p == PositionChange::Entry)
            .count()
    }

    /// Fraction of periods spent holding the asset.
    pub fn exposure(&self) -> f64 {
        if self.holdings.is_empty() {
            return 0.0;
        }
        let invested = self
            .holdings
            .values()
            .iter()
            .filter(|h| h.is_invested())
            .count();
        invested as f64 / self.holdings.len() as f64
    }

    /// Entry/exit markers placed at the short average, in index order.
    ///
    /// `short_ma` must be the series the signals were generated from.
    pub fn markers(&self, short_ma: &TimeSeries<f64>) -> Result<Vec<TradeMarker>, CoreError> {
        self.positions.ensure_aligned(short_ma, "trade markers")?;
        Ok(self
            .positions
            .iter()
            .enumerate()
            .filter(|(_, (_, change))| change.is_transition())
            .map(|(index, (timestamp, &change))| TradeMarker {
                index,
                timestamp,
                change,
                level: short_ma.values()[index],
            })
            .collect())
    }
}

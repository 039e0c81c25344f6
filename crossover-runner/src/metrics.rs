//! Performance metrics: pure functions over a balance curve.
//!
//! Every metric is balance series and/or holdings in, scalar out. The same
//! computation serves the strategy and the buy-and-hold baseline.

use crossover_core::Holding;
use serde::{Deserialize, Serialize};

/// Summary statistics for one balance curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub final_balance: f64,
    /// Fractional change from the first to the last balance.
    pub total_return: f64,
    /// Largest fall from a running peak, as a non-positive fraction.
    pub max_drawdown: f64,
    /// Contiguous spans spent in the asset.
    pub trades: usize,
    /// Fraction of periods spent in the asset.
    pub exposure: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics for a balance curve and the holdings that produced it.
    pub fn compute(balance: &[f64], holdings: &[Holding]) -> Self {
        Self {
            final_balance: balance.last().copied().unwrap_or(0.0),
            total_return: total_return(balance),
            max_drawdown: max_drawdown(balance),
            trades: trade_count(holdings),
            exposure: exposure(holdings),
        }
    }

    /// Metrics for holding the asset every period.
    pub fn buy_and_hold(balance: &[f64]) -> Self {
        let holdings = vec![Holding::InAsset; balance.len()];
        Self::compute(balance, &holdings)
    }
}

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(balance: &[f64]) -> f64 {
    match (balance.first(), balance.last()) {
        (Some(&initial), Some(&last)) if initial > 0.0 => (last - initial) / initial,
        _ => 0.0,
    }
}

/// Maximum drawdown as a negative fraction, 0.0 when the curve never falls.
pub fn max_drawdown(balance: &[f64]) -> f64 {
    let Some(&first) = balance.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &b in balance {
        if b > peak {
            peak = b;
        }
        if peak > 0.0 {
            let dd = (b - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Number of maximal runs of `InAsset`.
pub fn trade_count(holdings: &[Holding]) -> usize {
    let mut count = 0;
    let mut previous = Holding::InCash;
    for &h in holdings {
        if h.is_invested() && !previous.is_invested() {
            count += 1;
        }
        previous = h;
    }
    count
}

/// Fraction of periods held in the asset.
pub fn exposure(holdings: &[Holding]) -> f64 {
    if holdings.is_empty() {
        return 0.0;
    }
    let invested = holdings.iter().filter(|h| h.is_invested()).count();
    invested as f64 / holdings.len() as f64
}

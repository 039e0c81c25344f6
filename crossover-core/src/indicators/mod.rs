//! Moving-average indicators.
//!
//! Indicators are pure functions: price series in, aligned numeric series out.
//! They never look past the bar they are computing.

pub mod sma;

pub use sma::{rolling_mean, Sma};

use crate::domain::{PriceSeries, TimeSeries};
use crate::error::CoreError;

/// Trait for indicators computed over a full price series.
///
/// # Look-ahead contamination guard
/// No output value at index t may depend on a price at t+1 or later. Every
/// indicator must produce bit-identical values on a prefix of the series.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g. "sma_10").
    fn name(&self) -> &str;

    /// Maximum number of trailing observations per output value.
    fn window(&self) -> usize;

    /// Compute the indicator over the whole series.
    fn compute(&self, prices: &PriceSeries) -> Result<TimeSeries<f64>, CoreError>;
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

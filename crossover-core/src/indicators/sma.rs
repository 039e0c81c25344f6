//! Simple Moving Average (SMA) with a clamped warm-up window.
//!
//! Value at index i is the mean of the trailing `min(window, i + 1)` prices,
//! so the first `window - 1` entries average whatever history exists instead
//! of being undefined ("minimum periods = 1").

use crate::domain::{PriceSeries, TimeSeries};
use crate::error::CoreError;

use super::Indicator;

/// Rolling arithmetic mean of `series` over a trailing window.
///
/// Fails with `InvalidWindow` for `window == 0` and `EmptyInput` for an empty
/// series. A NaN inside a window makes that output NaN.
pub fn rolling_mean(series: &PriceSeries, window: usize) -> Result<TimeSeries<f64>, CoreError> {
    if window < 1 {
        return Err(CoreError::InvalidWindow { window });
    }
    if series.is_empty() {
        return Err(CoreError::EmptyInput);
    }

    // Each window is summed independently: output i is bit-identical on any
    // prefix of the series that contains i.
    let prices = series.values();
    let means = (0..prices.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &prices[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect();

    Ok(series.with_values(means))
}

#[derive(Debug, Clone)]
pub struct Sma {
    window: usize,
    name: String,
}

impl Sma {
    pub fn new(window: usize) -> Result<Self, CoreError> {
        if window < 1 {
            return Err(CoreError::InvalidWindow { window });
        }
        Ok(Self {
            window,
            name: format!("sma_{window}"),
        })
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn window(&self) -> usize {
        self.window
    }

    fn compute(&self, prices: &PriceSeries) -> Result<TimeSeries<f64>, CoreError> {
        rolling_mean(prices, self.window)
    }
}

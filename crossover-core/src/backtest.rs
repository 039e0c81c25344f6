//! Compounding backtest of the crossover strategy against buy-and-hold.
//!
//! Per-period return is `price[i] / price[i-1]`; index 0 has no return.
//! The baseline compounds every return. The strategy compounds the return of
//! period i only when it holds the asset during period i, and the
//! multiplicative identity otherwise. Both balances start at the initial
//! balance and are `initial × cumulative product` thereafter.

use crate::domain::{Holding, PriceSeries, TimeSeries};
use crate::error::CoreError;

/// Return and balance series for one backtest, all aligned with the prices.
#[derive(Debug, Clone, PartialEq)]
pub struct Backtest {
    pub initial_balance: f64,
    /// Asset return per period; `None` at index 0.
    pub returns: TimeSeries<Option<f64>>,
    /// Return the strategy actually earned per period; `None` at index 0.
    pub strategy_returns: TimeSeries<Option<f64>>,
    pub baseline_balance: TimeSeries<f64>,
    pub strategy_balance: TimeSeries<f64>,
}

impl Backtest {
    pub fn final_baseline(&self) -> f64 {
        self.baseline_balance
            .last()
            .copied()
            .unwrap_or(self.initial_balance)
    }

    pub fn final_strategy(&self) -> f64 {
        self.strategy_balance
            .last()
            .copied()
            .unwrap_or(self.initial_balance)
    }
}

/// Reject anything that would poison a cumulative product.
fn validate_prices(prices: &PriceSeries) -> Result<(), CoreError> {
    match prices
        .values()
        .iter()
        .position(|p| !p.is_finite() || *p <= 0.0)
    {
        Some(index) => Err(CoreError::UndefinedValue {
            what: "price",
            index,
        }),
        None => Ok(()),
    }
}

/// Per-period multiplicative returns. Index 0 is `None`.
///
/// Fails with `EmptyInput` on an empty series and `UndefinedValue` on a
/// missing, zero or negative price.
pub fn period_returns(prices: &PriceSeries) -> Result<TimeSeries<Option<f64>>, CoreError> {
    if prices.is_empty() {
        return Err(CoreError::EmptyInput);
    }
    validate_prices(prices)?;

    let values = prices.values();
    let returns = std::iter::once(None)
        .chain(values.windows(2).map(|w| Some(w[1] / w[0])))
        .collect();
    Ok(prices.with_values(returns))
}

/// `initial × Π returns[1..=i]`, with `initial` at index 0.
fn compound(
    initial_balance: f64,
    returns: &TimeSeries<Option<f64>>,
) -> Result<TimeSeries<f64>, CoreError> {
    let mut growth = 1.0_f64;
    let mut balances = Vec::with_capacity(returns.len());
    for (index, ret) in returns.values().iter().enumerate() {
        if let Some(r) = ret {
            growth *= r;
        }
        let balance = initial_balance * growth;
        if !balance.is_finite() {
            return Err(CoreError::UndefinedValue {
                what: "balance",
                index,
            });
        }
        balances.push(balance);
    }
    Ok(returns.with_values(balances))
}

/// Run the backtest for `holdings` over `prices`.
///
/// Fails with `NonPositiveBalance` unless `initial_balance` is positive and
/// finite, `LengthMismatch` if the series are not aligned, `EmptyInput` on
/// empty series, and `UndefinedValue` if any price cannot be compounded.
pub fn backtest(
    prices: &PriceSeries,
    holdings: &TimeSeries<Holding>,
    initial_balance: f64,
) -> Result<Backtest, CoreError> {
    if !(initial_balance > 0.0 && initial_balance.is_finite()) {
        return Err(CoreError::NonPositiveBalance(initial_balance));
    }
    prices.ensure_aligned(holdings, "backtest")?;

    let returns = period_returns(prices)?;
    let strategy_returns = returns.with_values(
        returns
            .values()
            .iter()
            .zip(holdings.values())
            .map(|(ret, holding)| match holding {
                Holding::InAsset => *ret,
                Holding::InCash => ret.map(|_| 1.0),
            })
            .collect(),
    );

    let baseline_balance = compound(initial_balance, &returns)?;
    let strategy_balance = compound(initial_balance, &strategy_returns)?;

    Ok(Backtest {
        initial_balance,
        returns,
        strategy_returns,
        baseline_balance,
        strategy_balance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::daily_series;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};
    use chrono::NaiveDate;
    use Holding::*;

    fn series(values: &[f64]) -> PriceSeries {
        daily_series(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), values)
    }

    fn holdings(prices: &PriceSeries, states: &[Holding]) -> TimeSeries<Holding> {
        prices.with_values(states.to_vec())
    }

    #[test]
    fn returns_start_undefined() {
        let r = period_returns(&series(&[100.0, 110.0, 99.0])).unwrap();
        assert_eq!(r.values()[0], None);
        assert_approx(r.values()[1].unwrap(), 1.1, DEFAULT_EPSILON);
        assert_approx(r.values()[2].unwrap(), 0.9, DEFAULT_EPSILON);
    }

    #[test]
    fn always_invested_matches_baseline() {
        let prices = series(&[100.0, 110.0, 99.0, 120.0]);
        let held = holdings(&prices, &[InAsset; 4]);
        let bt = backtest(&prices, &held, 1000.0).unwrap();
        assert_eq!(bt.baseline_balance, bt.strategy_balance);
        assert_approx(bt.final_baseline(), 1200.0, 1e-9);
    }

    #[test]
    fn cash_periods_are_flat() {
        let prices = series(&[100.0, 200.0, 100.0, 150.0]);
        let held = holdings(&prices, &[InCash, InAsset, InCash, InAsset]);
        let bt = backtest(&prices, &held, 1000.0).unwrap();

        let s = bt.strategy_balance.values();
        assert_eq!(s[0], 1000.0);
        assert_approx(s[1], 2000.0, 1e-9);
        assert_approx(s[2], 2000.0, 1e-9);
        assert_approx(s[3], 3000.0, 1e-9);
        assert_eq!(bt.strategy_returns.values()[2], Some(1.0));
        assert_eq!(bt.strategy_returns.values()[0], None);
    }

    #[test]
    fn holding_at_index_zero_earns_nothing() {
        let prices = series(&[100.0]);
        let held = holdings(&prices, &[InAsset]);
        let bt = backtest(&prices, &held, 500.0).unwrap();
        assert_eq!(bt.baseline_balance.values(), &[500.0]);
        assert_eq!(bt.strategy_balance.values(), &[500.0]);
        assert_eq!(bt.returns.values(), &[None::<f64>]);
    }

    #[test]
    fn non_positive_balance_is_rejected() {
        let prices = series(&[100.0, 101.0]);
        let held = holdings(&prices, &[InCash, InCash]);
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = backtest(&prices, &held, bad).unwrap_err();
            assert!(matches!(err, CoreError::NonPositiveBalance(_)), "{bad}");
        }
    }

    #[test]
    fn misaligned_holdings_are_rejected() {
        let prices = series(&[100.0, 101.0, 102.0]);
        let short = series(&[100.0, 101.0]);
        let held = short.map(|_| InCash);
        let err = backtest(&prices, &held, 1000.0).unwrap_err();
        assert!(matches!(err, CoreError::LengthMismatch { .. }));
    }

    #[test]
    fn missing_price_fails_instead_of_poisoning() {
        let prices = series(&[100.0, f64::NAN, 102.0]);
        let held = holdings(&prices, &[InCash; 3]);
        let err = backtest(&prices, &held, 1000.0).unwrap_err();
        assert_eq!(
            err,
            CoreError::UndefinedValue {
                what: "price",
                index: 1
            }
        );
    }

    #[test]
    fn zero_price_fails() {
        let prices = series(&[100.0, 0.0, 102.0]);
        let held = holdings(&prices, &[InCash; 3]);
        let err = backtest(&prices, &held, 1000.0).unwrap_err();
        assert_eq!(
            err,
            CoreError::UndefinedValue {
                what: "price",
                index: 1
            }
        );
    }

    #[test]
    fn inputs_are_left_untouched() {
        let prices = series(&[100.0, 110.0]);
        let before = prices.clone();
        let held = holdings(&prices, &[InAsset, InAsset]);
        let _ = backtest(&prices, &held, 1000.0).unwrap();
        assert_eq!(prices, before);
    }
}

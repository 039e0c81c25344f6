//! Deterministic synthetic prices for offline runs.
//!
//! A multiplicative random walk starting at 100. The RNG is seeded from the
//! BLAKE3 hash of the symbol, so the same request always yields the same
//! series and different symbols yield different ones.

use chrono::NaiveDateTime;
use crossover_core::{PriceSeries, TimeSeries};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::provider::{DataError, DataSource, FetchRequest, PriceProvider};

const START_PRICE: f64 = 100.0;
const MAX_STEP_RETURN: f64 = 0.03;

#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticProvider;

impl SyntheticProvider {
    pub fn new() -> Self {
        Self
    }

    fn seed_for(symbol: &str) -> u64 {
        let hash = blake3::hash(symbol.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }
}

impl PriceProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch(&self, request: &FetchRequest) -> Result<PriceSeries, DataError> {
        let start = request.start.and_time(chrono::NaiveTime::default());
        let end = request
            .end
            .and_hms_opt(23, 59, 59)
            .ok_or_else(|| DataError::Other(format!("invalid end date {}", request.end)))?;
        let step = request.interval.step();

        let mut rng = StdRng::seed_from_u64(Self::seed_for(&request.symbol));
        let mut index: Vec<NaiveDateTime> = Vec::new();
        let mut values = Vec::new();
        let mut price = START_PRICE;
        let mut at = start;
        while at <= end {
            index.push(at);
            values.push(price);
            price *= 1.0 + rng.gen_range(-MAX_STEP_RETURN..MAX_STEP_RETURN);
            at += step;
        }

        if index.is_empty() {
            return Err(DataError::NoData {
                symbol: request.symbol.clone(),
                start: request.start,
                end: request.end,
            });
        }
        debug!(symbol = %request.symbol, periods = index.len(), "generated synthetic prices");
        Ok(TimeSeries::new(index, values)?)
    }
}

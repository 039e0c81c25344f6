//! Domain types: the timestamped series container and holding states.

pub mod holding;
pub mod series;

pub use holding::{Holding, PositionChange};
pub use series::{daily_series, PriceSeries, TimeSeries};

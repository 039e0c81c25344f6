//! Price acquisition: the provider trait and its implementations.

pub mod csv_file;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use csv_file::{read_prices, write_prices_csv, CsvProvider};
pub use provider::{DataError, DataSource, FetchRequest, PriceProvider};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;

//! CSV price files.
//!
//! Reads any CSV with a header containing a timestamp column (`date`,
//! `datetime` or `timestamp`) and a price column (`close`, `adj_close` or
//! `price`), matched case-insensitively. This covers files exported from
//! Yahoo Finance as well as the files written by [`write_prices_csv`].
//!
//! Empty, `null` or `NaN` prices are kept as NaN; the backtest reports them
//! as undefined values instead of silently compounding through them.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use crossover_core::{PriceSeries, TimeSeries};
use tracing::debug;

use super::provider::{DataError, DataSource, FetchRequest, PriceProvider};

const TIMESTAMP_COLUMNS: [&str; 3] = ["timestamp", "datetime", "date"];
const PRICE_COLUMNS: [&str; 4] = ["close", "adj_close", "adj close", "price"];

/// Reads prices from a local CSV file.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse a timestamp in any of the layouts price files commonly use.
///
/// A bare date is midnight of that day.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    // Yahoo exports carry an offset suffix, e.g. "2022-01-01 00:00:00+00:00".
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.naive_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(chrono::NaiveTime::default()))
}

fn parse_price(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") || raw.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    raw.parse::<f64>().ok()
}

fn find_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|want| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(want))
    })
}

/// Read every row of a price CSV from any reader.
pub fn read_prices<R: std::io::Read>(reader: R) -> Result<PriceSeries, DataError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();

    let ts_col = find_column(&headers, &TIMESTAMP_COLUMNS).ok_or_else(|| {
        DataError::Other(format!(
            "no timestamp column (expected one of {TIMESTAMP_COLUMNS:?})"
        ))
    })?;
    let price_col = find_column(&headers, &PRICE_COLUMNS).ok_or_else(|| {
        DataError::Other(format!("no price column (expected one of {PRICE_COLUMNS:?})"))
    })?;

    let mut index = Vec::new();
    let mut values = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let row = i + 2;
        let raw_ts = record.get(ts_col).unwrap_or_default();
        let ts = parse_timestamp(raw_ts).ok_or_else(|| DataError::MalformedRow {
            row,
            reason: format!("unparseable timestamp '{raw_ts}'"),
        })?;
        let raw_price = record.get(price_col).unwrap_or_default();
        let price = parse_price(raw_price).ok_or_else(|| DataError::MalformedRow {
            row,
            reason: format!("unparseable price '{raw_price}'"),
        })?;
        index.push(ts);
        values.push(price);
    }

    Ok(TimeSeries::new(index, values)?)
}

/// Write a price series as `timestamp,close` rows.
pub fn write_prices_csv<W: Write>(writer: W, prices: &PriceSeries) -> Result<(), DataError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["timestamp", "close"])?;
    for (ts, price) in prices.iter() {
        wtr.write_record([
            ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            price.to_string(),
        ])?;
    }
    wtr.flush().map_err(|source| DataError::Io {
        path: "<csv writer>".into(),
        source,
    })?;
    Ok(())
}

impl PriceProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_file"
    }

    fn source(&self) -> DataSource {
        DataSource::CsvFile
    }

    /// The symbol is not checked: a CSV file holds one instrument. The
    /// interval is whatever the file was sampled at.
    fn fetch(&self, request: &FetchRequest) -> Result<PriceSeries, DataError> {
        let file = std::fs::File::open(&self.path).map_err(|source| DataError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        let all = read_prices(file)?;

        let in_range: Vec<(NaiveDateTime, f64)> = all
            .iter()
            .filter(|(ts, _)| {
                let day = ts.date();
                day >= request.start && day <= request.end
            })
            .map(|(ts, p)| (ts, *p))
            .collect();

        debug!(
            path = %self.path.display(),
            rows = all.len(),
            in_range = in_range.len(),
            "read price file"
        );

        if in_range.is_empty() {
            return Err(DataError::NoData {
                symbol: request.symbol.clone(),
                start: request.start,
                end: request.end,
            });
        }
        Ok(TimeSeries::from_points(in_range)?)
    }
}

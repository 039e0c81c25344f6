//! Yahoo Finance price provider.
//!
//! Fetches close prices from Yahoo's v8 chart API at any supported interval.
//! Handles rate limiting, retries with exponential backoff, and response
//! parsing.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.
//! The CSV provider is the fallback when Yahoo is unavailable.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use crossover_core::{PriceSeries, TimeSeries};
use serde::Deserialize;
use tracing::{info, warn};

use super::provider::{DataError, DataSource, FetchRequest, PriceProvider};
use crate::config::Interval;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    close: Vec<Option<f64>>,
}

/// Yahoo Finance price provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Build the chart API URL for a symbol, date range and interval.
    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate, interval: Interval) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::default()).and_utc().timestamp();
        // End is inclusive: ask for everything up to the start of the next day.
        let end_ts = end
            .succ_opt()
            .unwrap_or(end)
            .and_time(chrono::NaiveTime::default())
            .and_utc()
            .timestamp();
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval={interval}"
        )
    }

    /// Parse the chart API response into a price series.
    ///
    /// Periods without a close (holidays, the still-open current bar) are
    /// skipped, as are timestamps that do not advance.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<PriceSeries, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let timestamps = data
            .timestamp
            .ok_or_else(|| DataError::ResponseFormatChanged("no timestamps".into()))?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut index: Vec<NaiveDateTime> = Vec::with_capacity(timestamps.len());
        let mut closes = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let at = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let Some(close) = quote.close.get(i).copied().flatten() else {
                continue;
            };

            if index.last().is_some_and(|prev| at <= *prev) {
                warn!(%symbol, timestamp = %at, "skipping non-advancing timestamp");
                continue;
            }

            index.push(at);
            closes.push(close);
        }

        if index.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        Ok(TimeSeries::new(index, closes)?)
    }

    /// Execute a single HTTP request with retry logic.
    fn fetch_with_retry(&self, request: &FetchRequest) -> Result<PriceSeries, DataError> {
        let symbol = request.symbol.as_str();
        let url = Self::chart_url(symbol, request.start, request.end, request.interval);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                warn!(%symbol, attempt, ?delay, "retrying Yahoo request");
                std::thread::sleep(delay);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }

                    if status.is_server_error() {
                        last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    if !status.is_success() {
                        return Err(DataError::Other(format!("HTTP {status} for {symbol}")));
                    }

                    let chart: ChartResponse = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {symbol}: {e}"
                        ))
                    })?;

                    return Self::parse_response(symbol, chart);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl PriceProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn source(&self) -> DataSource {
        DataSource::YahooFinance
    }

    fn fetch(&self, request: &FetchRequest) -> Result<PriceSeries, DataError> {
        info!(
            symbol = %request.symbol,
            start = %request.start,
            end = %request.end,
            interval = %request.interval,
            "fetching from Yahoo Finance"
        );
        let prices = self.fetch_with_retry(request)?;
        info!(symbol = %request.symbol, periods = prices.len(), "fetched prices");
        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<PriceSeries, DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response("BTC-USD", resp)
    }

    #[test]
    fn parses_closes_and_skips_nulls() {
        let prices = parse(
            r#"{"chart":{"result":[{
                "timestamp":[1640995200,1641081600,1641168000,1641254400],
                "indicators":{"quote":[{"close":[47686.8,null,46458.1,45897.5]}]}
            }],"error":null}}"#,
        )
        .unwrap();

        assert_eq!(prices.values(), &[47686.8, 46458.1, 45897.5]);
        assert_eq!(
            prices.index()[0],
            NaiveDate::from_ymd_opt(2022, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn drops_repeated_timestamps() {
        let prices = parse(
            r#"{"chart":{"result":[{
                "timestamp":[1640995200,1641081600,1641081600],
                "indicators":{"quote":[{"close":[1.0,2.0,2.5]}]}
            }],"error":null}}"#,
        )
        .unwrap();
        assert_eq!(prices.values(), &[1.0, 2.0]);
    }

    #[test]
    fn not_found_error() {
        let err = parse(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn other_api_error_is_format_change() {
        let err = parse(
            r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));
    }

    #[test]
    fn all_null_closes_is_not_found() {
        let err = parse(
            r#"{"chart":{"result":[{
                "timestamp":[1640995200],
                "indicators":{"quote":[{"close":[null]}]}
            }],"error":null}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn chart_url_carries_interval_and_inclusive_end() {
        let url = YahooProvider::chart_url(
            "BTC-USD",
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            Interval::Hour1,
        );
        assert!(url.contains("/chart/BTC-USD?"));
        assert!(url.contains("period1=1640995200"));
        assert!(url.contains("period2=1641081600"));
        assert!(url.ends_with("interval=1h"));
    }
}

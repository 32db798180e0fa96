//! CoinMarketCap Pro API client
//!
//! API Endpoints used:
//! - /cryptocurrency/quotes/historical - Daily quotes over a window
//! - /cryptocurrency/quotes/latest - Current quote
//!
//! Every request sends the `X-CMC_PRO_API_KEY` header. A 2xx body may still
//! carry an error in `status.error_code`.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use super::resolver;
use super::source::MarketSource;
use super::types::*;
use crate::config::{CMC_API_KEY_ENV, HISTORY_TIMEOUT, QUOTE_TIMEOUT};
use crate::error::{FetchError, FetchResult};
use crate::utils::{get_json_f64, get_json_i64, get_json_string, HttpClient};
use crate::{log_debug, log_info};

pub const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";
pub const CONVERT: &str = "USD";
/// Only daily history is requested
pub const HISTORY_INTERVAL: &str = "1d";

/// Timestamp format for `time_start` / `time_end`
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.000Z";

/// CoinMarketCap API client
#[derive(Clone)]
pub struct CoinMarketCapClient {
    pub base_url: String,
    api_key: String,
    http: HttpClient,
}

impl std::fmt::Debug for CoinMarketCapClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoinMarketCapClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl CoinMarketCapClient {
    /// Fails with a configuration error when no key is available
    pub fn new(base_url: &str, api_key: Option<&str>) -> FetchResult<Self> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                FetchError::config(format!(
                    "CoinMarketCap API key is required. Set {} environment variable or pass --api-key",
                    CMC_API_KEY_ENV
                ))
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http: HttpClient::new()?,
        })
    }

    fn get(&self, path: &str, query: &[(&str, String)], timeout: std::time::Duration) -> FetchResult<Value> {
        let url = format!("{}/{}", self.base_url, path);
        log_debug!("coinmarketcap", "GET", path = path, api_key = self.api_key);

        let headers = [(API_KEY_HEADER, self.api_key.as_str()), ("Accept", "application/json")];
        let json = self.http.get_json(&url, query, &headers, Some(timeout))?;
        check_status(&json)?;
        Ok(json)
    }

    /// Daily quotes between `start` and `end`
    pub fn fetch_historical(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FetchResult<Vec<Candle>> {
        let params = [
            ("symbol", symbol.to_string()),
            ("time_start", format_time(start)),
            ("time_end", format_time(end)),
            ("interval", HISTORY_INTERVAL.to_string()),
            ("convert", CONVERT.to_string()),
        ];

        let json = self
            .get("cryptocurrency/quotes/historical", &params, HISTORY_TIMEOUT)
            .map_err(|e| e.context("Failed to fetch CMC data"))?;
        let candles = parse_historical(&json)?;

        log_info!("coinmarketcap", "Fetched quotes", symbol = symbol, rows = candles.len());
        Ok(candles)
    }

    /// Latest quote for `symbol`
    pub fn fetch_latest(&self, symbol: &str) -> FetchResult<MarketSummary> {
        let params = [("symbol", symbol.to_string()), ("convert", CONVERT.to_string())];
        let json = self
            .get("cryptocurrency/quotes/latest", &params, QUOTE_TIMEOUT)
            .map_err(|e| e.context("Failed to fetch CMC quote"))?;
        parse_latest(&json, symbol)
    }
}

impl MarketSource for CoinMarketCapClient {
    fn kind(&self) -> SourceKind {
        SourceKind::CoinMarketCap
    }

    fn resolve_identifier(&self, input: &str) -> FetchResult<String> {
        Ok(resolver::cmc_symbol(input))
    }

    fn fetch_candles(&self, identifier: &str, query: &CandleQuery) -> FetchResult<Vec<Candle>> {
        let (start, end) = match (query.start, query.end) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(FetchError::invalid_input(
                    "CoinMarketCap requires both a start date and an end date",
                ))
            }
        };
        self.fetch_historical(identifier, start, end)
    }

    fn fetch_summary_stats(&self, identifier: &str) -> FetchResult<MarketSummary> {
        self.fetch_latest(identifier)
    }

    fn summary_is_optional(&self) -> bool {
        true
    }
}

pub fn format_time(ts: DateTime<Utc>) -> String {
    ts.format(TIME_FORMAT).to_string()
}

/// Window covering whole calendar days: `[start 00:00:00, end 23:59:59]`
pub fn day_window(range: &DateRange) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    match (range.start, range.end) {
        (Some(start), Some(end)) => Some((start, end)),
        (Some(start), None) => Some((start, start + Duration::days(1) - Duration::seconds(1))),
        _ => None,
    }
}

/// Turn a non-zero `status.error_code` into an API error
pub fn check_status(json: &Value) -> FetchResult<()> {
    let Some(status) = json.get("status") else {
        return Ok(());
    };
    let code = get_json_i64(status, "error_code").unwrap_or(0);
    if code != 0 {
        let message = get_json_string(status, "error_message").unwrap_or_else(|| "unknown error".to_string());
        return Err(FetchError::api_error(format!("CMC API error: {}", message))
            .with_details(format!("error_code {}", code)));
    }
    Ok(())
}

/// Parse `data.quotes[]`; open/high/low fall back to the price
pub fn parse_historical(json: &Value) -> FetchResult<Vec<Candle>> {
    let quotes = json
        .get("data")
        .and_then(|d| d.get("quotes"))
        .and_then(|q| q.as_array())
        .ok_or_else(|| FetchError::parse_error("historical response has no 'data.quotes' array"))?;

    if quotes.is_empty() {
        return Err(FetchError::no_data("No data returned from CoinMarketCap"));
    }

    quotes
        .iter()
        .enumerate()
        .map(|(index, quote)| {
            let raw_ts = get_json_string(quote, "timestamp")
                .ok_or_else(|| FetchError::parse_error(format!("quote {} has no timestamp", index)))?;
            let timestamp = DateTime::parse_from_rfc3339(&raw_ts)
                .map_err(|e| FetchError::parse_error(format!("quote {} timestamp '{}': {}", index, raw_ts, e)))?
                .with_timezone(&Utc);

            let usd = quote
                .get("quote")
                .and_then(|q| q.get(CONVERT))
                .ok_or_else(|| FetchError::parse_error(format!("quote {} has no USD quote", index)))?;
            let price = get_json_f64(usd, "price")
                .ok_or_else(|| FetchError::parse_error(format!("quote {} has no price", index)))?;

            Ok(Candle::new(
                timestamp,
                get_json_f64(usd, "open").unwrap_or(price),
                get_json_f64(usd, "high").unwrap_or(price),
                get_json_f64(usd, "low").unwrap_or(price),
                price,
            )
            .with_volume(get_json_f64(usd, "volume_24h").unwrap_or(0.0)))
        })
        .collect()
}

/// Parse `data[symbol]` of a latest-quote response
pub fn parse_latest(json: &Value, symbol: &str) -> FetchResult<MarketSummary> {
    let coin = json
        .get("data")
        .and_then(|d| d.get(symbol))
        .ok_or_else(|| FetchError::no_data(format!("No quote for {}", symbol)))?;
    let usd = coin
        .get("quote")
        .and_then(|q| q.get(CONVERT))
        .ok_or_else(|| FetchError::parse_error(format!("No USD quote for {}", symbol)))?;

    Ok(MarketSummary {
        name: get_json_string(coin, "name").unwrap_or_else(|| symbol.to_string()),
        symbol: get_json_string(coin, "symbol").unwrap_or_else(|| symbol.to_string()),
        current_price: get_json_f64(usd, "price")
            .ok_or_else(|| FetchError::parse_error(format!("No price for {}", symbol)))?,
        price_change_24h: get_json_f64(usd, "price_change_24h"),
        price_change_pct_24h: get_json_f64(usd, "percent_change_24h"),
        volume_24h: get_json_f64(usd, "volume_24h"),
        market_cap: get_json_f64(usd, "market_cap"),
        ..MarketSummary::default()
    })
}

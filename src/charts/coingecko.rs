//! CoinGecko API client for price data
//!
//! API Endpoints used:
//! - /coins/{id}/ohlc - Candlestick data (no volume)
//! - /coins/{id}/market_chart - Volume series merged onto the candles
//! - /coins/{id} - Coin metadata and 24h market data
//! - /simple/price - Standalone price lookup (not part of the summary)
//! - /search - Coin id lookup for unknown tickers

use chrono::Duration;
use serde_json::Value;

use super::calculator::{MetricsCalculator, VOLUME_MERGE_TOLERANCE_SECS};
use super::resolver;
use super::source::MarketSource;
use super::types::*;
use crate::config::{HISTORY_TIMEOUT, QUOTE_TIMEOUT};
use crate::error::{FetchError, FetchResult};
use crate::utils::{as_f64_lenient, get_json_f64, get_json_string, path_segment, row_f64, HttpClient};
use crate::{log_debug, log_info, log_warn};

/// Quote currency for every request
pub const VS_CURRENCY: &str = "usd";

/// CoinGecko API client
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    /// API base URL
    pub base_url: String,
    /// Ask `/search` when local resolution fails
    pub search_enabled: bool,
    http: HttpClient,
}

impl CoinGeckoClient {
    pub fn new(base_url: &str) -> FetchResult<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            search_enabled: true,
            http: HttpClient::new()?,
        })
    }

    pub fn with_search(mut self, enabled: bool) -> Self {
        self.search_enabled = enabled;
        self
    }

    /// GET /coins/{id}/ohlc
    pub fn ohlc_url(&self, coin_id: &str) -> String {
        format!("{}/coins/{}/ohlc", self.base_url, path_segment(coin_id))
    }

    /// GET /coins/{id}/market_chart
    pub fn market_chart_url(&self, coin_id: &str) -> String {
        format!("{}/coins/{}/market_chart", self.base_url, path_segment(coin_id))
    }

    /// GET /coins/{id}
    pub fn coin_info_url(&self, coin_id: &str) -> String {
        format!("{}/coins/{}", self.base_url, path_segment(coin_id))
    }

    /// GET /simple/price
    pub fn simple_price_url(&self) -> String {
        format!("{}/simple/price", self.base_url)
    }

    /// GET /search
    pub fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }

    fn history_params(days: CoinGeckoDays) -> Vec<(&'static str, String)> {
        vec![("vs_currency", VS_CURRENCY.to_string()), ("days", days.as_param())]
    }

    /// Candles for `days`, with volumes joined from the market chart
    pub fn fetch_ohlc(&self, coin_id: &str, days: CoinGeckoDays) -> FetchResult<Vec<Candle>> {
        log_debug!("coingecko", "Fetching OHLC", coin_id = coin_id, days = days);
        let json = self
            .http
            .get_json(&self.ohlc_url(coin_id), &Self::history_params(days), &[], Some(HISTORY_TIMEOUT))
            .map_err(|e| e.context("Failed to fetch OHLC data"))?;
        let mut candles = parse_ohlc(&json)?;

        let volumes = self.fetch_volumes(coin_id, days)?;
        MetricsCalculator::merge_volumes_asof(
            &mut candles,
            &volumes,
            Duration::seconds(VOLUME_MERGE_TOLERANCE_SECS),
        );

        log_info!("coingecko", "Fetched OHLC", coin_id = coin_id, rows = candles.len(), volume_points = volumes.len());
        Ok(candles)
    }

    /// `total_volumes` series of the market chart
    pub fn fetch_volumes(&self, coin_id: &str, days: CoinGeckoDays) -> FetchResult<Vec<VolumePoint>> {
        let json = self
            .http
            .get_json(
                &self.market_chart_url(coin_id),
                &Self::history_params(days),
                &[],
                Some(HISTORY_TIMEOUT),
            )
            .map_err(|e| e.context("Failed to fetch volume data"))?;
        parse_market_chart_volumes(&json)
    }

    /// GET /coins/{id} market data
    pub fn fetch_market_data(&self, coin_id: &str) -> FetchResult<MarketSummary> {
        let params = [
            ("localization", "false".to_string()),
            ("tickers", "false".to_string()),
            ("market_data", "true".to_string()),
            ("community_data", "false".to_string()),
            ("developer_data", "false".to_string()),
            ("sparkline", "false".to_string()),
        ];
        let json = self
            .http
            .get_json(&self.coin_info_url(coin_id), &params, &[], Some(QUOTE_TIMEOUT))
            .map_err(|e| e.context("Failed to fetch market data"))?;
        Ok(parse_market_data(&json))
    }

    /// GET /simple/price for one coin
    pub fn fetch_simple_price(&self, coin_id: &str) -> FetchResult<SimplePrice> {
        let params = [
            ("ids", coin_id.to_string()),
            ("vs_currencies", VS_CURRENCY.to_string()),
            ("include_24hr_change", "true".to_string()),
            ("include_24hr_vol", "true".to_string()),
        ];
        let json = self
            .http
            .get_json(&self.simple_price_url(), &params, &[], Some(QUOTE_TIMEOUT))
            .map_err(|e| e.context("Failed to fetch current price"))?;
        parse_simple_price(&json, coin_id)
    }

    /// First coin id `/search` returns for `query`
    pub fn search_coin_id(&self, query: &str) -> FetchResult<Option<String>> {
        let json = self.http.get_json(
            &self.search_url(),
            &[("query", query.to_string())],
            &[],
            Some(QUOTE_TIMEOUT),
        )?;
        Ok(parse_search(&json))
    }
}

impl MarketSource for CoinGeckoClient {
    fn kind(&self) -> SourceKind {
        SourceKind::CoinGecko
    }

    fn resolve_identifier(&self, input: &str) -> FetchResult<String> {
        if let Some(id) = resolver::coingecko_static_id(input) {
            return Ok(id);
        }

        if self.search_enabled {
            let term = resolver::coingecko_search_term(input);
            match self.search_coin_id(&term) {
                Ok(Some(id)) => {
                    log_debug!("coingecko", "Resolved via search", query = term, coin_id = id);
                    return Ok(id);
                }
                Ok(None) => log_debug!("coingecko", "Search returned no coins", query = term),
                Err(e) => log_warn!("coingecko", "Search failed, guessing coin id", error = e),
            }
        }

        Ok(resolver::coingecko_guess(input))
    }

    fn fetch_candles(&self, identifier: &str, query: &CandleQuery) -> FetchResult<Vec<Candle>> {
        self.fetch_ohlc(identifier, query.days.unwrap_or_default())
    }

    /// `/coins/{id}` only; a failure there fails the run
    fn fetch_summary_stats(&self, identifier: &str) -> FetchResult<MarketSummary> {
        self.fetch_market_data(identifier)
    }
}

/// Parse `/ohlc`: `[[timestamp, open, high, low, close], ...]`
pub fn parse_ohlc(json: &Value) -> FetchResult<Vec<Candle>> {
    let rows = json
        .as_array()
        .ok_or_else(|| FetchError::parse_error("OHLC response is not an array"))?;

    if rows.is_empty() {
        return Err(FetchError::no_data("No data returned from CoinGecko"));
    }

    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let row = row
                .as_array()
                .filter(|r| r.len() >= 5)
                .ok_or_else(|| FetchError::parse_error(format!("OHLC row {} is malformed", index)))?;
            Ok(Candle::new(
                from_millis(row_f64(row, 0)? as i64)?,
                row_f64(row, 1)?,
                row_f64(row, 2)?,
                row_f64(row, 3)?,
                row_f64(row, 4)?,
            ))
        })
        .collect()
}

/// Parse `total_volumes` from `/market_chart`; a missing series is empty
pub fn parse_market_chart_volumes(json: &Value) -> FetchResult<Vec<VolumePoint>> {
    let Some(points) = json.get("total_volumes").and_then(|v| v.as_array()) else {
        return Ok(Vec::new());
    };

    let mut volumes = Vec::with_capacity(points.len());
    for point in points {
        if let Some(arr) = point.as_array().filter(|a| a.len() >= 2) {
            let timestamp = from_millis(row_f64(arr, 0)? as i64)?;
            let volume = row_f64(arr, 1).unwrap_or(0.0);
            volumes.push(VolumePoint::new(timestamp, volume));
        }
    }
    Ok(volumes)
}

fn usd(market_data: Option<&Value>, field: &str) -> Option<f64> {
    market_data
        .and_then(|m| m.get(field))
        .and_then(|p| p.get(VS_CURRENCY))
        .and_then(as_f64_lenient)
}

/// Parse `/coins/{id}` into a summary
pub fn parse_market_data(json: &Value) -> MarketSummary {
    let market_data = json.get("market_data");

    MarketSummary {
        name: get_json_string(json, "name").unwrap_or_default(),
        symbol: get_json_string(json, "symbol").unwrap_or_default().to_uppercase(),
        current_price: usd(market_data, "current_price").unwrap_or(0.0),
        price_change_24h: market_data.and_then(|m| get_json_f64(m, "price_change_24h")),
        price_change_pct_24h: market_data.and_then(|m| get_json_f64(m, "price_change_percentage_24h")),
        high_24h: usd(market_data, "high_24h"),
        low_24h: usd(market_data, "low_24h"),
        volume_24h: usd(market_data, "total_volume"),
        quote_volume_24h: None,
        trades_24h: None,
        market_cap: usd(market_data, "market_cap"),
    }
}

/// Parse `/simple/price`, which is keyed by coin id
pub fn parse_simple_price(json: &Value, coin_id: &str) -> FetchResult<SimplePrice> {
    let entry = json
        .get(coin_id)
        .ok_or_else(|| FetchError::no_data(format!("Coin {} not found", coin_id)))?;

    Ok(SimplePrice {
        usd: get_json_f64(entry, VS_CURRENCY)
            .ok_or_else(|| FetchError::parse_error(format!("No USD price for {}", coin_id)))?,
        usd_24h_change: get_json_f64(entry, "usd_24h_change"),
        usd_24h_vol: get_json_f64(entry, "usd_24h_vol"),
    })
}

/// First coin id in a `/search` response
pub fn parse_search(json: &Value) -> Option<String> {
    json.get("coins")
        .and_then(|c| c.as_array())
        .and_then(|coins| coins.first())
        .and_then(|coin| get_json_string(coin, "id"))
}

//! Binance spot API client
//!
//! API Endpoints used:
//! - /exchangeInfo - Tradable symbol listing
//! - /klines - Candlestick data (12-column rows, prices as strings)
//! - /ticker/price - Last trade price
//! - /ticker/24hr - Rolling 24h window statistics
//!
//! Requests carry no explicit timeout.

use serde_json::Value;

use super::resolver;
use super::source::MarketSource;
use super::types::*;
use crate::error::{FetchError, FetchResult};
use crate::utils::{extract_domain, get_json_f64, get_json_i64, get_json_string, require_json_f64, row_f64, HttpClient};
use crate::{log_debug, log_info};

/// Intervals accepted by `/klines`
pub const KLINE_INTERVALS: &[&str] = &[
    "1s", "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w", "1M",
];

pub const DEFAULT_INTERVAL: &str = "5m";
pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_KLINE_LIMIT: u32 = 1000;
pub const DEFAULT_QUOTE_ASSET: &str = "USDT";

/// Binance API client
#[derive(Debug, Clone)]
pub struct BinanceClient {
    /// API base URL (ends in `/api/v3`)
    pub base_url: String,
    http: HttpClient,
}

impl BinanceClient {
    pub fn new(base_url: &str) -> FetchResult<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: HttpClient::new()?,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn get(&self, path: &str, query: &[(&str, String)]) -> FetchResult<Value> {
        let url = self.endpoint(path);
        log_debug!("binance", "GET", host = extract_domain(&url), path = path);
        self.http.get_json(&url, query, &[], None)
    }

    /// Trading symbols quoted in `quote_asset` with status TRADING, first `limit`
    pub fn fetch_symbols(&self, quote_asset: &str, limit: usize) -> FetchResult<Vec<String>> {
        let json = self
            .get("exchangeInfo", &[])
            .map_err(|e| e.context("Failed to fetch symbols"))?;
        parse_exchange_symbols(&json, quote_asset, limit)
    }

    /// GET /klines?symbol={symbol}&interval={interval}&limit={limit}
    pub fn fetch_klines(&self, symbol: &str, interval: &str, limit: u32) -> FetchResult<Vec<Candle>> {
        validate_interval(interval)?;
        let limit = clamp_limit(limit);

        let json = self
            .get(
                "klines",
                &[
                    ("symbol", symbol.to_uppercase()),
                    ("interval", interval.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .map_err(|e| e.context("Failed to fetch data"))?;

        let candles = parse_klines(&json)?;
        log_info!("binance", "Fetched klines", symbol = symbol, interval = interval, rows = candles.len());
        Ok(candles)
    }

    /// GET /ticker/price?symbol={symbol}
    pub fn fetch_price(&self, symbol: &str) -> FetchResult<f64> {
        let json = self
            .get("ticker/price", &[("symbol", symbol.to_uppercase())])
            .map_err(|e| e.context("Failed to fetch current price"))?;
        require_json_f64(&json, "price")
    }

    /// GET /ticker/24hr?symbol={symbol}
    pub fn fetch_24h_stats(&self, symbol: &str) -> FetchResult<Ticker24h> {
        let json = self
            .get("ticker/24hr", &[("symbol", symbol.to_uppercase())])
            .map_err(|e| e.context("Failed to fetch 24h stats"))?;
        parse_ticker_24h(&json)
    }
}

impl MarketSource for BinanceClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Binance
    }

    fn resolve_identifier(&self, input: &str) -> FetchResult<String> {
        Ok(resolver::binance_symbol(input))
    }

    fn fetch_candles(&self, identifier: &str, query: &CandleQuery) -> FetchResult<Vec<Candle>> {
        let interval = query.interval.as_deref().unwrap_or(DEFAULT_INTERVAL);
        self.fetch_klines(identifier, interval, query.limit.unwrap_or(DEFAULT_LIMIT))
    }

    /// `/ticker/24hr` only; callers wanting the live trade price use
    /// [`BinanceClient::fetch_price`].
    fn fetch_summary_stats(&self, identifier: &str) -> FetchResult<MarketSummary> {
        let stats = self.fetch_24h_stats(identifier)?;
        Ok(summary_from_ticker(identifier, &stats))
    }
}

/// Reject intervals Binance would refuse, before any request is made
pub fn validate_interval(interval: &str) -> FetchResult<()> {
    if KLINE_INTERVALS.contains(&interval) {
        Ok(())
    } else {
        Err(FetchError::invalid_input(format!(
            "Unsupported interval '{}'. Supported intervals: {}",
            interval,
            KLINE_INTERVALS.join(", ")
        )))
    }
}

/// Keep the candle count within what `/klines` serves in one call
pub fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_KLINE_LIMIT)
}

/// Parse the `/exchangeInfo` symbol listing
pub fn parse_exchange_symbols(json: &Value, quote_asset: &str, limit: usize) -> FetchResult<Vec<String>> {
    let symbols = json
        .get("symbols")
        .and_then(|v| v.as_array())
        .ok_or_else(|| FetchError::parse_error("exchangeInfo response has no 'symbols' array"))?;

    Ok(symbols
        .iter()
        .filter(|s| get_json_string(s, "status").as_deref() == Some("TRADING"))
        .filter_map(|s| get_json_string(s, "symbol"))
        .filter(|name| name.ends_with(quote_asset))
        .take(limit)
        .collect())
}

/// Parse `/klines` rows:
/// `[open_time, open, high, low, close, volume, close_time, quote_volume,
///   trades, taker_buy_base, taker_buy_quote, ignore]`
pub fn parse_klines(json: &Value) -> FetchResult<Vec<Candle>> {
    let rows = json
        .as_array()
        .ok_or_else(|| FetchError::parse_error("klines response is not an array"))?;

    let mut candles = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let row = row
            .as_array()
            .filter(|r| r.len() >= 11)
            .ok_or_else(|| FetchError::parse_error(format!("kline row {} is malformed", index)))?;

        let open_time = row
            .first()
            .and_then(Value::as_i64)
            .ok_or_else(|| FetchError::parse_error(format!("kline row {} has no open time", index)))?;
        let close_time = row
            .get(6)
            .and_then(Value::as_i64)
            .ok_or_else(|| FetchError::parse_error(format!("kline row {} has no close time", index)))?;

        let mut candle = Candle::new(
            from_millis(open_time)?,
            row_f64(row, 1)?,
            row_f64(row, 2)?,
            row_f64(row, 3)?,
            row_f64(row, 4)?,
        )
        .with_volume(row_f64(row, 5)?);

        candle.extras = Some(KlineExtras {
            close_time: from_millis(close_time)?,
            quote_volume: row_f64(row, 7)?,
            trades: row_f64(row, 8)? as u64,
            taker_buy_base: row_f64(row, 9)?,
            taker_buy_quote: row_f64(row, 10)?,
        });
        candles.push(candle);
    }

    Ok(candles)
}

/// Parse `/ticker/24hr`
pub fn parse_ticker_24h(json: &Value) -> FetchResult<Ticker24h> {
    Ok(Ticker24h {
        last_price: get_json_f64(json, "lastPrice"),
        price_change: require_json_f64(json, "priceChange")?,
        price_change_pct: require_json_f64(json, "priceChangePercent")?,
        high: require_json_f64(json, "highPrice")?,
        low: require_json_f64(json, "lowPrice")?,
        volume: require_json_f64(json, "volume")?,
        quote_volume: require_json_f64(json, "quoteVolume")?,
        trades: get_json_i64(json, "count")
            .ok_or_else(|| FetchError::parse_error("missing or non-numeric field 'count'"))?
            .max(0) as u64,
    })
}

/// Summary from the 24h window; the current price is `lastPrice` (NaN when absent)
pub fn summary_from_ticker(symbol: &str, stats: &Ticker24h) -> MarketSummary {
    MarketSummary {
        name: symbol.to_string(),
        symbol: symbol.to_string(),
        current_price: stats.last_price.unwrap_or(f64::NAN),
        price_change_24h: Some(stats.price_change),
        price_change_pct_24h: Some(stats.price_change_pct),
        high_24h: Some(stats.high),
        low_24h: Some(stats.low),
        volume_24h: Some(stats.volume),
        quote_volume_24h: Some(stats.quote_volume),
        trades_24h: Some(stats.trades),
        market_cap: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::pipeline::{self, PipelineRequest};
    use crate::utils::test_server::{route, TestServer};
    use serde_json::json;

    #[test]
    fn test_validate_interval() {
        assert!(validate_interval("5m").is_ok());
        assert!(validate_interval("1M").is_ok());
        let err = validate_interval("7m").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert!(err.message.contains("7m"));
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(50), 50);
        assert_eq!(clamp_limit(5000), 1000);
    }

    #[test]
    fn test_parse_klines() {
        let json = json!([
            [1704067200000i64, "42000.10", "42100.00", "41950.50", "42050.00", "12.5",
             1704067499999i64, "525625.00", 340, "6.1", "256500.00", "0"],
            [1704067500000i64, "42050.00", "42200.00", "42000.00", "42180.25", "8.25",
             1704067799999i64, "347000.00", 210, "4.0", "168400.00", "0"]
        ]);

        let candles = parse_klines(&json).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open, 42000.10);
        assert_eq!(candles[0].volume, Some(12.5));
        assert_eq!(candles[0].timestamp.to_rfc3339(), "2024-01-01T00:00:00+00:00");

        let extras = candles[1].extras.as_ref().unwrap();
        assert_eq!(extras.trades, 210);
        assert_eq!(extras.quote_volume, 347000.0);
        assert_eq!(extras.close_time.timestamp_millis(), 1704067799999);
    }

    #[test]
    fn test_parse_klines_rejects_short_rows() {
        let json = json!([[1704067200000i64, "1", "2"]]);
        assert_eq!(parse_klines(&json).unwrap_err().code, ErrorCode::ParseError);
        assert!(parse_klines(&json!({"code": -1121})).is_err());
    }

    #[test]
    fn test_parse_exchange_symbols() {
        let json = json!({
            "symbols": [
                {"symbol": "BTCUSDT", "status": "TRADING"},
                {"symbol": "ETHBTC", "status": "TRADING"},
                {"symbol": "LUNAUSDT", "status": "BREAK"},
                {"symbol": "ETHUSDT", "status": "TRADING"},
                {"symbol": "BNBUSDT", "status": "TRADING"}
            ]
        });

        let symbols = parse_exchange_symbols(&json, "USDT", 2).unwrap();
        assert_eq!(symbols, vec!["BTCUSDT", "ETHUSDT"]);
    }

    #[test]
    fn test_parse_ticker_24h() {
        let json = json!({
            "symbol": "BTCUSDT",
            "lastPrice": "42010.00",
            "priceChange": "-120.50",
            "priceChangePercent": "-0.286",
            "highPrice": "42500.00",
            "lowPrice": "41800.00",
            "volume": "18000.123",
            "quoteVolume": "760000000.55",
            "count": 1250000
        });

        let stats = parse_ticker_24h(&json).unwrap();
        assert_eq!(stats.price_change, -120.5);
        assert_eq!(stats.trades, 1_250_000);

        let summary = summary_from_ticker("BTCUSDT", &stats);
        assert_eq!(summary.current_price, 42010.0);
        assert_eq!(summary.high_24h, Some(42500.0));
        assert_eq!(summary.market_cap, None);
    }

    fn kline_body() -> String {
        json!([
            [1704067200000i64, "42000.10", "42100.00", "41950.50", "42050.00", "12.5",
             1704067499999i64, "525625.00", 340, "6.1", "256500.00", "0"]
        ])
        .to_string()
    }

    fn ticker_body() -> String {
        json!({
            "lastPrice": "42050.00",
            "priceChange": "50.00",
            "priceChangePercent": "0.119",
            "highPrice": "42100.00",
            "lowPrice": "41950.50",
            "volume": "12.5",
            "quoteVolume": "525625.00",
            "count": 340
        })
        .to_string()
    }

    #[test]
    fn test_summary_does_not_need_ticker_price() {
        let server = TestServer::start(vec![
            route("/klines", 200, kline_body()),
            route("/ticker/24hr", 200, ticker_body()),
            route("/ticker/price", 503, "price service down"),
        ]);
        let client = BinanceClient::new(&server.base_url).unwrap();

        let report = pipeline::run(&client, &PipelineRequest::new("BTCUSDT", CandleQuery::default())).unwrap();

        assert_eq!(report.candles.len(), 1);
        assert_eq!(report.summary.current_price, 42050.0);
        assert_eq!(report.summary.trades_24h, Some(340));
        assert!(!report.summary_degraded);
        assert!(server.was_hit("/ticker/24hr"));
        assert!(!server.was_hit("/ticker/price"));
    }

    #[test]
    fn test_ticker_24h_failure_is_reported() {
        let server = TestServer::start(vec![
            route("/klines", 200, kline_body()),
            route("/ticker/24hr", 503, "stats down"),
        ]);
        let client = BinanceClient::new(&server.base_url).unwrap();

        let err = pipeline::run(&client, &PipelineRequest::new("BTCUSDT", CandleQuery::default())).unwrap_err();

        assert_eq!(err.code, ErrorCode::UpstreamStatus);
        assert_eq!(err.message, "Failed to fetch 24h stats: 503 - stats down");
    }
}

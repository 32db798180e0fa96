//! Candle, aggregate and quote types shared by every market source

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{FetchError, FetchResult};

/// Upstream data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Binance,
    CoinGecko,
    CoinMarketCap,
}

impl SourceKind {
    pub fn display_name(&self) -> &str {
        match self {
            SourceKind::Binance => "Binance",
            SourceKind::CoinGecko => "CoinGecko",
            SourceKind::CoinMarketCap => "CoinMarketCap",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Convert epoch milliseconds to a UTC instant
pub fn from_millis(ms: i64) -> FetchResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| FetchError::parse_error(format!("timestamp out of range: {}", ms)))
}

/// Anything carrying one OHLC(V) bucket.
///
/// Daily aggregation is written against this trait so that it accepts raw
/// candles, enriched candles and already-aggregated days alike.
pub trait OhlcRow {
    fn timestamp(&self) -> DateTime<Utc>;
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> Option<f64>;

    /// Number of source candles this row stands for
    fn candle_count(&self) -> usize {
        1
    }
}

/// Extra kline columns only Binance reports
#[derive(Debug, Clone, PartialEq)]
pub struct KlineExtras {
    pub close_time: DateTime<Utc>,
    pub quote_volume: f64,
    pub trades: u64,
    pub taker_buy_base: f64,
    pub taker_buy_quote: f64,
}

/// OHLC candlestick
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    /// Bucket open time
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Absent when the source has no volume for this bucket
    pub volume: Option<f64>,
    pub extras: Option<KlineExtras>,
}

impl Candle {
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: None,
            extras: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Timestamp as epoch milliseconds
    pub fn time_ms(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

impl OhlcRow for Candle {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
    fn open(&self) -> f64 {
        self.open
    }
    fn high(&self) -> f64 {
        self.high
    }
    fn low(&self) -> f64 {
        self.low
    }
    fn close(&self) -> f64 {
        self.close
    }
    fn volume(&self) -> Option<f64> {
        self.volume
    }
}

/// Candle plus the per-row derived columns
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedCandle {
    pub candle: Candle,
    /// close - open
    pub price_change: f64,
    /// price_change / open * 100
    pub price_change_pct: f64,
    /// high - low
    pub high_low_range: f64,
    /// high_low_range / open * 100
    pub range_pct: f64,
}

impl OhlcRow for EnrichedCandle {
    fn timestamp(&self) -> DateTime<Utc> {
        self.candle.timestamp
    }
    fn open(&self) -> f64 {
        self.candle.open
    }
    fn high(&self) -> f64 {
        self.candle.high
    }
    fn low(&self) -> f64 {
        self.candle.low
    }
    fn close(&self) -> f64 {
        self.candle.close
    }
    fn volume(&self) -> Option<f64> {
        self.candle.volume
    }
}

/// Volume data point from a market-chart series
#[derive(Debug, Clone, PartialEq)]
pub struct VolumePoint {
    pub timestamp: DateTime<Utc>,
    pub volume: f64,
}

impl VolumePoint {
    pub fn new(timestamp: DateTime<Utc>, volume: f64) -> Self {
        Self { timestamp, volume }
    }
}

/// One calendar day (UTC) of aggregated candles
#[derive(Debug, Clone, PartialEq)]
pub struct DailyMove {
    pub date: NaiveDate,
    /// First candle's open
    pub open: f64,
    pub high: f64,
    pub low: f64,
    /// Last candle's close
    pub close: f64,
    /// Sum of candle volumes; missing volumes count as zero
    pub volume: f64,
    pub intraday_range: f64,
    pub intraday_range_pct: f64,
    pub open_close_move: f64,
    pub open_close_pct: f64,
    pub num_candles: usize,
}

impl OhlcRow for DailyMove {
    fn timestamp(&self) -> DateTime<Utc> {
        self.date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
    }
    fn open(&self) -> f64 {
        self.open
    }
    fn high(&self) -> f64 {
        self.high
    }
    fn low(&self) -> f64 {
        self.low
    }
    fn close(&self) -> f64 {
        self.close
    }
    fn volume(&self) -> Option<f64> {
        Some(self.volume)
    }
    fn candle_count(&self) -> usize {
        self.num_candles
    }
}

/// Mean/max/min statistics across a daily table
#[derive(Debug, Clone, PartialEq)]
pub struct MoveSummary {
    pub avg_intraday_range: f64,
    pub avg_intraday_range_pct: f64,
    pub avg_open_close_move: f64,
    pub avg_open_close_pct: f64,
    pub max_intraday_range: f64,
    pub max_intraday_range_pct: f64,
    pub min_intraday_range: f64,
    pub min_intraday_range_pct: f64,
    pub avg_volume: f64,
    pub max_volume: f64,
    pub min_volume: f64,
    pub total_volume: f64,
    pub days: usize,
}

/// Change across the whole fetched period
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodChange {
    pub first_open: f64,
    pub last_close: f64,
    pub change: f64,
    pub change_pct: f64,
}

/// Binance 24-hour rolling window statistics
#[derive(Debug, Clone, PartialEq)]
pub struct Ticker24h {
    /// `lastPrice`, when the response carries it
    pub last_price: Option<f64>,
    pub price_change: f64,
    pub price_change_pct: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
    pub quote_volume: f64,
    pub trades: u64,
}

/// CoinGecko `/simple/price` entry
#[derive(Debug, Clone, PartialEq)]
pub struct SimplePrice {
    pub usd: f64,
    pub usd_24h_change: Option<f64>,
    pub usd_24h_vol: Option<f64>,
}

/// Current price and 24h statistics, unified across sources.
///
/// Fields a source does not report stay `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarketSummary {
    pub name: String,
    pub symbol: String,
    pub current_price: f64,
    pub price_change_24h: Option<f64>,
    pub price_change_pct_24h: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub volume_24h: Option<f64>,
    pub quote_volume_24h: Option<f64>,
    pub trades_24h: Option<u64>,
    pub market_cap: Option<f64>,
}

impl MarketSummary {
    /// Summary built from the candles alone when no quote endpoint answered
    pub fn from_last_close(symbol: &str, last_close: f64) -> Self {
        Self {
            name: symbol.to_string(),
            symbol: symbol.to_string(),
            current_price: last_close,
            ..Self::default()
        }
    }
}

/// CoinGecko `days` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoinGeckoDays {
    Days(u32),
    Max,
}

impl CoinGeckoDays {
    /// Query value for the API
    pub fn as_param(&self) -> String {
        match self {
            CoinGeckoDays::Days(d) => d.to_string(),
            CoinGeckoDays::Max => "max".to_string(),
        }
    }

    /// More than one day of data is worth a daily breakdown
    pub fn spans_multiple_days(&self) -> bool {
        match self {
            CoinGeckoDays::Days(d) => *d > 1,
            CoinGeckoDays::Max => true,
        }
    }
}

impl Default for CoinGeckoDays {
    fn default() -> Self {
        CoinGeckoDays::Days(1)
    }
}

impl FromStr for CoinGeckoDays {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("max") {
            return Ok(CoinGeckoDays::Max);
        }
        match trimmed.parse::<u32>() {
            Ok(d) if d > 0 => Ok(CoinGeckoDays::Days(d)),
            _ => Err(FetchError::invalid_input(format!(
                "Invalid days '{}': use a positive number of days or 'max'",
                s
            ))),
        }
    }
}

impl fmt::Display for CoinGeckoDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_param())
    }
}

/// Parameters for a candle request; each source reads the fields it needs
#[derive(Debug, Clone, Default)]
pub struct CandleQuery {
    /// Binance kline interval (e.g. "5m")
    pub interval: Option<String>,
    /// Binance candle count
    pub limit: Option<u32>,
    /// CoinGecko lookback
    pub days: Option<CoinGeckoDays>,
    /// CoinMarketCap window start
    pub start: Option<DateTime<Utc>>,
    /// CoinMarketCap window end
    pub end: Option<DateTime<Utc>>,
}

/// Inclusive timestamp window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> FetchResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| FetchError::invalid_input(format!("Invalid date '{}' (expected YYYY-MM-DD): {}", s, e)))
}

impl DateRange {
    /// Build from calendar dates: `[start 00:00:00, end 23:59:59]`
    pub fn from_dates(start: Option<&str>, end: Option<&str>) -> FetchResult<Self> {
        let start = start
            .map(parse_date)
            .transpose()?
            .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc());
        let end = end
            .map(parse_date)
            .transpose()?
            .map(|d| {
                d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc() + Duration::days(1)
                    - Duration::seconds(1)
            });

        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(FetchError::invalid_input("Start date must not be after end date"));
            }
        }
        Ok(Self { start, end })
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| ts >= s) && self.end.map_or(true, |e| ts <= e)
    }
}

/// Price touch filters; each bound applies independently
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PriceRange {
    /// Keep candles whose high reached at least this price
    pub min: Option<f64>,
    /// Keep candles whose low reached at most this price
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

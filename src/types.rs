//! Request and response payloads of the web API
//!
//! Every response carries a `success` flag; failures use [`ErrorBody`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::charts::binance::DEFAULT_LIMIT;
use crate::error::{FetchError, FetchResult};
use crate::output::format::{self, round_to, MINUTE_FORMAT};
use crate::output::ChartFeedRecord;
use crate::pipeline::Report;
use crate::utils::as_f64_lenient;

/// `{success: false, error}` envelope for every failed request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SymbolsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolsResponse {
    pub success: bool,
    pub symbols: Vec<String>,
}

/// Body of `POST /api/fetch`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchRequest {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub interval: Option<String>,
    /// Number or numeric string
    #[serde(default)]
    pub limit: Option<Value>,
}

impl FetchRequest {
    /// Upper-cased symbol; missing or blank is an input error
    pub fn symbol(&self) -> FetchResult<String> {
        self.symbol
            .as_deref()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| FetchError::invalid_input("Symbol is required"))
    }

    pub fn interval(&self) -> String {
        self.interval
            .clone()
            .filter(|i| !i.trim().is_empty())
            .unwrap_or_else(|| crate::charts::binance::DEFAULT_INTERVAL.to_string())
    }

    pub fn limit(&self) -> FetchResult<u32> {
        match &self.limit {
            None | Some(Value::Null) => Ok(DEFAULT_LIMIT),
            Some(raw) => as_f64_lenient(raw)
                .filter(|n| n.is_finite() && *n >= 0.0 && n.fract() == 0.0)
                .map(|n| n.min(u32::MAX as f64) as u32)
                .ok_or_else(|| FetchError::invalid_input(format!("Invalid limit: {}", raw))),
        }
    }
}

/// Headline numbers of a fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSummary {
    pub current_price: f64,
    pub intraday_change: f64,
    pub intraday_change_pct: f64,
    pub price_change_24h: Option<f64>,
    pub price_change_pct_24h: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub volume_24h: Option<f64>,
    pub quote_volume_24h: Option<f64>,
    pub trades_24h: Option<u64>,
    pub candles: usize,
    pub time_range: String,
}

/// Display row: prices to 8 places, volume and percentage to 2
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcDataRow {
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
    pub price_change_pct: f64,
}

/// Body of a successful `POST /api/fetch`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    pub success: bool,
    pub symbol: String,
    pub interval: String,
    pub summary: WebSummary,
    pub ohlc_data: Vec<OhlcDataRow>,
    pub tradingview_data: Vec<ChartFeedRecord>,
}

impl FetchResponse {
    pub fn from_report(report: &Report, interval: &str) -> Self {
        let change = report.period_change();
        let s = &report.summary;
        let round8 = |v: Option<f64>| v.map(|x| round_to(x, 8));
        let round2 = |v: Option<f64>| v.map(|x| round_to(x, 2));

        let time_range = report
            .time_range()
            .map(|(first, last)| format!("{} to {}", first.format(MINUTE_FORMAT), last.format(MINUTE_FORMAT)))
            .unwrap_or_default();

        let summary = WebSummary {
            current_price: round_to(s.current_price, 8),
            intraday_change: change.map_or(0.0, |c| round_to(c.change, 8)),
            intraday_change_pct: change.map_or(0.0, |c| round_to(c.change_pct, 2)),
            price_change_24h: round8(s.price_change_24h),
            price_change_pct_24h: round2(s.price_change_pct_24h),
            high_24h: round8(s.high_24h),
            low_24h: round8(s.low_24h),
            volume_24h: round2(s.volume_24h),
            quote_volume_24h: round2(s.quote_volume_24h),
            trades_24h: s.trades_24h,
            candles: report.candles.len(),
            time_range,
        };

        let ohlc_data = report
            .candles
            .iter()
            .map(|r| OhlcDataRow {
                timestamp: format::timestamp(r.candle.timestamp),
                open: round_to(r.candle.open, 8),
                high: round_to(r.candle.high, 8),
                low: round_to(r.candle.low, 8),
                close: round_to(r.candle.close, 8),
                volume: round2(r.candle.volume),
                price_change_pct: round_to(r.price_change_pct, 2),
            })
            .collect();

        Self {
            success: true,
            symbol: report.identifier.clone(),
            interval: interval.to_string(),
            summary,
            ohlc_data,
            tradingview_data: crate::output::to_chart_feed(&report.candles),
        }
    }
}

/// Body of the export endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub data: Option<Value>,
}

impl ExportRequest {
    /// The payload, unless it is absent or empty
    pub fn data(&self) -> FetchResult<&Value> {
        let empty = match &self.data {
            None | Some(Value::Null) => true,
            Some(Value::Array(a)) => a.is_empty(),
            Some(Value::Object(o)) => o.is_empty(),
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };
        match &self.data {
            Some(value) if !empty => Ok(value),
            _ => Err(FetchError::invalid_input("No data to export")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{Candle, MarketSummary, MetricsCalculator, SourceKind};
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_fetch_request_defaults() {
        let req: FetchRequest = serde_json::from_value(json!({"symbol": " btcusdt "})).unwrap();
        assert_eq!(req.symbol().unwrap(), "BTCUSDT");
        assert_eq!(req.interval(), "5m");
        assert_eq!(req.limit().unwrap(), 50);

        let req: FetchRequest = serde_json::from_value(json!({"symbol": "ETHUSDT", "limit": "120"})).unwrap();
        assert_eq!(req.limit().unwrap(), 120);

        let req: FetchRequest = serde_json::from_value(json!({"limit": "lots"})).unwrap();
        assert_eq!(req.symbol().unwrap_err().message, "Symbol is required");
        assert!(req.limit().is_err());
    }

    #[test]
    fn test_export_request_rejects_empty() {
        for body in [json!({}), json!({"data": null}), json!({"data": []}), json!({"data": {}})] {
            let req: ExportRequest = serde_json::from_value(body).unwrap();
            assert_eq!(req.data().unwrap_err().message, "No data to export");
        }
        let req: ExportRequest = serde_json::from_value(json!({"data": [{"time": 1}]})).unwrap();
        assert!(req.data().is_ok());
    }

    #[test]
    fn test_fetch_response_from_report() {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 9, 30, 0).unwrap();
        let candles = MetricsCalculator::enrich(vec![
            Candle::new(base, 0.123456789, 0.13, 0.12, 0.125).with_volume(1234.5678),
            Candle::new(base + Duration::minutes(5), 0.125, 0.14, 0.124, 0.135).with_volume(10.0),
        ]);
        let report = Report {
            source: SourceKind::Binance,
            input: "xyzusdt".into(),
            identifier: "XYZUSDT".into(),
            candles,
            summary: MarketSummary {
                current_price: 0.1351,
                trades_24h: Some(77),
                ..MarketSummary::default()
            },
            summary_degraded: false,
            daily: None,
            averages: None,
        };

        let response = FetchResponse::from_report(&report, "5m");
        assert!(response.success);
        assert_eq!(response.symbol, "XYZUSDT");
        assert_eq!(response.summary.candles, 2);
        assert_eq!(response.summary.trades_24h, Some(77));
        assert_eq!(response.summary.time_range, "2026-01-01 09:30 to 2026-01-01 09:35");
        assert_eq!(response.ohlc_data[0].open, 0.12345679);
        assert_eq!(response.ohlc_data[0].volume, Some(1234.57));
        assert_eq!(response.ohlc_data[0].timestamp, "2026-01-01 09:30:00");
        assert_eq!(response.tradingview_data[0].open, 0.123456789);
        assert_eq!(response.tradingview_data.len(), 2);
    }
}

//! Integration tests for charts module

#[cfg(test)]
mod integration_tests {
    use crate::charts::*;
    use chrono::Duration;
    use serde_json::{json, Value};

    /// Twenty 5-minute klines starting 2026-01-01 00:00 UTC
    fn binance_fixture() -> Value {
        let start = 1767225600000i64;
        let rows: Vec<Value> = (0..20)
            .map(|i| {
                let open = 42000.0 + i as f64 * 10.0;
                let close = open + if i % 3 == 0 { -5.0 } else { 7.5 };
                json!([
                    start + i * 300_000,
                    format!("{:.2}", open),
                    format!("{:.2}", open + 20.0),
                    format!("{:.2}", open - 15.0),
                    format!("{:.2}", close),
                    "3.25",
                    start + (i + 1) * 300_000 - 1,
                    "136500.00",
                    120,
                    "1.50",
                    "63000.00",
                    "0"
                ])
            })
            .collect();
        Value::Array(rows)
    }

    #[test]
    fn test_binance_workflow() {
        let candles = binance::parse_klines(&binance_fixture()).unwrap();
        let rows = MetricsCalculator::enrich(candles);

        assert_eq!(rows.len(), 20);
        assert!(rows.windows(2).all(|w| w[0].candle.timestamp < w[1].candle.timestamp));

        let last = rows.last().unwrap();
        assert_eq!(last.candle.close, 42197.5);

        let change = MetricsCalculator::period_change(&rows).unwrap();
        assert_eq!(change.first_open, 42000.0);
        assert_eq!(change.last_close, 42197.5);

        // Five-minute candles within one day collapse to a single daily row
        let days = MetricsCalculator::daily_moves(&rows);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].num_candles, 20);
        assert_eq!(days[0].volume, 65.0);
    }

    #[test]
    fn test_coingecko_date_filter_scenario() {
        // Four-hourly candles from 2025-12-31 to 2026-01-09
        let start = 1767139200000i64;
        let rows: Vec<Value> = (0..60)
            .map(|i| json!([start + i * 4 * 3_600_000, 100.0, 110.0, 95.0, 105.0]))
            .collect();

        let candles = coingecko::parse_ohlc(&Value::Array(rows)).unwrap();
        let enriched = MetricsCalculator::enrich(candles);

        let range = DateRange::from_dates(Some("2026-01-01"), Some("2026-01-07")).unwrap();
        let kept = MetricsCalculator::filter_date_range(enriched.clone(), &range);

        assert_eq!(kept.len(), 7 * 6);
        assert!(kept.iter().all(|r| {
            let ts = r.candle.timestamp.to_rfc3339();
            ts.as_str() >= "2026-01-01T00:00:00+00:00" && ts.as_str() <= "2026-01-07T23:59:59+00:00"
        }));

        let outside = DateRange::from_dates(Some("2027-01-01"), Some("2027-01-07")).unwrap();
        assert!(MetricsCalculator::filter_date_range(enriched, &outside).is_empty());
    }

    #[test]
    fn test_coingecko_volume_merge() {
        let ohlc = json!([
            [1767225600000i64, 1.0, 1.0, 1.0, 1.0],
            [1767240000000i64, 1.0, 1.0, 1.0, 1.0],
            [1767254400000i64, 1.0, 1.0, 1.0, 1.0]
        ]);
        // Points 10 min after the first candle, 59 min before the third,
        // nothing near the second
        let chart = json!({
            "total_volumes": [
                [1767226200000i64, 111.0],
                [1767250860000i64, 333.0]
            ]
        });

        let mut candles = coingecko::parse_ohlc(&ohlc).unwrap();
        let volumes = coingecko::parse_market_chart_volumes(&chart).unwrap();
        MetricsCalculator::merge_volumes_asof(
            &mut candles,
            &volumes,
            Duration::seconds(VOLUME_MERGE_TOLERANCE_SECS),
        );

        assert_eq!(candles[0].volume, Some(111.0));
        assert_eq!(candles[1].volume, None);
        assert_eq!(candles[2].volume, Some(333.0));
    }

    #[test]
    fn test_coinmarketcap_daily_workflow() {
        let json = json!({
            "status": {"error_code": 0},
            "data": {"quotes": [
                {"timestamp": "2026-01-01T23:59:59.999Z",
                 "quote": {"USD": {"price": 105.0, "open": 100.0, "high": 110.0, "low": 95.0, "volume_24h": 1000.0}}},
                {"timestamp": "2026-01-02T23:59:59.999Z",
                 "quote": {"USD": {"price": 99.0, "open": 105.0, "high": 106.0, "low": 98.0, "volume_24h": 3000.0}}}
            ]}
        });

        let candles = coinmarketcap::parse_historical(&json).unwrap();
        let rows = MetricsCalculator::enrich(candles);
        let days = MetricsCalculator::daily_moves(&rows);
        let summary = MetricsCalculator::average_moves(&days).unwrap();

        assert_eq!(days.len(), 2);
        assert_eq!(summary.days, 2);
        assert_eq!(summary.max_intraday_range, 15.0);
        assert_eq!(summary.min_intraday_range, 8.0);
        assert_eq!(summary.total_volume, 4000.0);
    }

    #[test]
    fn test_regrouping_daily_rows_is_stable() {
        let candles = binance::parse_klines(&binance_fixture()).unwrap();
        let days = MetricsCalculator::daily_moves(&candles);
        let regrouped = MetricsCalculator::daily_moves(&days);
        assert_eq!(days, regrouped);
    }

    #[test]
    fn test_price_filter_can_empty_the_table() {
        let candles = binance::parse_klines(&binance_fixture()).unwrap();
        let rows = MetricsCalculator::enrich(candles);
        let range = PriceRange { min: Some(1_000_000.0), max: None };
        assert!(MetricsCalculator::filter_price_range(rows, &range).is_empty());
    }
}

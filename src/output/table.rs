//! Grid tables for candles and daily moves

use tabled::{Table, Tabled};

use super::format;
use crate::charts::{DailyMove, EnrichedCandle, MetricsCalculator};

#[derive(Tabled)]
struct CandleRow {
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Open")]
    open: String,
    #[tabled(rename = "High")]
    high: String,
    #[tabled(rename = "Low")]
    low: String,
    #[tabled(rename = "Close")]
    close: String,
    #[tabled(rename = "Volume")]
    volume: String,
    #[tabled(rename = "Change %")]
    change_pct: String,
}

#[derive(Tabled)]
struct DailyRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Open")]
    open: String,
    #[tabled(rename = "High")]
    high: String,
    #[tabled(rename = "Low")]
    low: String,
    #[tabled(rename = "Close")]
    close: String,
    #[tabled(rename = "Volume")]
    volume: String,
    #[tabled(rename = "Range")]
    range: String,
    #[tabled(rename = "Range %")]
    range_pct: String,
    #[tabled(rename = "Open-Close %")]
    open_close_pct: String,
}

/// Last `rows` candles; precision follows the mean close of the whole table
pub fn candle_table(candles: &[EnrichedCandle], rows: usize) -> String {
    let decimals = format::price_decimals(MetricsCalculator::mean_close(candles));
    let skip = candles.len().saturating_sub(rows);

    let rows: Vec<CandleRow> = candles
        .iter()
        .skip(skip)
        .map(|r| CandleRow {
            timestamp: format::timestamp(r.candle.timestamp),
            open: format::usd(r.candle.open, decimals),
            high: format::usd(r.candle.high, decimals),
            low: format::usd(r.candle.low, decimals),
            close: format::usd(r.candle.close, decimals),
            volume: r.candle.volume.map_or_else(|| "-".to_string(), format::compact_volume),
            change_pct: format::pct(r.price_change_pct),
        })
        .collect();

    Table::new(rows).to_string()
}

pub fn daily_table(days: &[DailyMove]) -> String {
    let mean_close = days.iter().map(|d| d.close).sum::<f64>() / days.len().max(1) as f64;
    let decimals = format::price_decimals(mean_close);

    let rows: Vec<DailyRow> = days
        .iter()
        .map(|d| DailyRow {
            date: d.date.format("%Y-%m-%d").to_string(),
            open: format::usd(d.open, decimals),
            high: format::usd(d.high, decimals),
            low: format::usd(d.low, decimals),
            close: format::usd(d.close, decimals),
            volume: format::compact_volume(d.volume),
            range: format::usd(d.intraday_range, decimals),
            range_pct: format::pct(d.intraday_range_pct),
            open_close_pct: format::signed_pct(d.open_close_pct),
        })
        .collect();

    Table::new(rows).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::Candle;
    use chrono::{Duration, TimeZone, Utc};

    fn rows(count: i64) -> Vec<EnrichedCandle> {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let candles = (0..count)
            .map(|i| Candle::new(base + Duration::minutes(5 * i), 0.5, 0.52, 0.49, 0.51))
            .collect();
        MetricsCalculator::enrich(candles)
    }

    #[test]
    fn test_candle_table_shows_tail() {
        let table = candle_table(&rows(30), 3);
        assert!(table.contains("Timestamp"));
        assert!(table.contains("2026-01-01 02:25:00"));
        assert!(!table.contains("2026-01-01 02:10:00"));
        // Sub-dollar prices get four decimals
        assert!(table.contains("$0.5100"));
        // Missing volume renders as a dash
        assert!(table.contains(" - "));
    }

    #[test]
    fn test_daily_table() {
        let days = MetricsCalculator::daily_moves(&rows(4));
        let table = daily_table(&days);
        assert!(table.contains("2026-01-01"));
        assert!(table.contains("Open-Close %"));
        assert!(table.contains("+2.00%"));
        assert!(table.contains("$0.00"));
    }
}

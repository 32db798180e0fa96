//! Dotted key/value summary blocks

use super::format::{self, dotted};
use crate::charts::{MoveSummary, SourceKind};
use crate::pipeline::Report;

const SUMMARY_WIDTH: usize = 25;
const AVERAGES_WIDTH: usize = 35;
pub const RULE_WIDTH: usize = 80;

pub fn rule(ch: char) -> String {
    ch.to_string().repeat(RULE_WIDTH)
}

fn coin_label(report: &Report) -> String {
    let summary = &report.summary;
    if summary.name.is_empty() {
        report.identifier.clone()
    } else {
        format!("{} ({})", summary.name, summary.symbol)
    }
}

/// Summary lines for the source that produced `report`
pub fn summary_lines(report: &Report) -> Vec<String> {
    let decimals = format::price_decimals(report.mean_close());
    let summary = &report.summary;
    let mut lines = Vec::new();

    match report.source {
        SourceKind::Binance => {
            lines.push(dotted("Symbol", SUMMARY_WIDTH, &report.identifier));
            let current = report.last_close().unwrap_or(summary.current_price);
            lines.push(dotted("Current Price", SUMMARY_WIDTH, format::usd(current, decimals)));
            if let Some(change) = report.period_change() {
                lines.push(dotted(
                    "Intraday Change",
                    SUMMARY_WIDTH,
                    format::usd_with_pct(change.change, change.change_pct, decimals),
                ));
            }
            if let (Some(change), Some(pct)) = (summary.price_change_24h, summary.price_change_pct_24h) {
                lines.push(dotted("24h Change", SUMMARY_WIDTH, format::usd_with_pct(change, pct, decimals)));
            }
            lines.push(dotted("24h High", SUMMARY_WIDTH, format::usd_opt(summary.high_24h, decimals)));
            lines.push(dotted("24h Low", SUMMARY_WIDTH, format::usd_opt(summary.low_24h, decimals)));
            lines.push(dotted(
                "24h Volume",
                SUMMARY_WIDTH,
                summary
                    .volume_24h
                    .map_or_else(|| "N/A".to_string(), |v| format::with_thousands(v, 2)),
            ));
            lines.push(dotted("24h Quote Volume", SUMMARY_WIDTH, format::usd_opt(summary.quote_volume_24h, 2)));
            if let Some(trades) = summary.trades_24h {
                lines.push(dotted("24h Trades", SUMMARY_WIDTH, format::with_thousands(trades as f64, 0)));
            }
        }
        SourceKind::CoinGecko => {
            lines.push(dotted("Coin", SUMMARY_WIDTH, coin_label(report)));
            lines.push(dotted("Current Price", SUMMARY_WIDTH, format::usd(summary.current_price, decimals)));
            if let Some(change) = report.period_change() {
                lines.push(dotted(
                    "Period Change",
                    SUMMARY_WIDTH,
                    format::usd_with_pct(change.change, change.change_pct, decimals),
                ));
            }
            lines.push(dotted(
                "24h Change",
                SUMMARY_WIDTH,
                format::usd_with_pct(
                    summary.price_change_24h.unwrap_or(0.0),
                    summary.price_change_pct_24h.unwrap_or(0.0),
                    decimals,
                ),
            ));
            lines.push(dotted("24h High", SUMMARY_WIDTH, format::usd_opt(summary.high_24h, decimals)));
            lines.push(dotted("24h Low", SUMMARY_WIDTH, format::usd_opt(summary.low_24h, decimals)));
            lines.push(dotted("24h Volume", SUMMARY_WIDTH, format::usd_opt(summary.volume_24h, 0)));
            lines.push(dotted("Market Cap", SUMMARY_WIDTH, format::usd_opt(summary.market_cap, 0)));
        }
        SourceKind::CoinMarketCap => {
            lines.push(dotted("Coin", SUMMARY_WIDTH, coin_label(report)));
            lines.push(dotted("Current Price", SUMMARY_WIDTH, format::usd(summary.current_price, decimals)));
            if let Some(change) = report.period_change() {
                lines.push(dotted(
                    "Period Change",
                    SUMMARY_WIDTH,
                    format::usd_with_pct(change.change, change.change_pct, decimals),
                ));
            }
            lines.push(dotted(
                "24h Change %",
                SUMMARY_WIDTH,
                format::pct(summary.price_change_pct_24h.unwrap_or(0.0)),
            ));
            lines.push(dotted("24h Volume", SUMMARY_WIDTH, format::usd(summary.volume_24h.unwrap_or(0.0), 0)));
            lines.push(dotted("Market Cap", SUMMARY_WIDTH, format::usd(summary.market_cap.unwrap_or(0.0), 0)));
        }
    }

    let count_label = match report.source {
        SourceKind::CoinMarketCap => "Data Points",
        _ => "Candles",
    };
    lines.push(dotted(count_label, SUMMARY_WIDTH, report.candles.len()));

    if let Some((first, last)) = report.time_range() {
        lines.push(dotted(
            "Time Range",
            SUMMARY_WIDTH,
            format!("{} to {}", format::timestamp(first), format::timestamp(last)),
        ));
    }

    lines
}

/// Average daily moves; `decimals` follows the candle table's mean close
pub fn average_lines(averages: Option<&MoveSummary>, decimals: usize) -> Vec<String> {
    let Some(avg) = averages else {
        return vec!["No daily data to average".to_string()];
    };

    vec![
        dotted(
            "Avg Intraday Range",
            AVERAGES_WIDTH,
            format!("{} ({})", format::usd(avg.avg_intraday_range, decimals), format::pct(avg.avg_intraday_range_pct)),
        ),
        dotted(
            "Avg Open-Close Move",
            AVERAGES_WIDTH,
            format!(
                "{} ({})",
                format::usd(avg.avg_open_close_move, decimals),
                format::signed_pct(avg.avg_open_close_pct)
            ),
        ),
        dotted(
            "Max Intraday Range",
            AVERAGES_WIDTH,
            format!("{} ({})", format::usd(avg.max_intraday_range, decimals), format::pct(avg.max_intraday_range_pct)),
        ),
        dotted(
            "Min Intraday Range",
            AVERAGES_WIDTH,
            format!("{} ({})", format::usd(avg.min_intraday_range, decimals), format::pct(avg.min_intraday_range_pct)),
        ),
        dotted("Avg Daily Volume", AVERAGES_WIDTH, format::compact_volume(avg.avg_volume)),
        dotted("Max Daily Volume", AVERAGES_WIDTH, format::compact_volume(avg.max_volume)),
        dotted("Min Daily Volume", AVERAGES_WIDTH, format::compact_volume(avg.min_volume)),
        dotted("Total Volume", AVERAGES_WIDTH, format::compact_volume(avg.total_volume)),
        dotted("Number of Days", AVERAGES_WIDTH, avg.days),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{Candle, MarketSummary, MetricsCalculator};
    use chrono::{Duration, TimeZone, Utc};

    fn report(source: SourceKind, summary: MarketSummary) -> Report {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let candles = vec![
            Candle::new(base, 100.0, 110.0, 95.0, 105.0).with_volume(1_500.0),
            Candle::new(base + Duration::hours(30), 105.0, 125.0, 104.0, 120.0).with_volume(2_500.0),
        ];
        let rows = MetricsCalculator::enrich(candles);
        let days = MetricsCalculator::daily_moves(&rows);
        let averages = MetricsCalculator::average_moves(&days);
        Report {
            source,
            input: "BTCUSDT".into(),
            identifier: "BTCUSDT".into(),
            candles: rows,
            summary,
            summary_degraded: false,
            daily: Some(days),
            averages,
        }
    }

    #[test]
    fn test_binance_summary_uses_last_close() {
        let summary = MarketSummary {
            current_price: 999.0,
            price_change_24h: Some(-3.5),
            price_change_pct_24h: Some(-1.2),
            high_24h: Some(130.0),
            low_24h: Some(90.0),
            volume_24h: Some(12_345.678),
            quote_volume_24h: Some(1_500_000.0),
            trades_24h: Some(4_200),
            ..MarketSummary::default()
        };
        let lines = summary_lines(&report(SourceKind::Binance, summary));

        assert_eq!(lines[0], "Symbol................... BTCUSDT");
        assert_eq!(lines[1], "Current Price............ $120.00");
        assert_eq!(lines[2], "Intraday Change.......... $20.00 (20.00%)");
        assert_eq!(lines[3], "24h Change............... $-3.50 (-1.20%)");
        assert!(lines.contains(&"24h Volume............... 12,345.68".to_string()));
        assert!(lines.contains(&"24h Quote Volume......... $1,500,000.00".to_string()));
        assert!(lines.contains(&"Candles.................. 2".to_string()));
        assert_eq!(
            lines.last().unwrap(),
            "Time Range............... 2026-01-01 00:00:00 to 2026-01-02 06:00:00"
        );
    }

    #[test]
    fn test_coinmarketcap_summary() {
        let summary = MarketSummary::from_last_close("BTC", 120.0);
        let lines = summary_lines(&report(SourceKind::CoinMarketCap, summary));

        assert_eq!(lines[0], "Coin..................... BTC (BTC)");
        assert!(lines.contains(&"24h Change %............. 0.00%".to_string()));
        assert!(lines.contains(&"Market Cap............... $0".to_string()));
        assert!(lines.contains(&"Data Points.............. 2".to_string()));
    }

    #[test]
    fn test_coingecko_summary_marks_missing_fields() {
        let summary = MarketSummary {
            name: "Bitcoin".into(),
            symbol: "BTC".into(),
            current_price: 120.0,
            ..MarketSummary::default()
        };
        let lines = summary_lines(&report(SourceKind::CoinGecko, summary));
        assert_eq!(lines[0], "Coin..................... Bitcoin (BTC)");
        assert!(lines.contains(&"24h High................. N/A".to_string()));
    }

    #[test]
    fn test_average_lines() {
        let r = report(SourceKind::CoinGecko, MarketSummary::default());
        let lines = average_lines(r.averages.as_ref(), 2);

        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "Avg Intraday Range................. $18.00 (17.50%)");
        assert_eq!(lines[4], "Avg Daily Volume................... $2.00K");
        assert_eq!(lines[8], "Number of Days..................... 2");

        assert_eq!(average_lines(None, 2), vec!["No daily data to average".to_string()]);
    }
}

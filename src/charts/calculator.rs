//! Derived metrics over candle tables
//!
//! Everything here is pure: no network, deterministic for identical input,
//! row order preserved. Division by a zero open is left to IEEE semantics
//! (the percentage becomes infinite or NaN).

use chrono::{Duration, NaiveDate};

use super::types::*;

/// Default tolerance for joining a volume series onto candles
pub const VOLUME_MERGE_TOLERANCE_SECS: i64 = 3600;

/// Metric calculator for candle tables
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Calculate percentage change relative to `base`
    pub fn percentage_change(base: f64, new: f64) -> f64 {
        (new - base) / base * 100.0
    }

    /// Append the derived columns to each candle
    pub fn enrich_candle(candle: Candle) -> EnrichedCandle {
        let price_change = candle.close - candle.open;
        let high_low_range = candle.high - candle.low;
        EnrichedCandle {
            price_change,
            price_change_pct: price_change / candle.open * 100.0,
            high_low_range,
            range_pct: high_low_range / candle.open * 100.0,
            candle,
        }
    }

    /// Enrich a whole table, keeping row count and order
    pub fn enrich(candles: Vec<Candle>) -> Vec<EnrichedCandle> {
        candles.into_iter().map(Self::enrich_candle).collect()
    }

    /// Group rows by UTC calendar date.
    ///
    /// Days appear in ascending date order. Within a day the first row
    /// supplies the open and the last row the close, so rows must arrive in
    /// time order.
    pub fn daily_moves<T: OhlcRow>(rows: &[T]) -> Vec<DailyMove> {
        let mut groups: Vec<(NaiveDate, Vec<&T>)> = Vec::new();

        for row in rows {
            let date = row.timestamp().date_naive();
            match groups.iter_mut().find(|(d, _)| *d == date) {
                Some((_, members)) => members.push(row),
                None => groups.push((date, vec![row])),
            }
        }
        groups.sort_by_key(|(date, _)| *date);

        groups
            .into_iter()
            .filter_map(|(date, members)| {
                let first = members.first()?;
                let last = members.last()?;

                let open = first.open();
                let close = last.close();
                let high = members.iter().map(|r| r.high()).fold(f64::NEG_INFINITY, f64::max);
                let low = members.iter().map(|r| r.low()).fold(f64::INFINITY, f64::min);
                let volume = members.iter().map(|r| r.volume().unwrap_or(0.0)).sum();
                let num_candles = members.iter().map(|r| r.candle_count()).sum();

                let intraday_range = high - low;
                let open_close_move = close - open;

                Some(DailyMove {
                    date,
                    open,
                    high,
                    low,
                    close,
                    volume,
                    intraday_range,
                    intraday_range_pct: intraday_range / open * 100.0,
                    open_close_move,
                    open_close_pct: open_close_move / open * 100.0,
                    num_candles,
                })
            })
            .collect()
    }

    /// Mean/max/min across days; `None` for an empty table
    pub fn average_moves(days: &[DailyMove]) -> Option<MoveSummary> {
        if days.is_empty() {
            return None;
        }

        let ranges: Vec<f64> = days.iter().map(|d| d.intraday_range).collect();
        let range_pcts: Vec<f64> = days.iter().map(|d| d.intraday_range_pct).collect();
        let moves: Vec<f64> = days.iter().map(|d| d.open_close_move).collect();
        let move_pcts: Vec<f64> = days.iter().map(|d| d.open_close_pct).collect();
        let volumes: Vec<f64> = days.iter().map(|d| d.volume).collect();

        Some(MoveSummary {
            avg_intraday_range: mean(&ranges),
            avg_intraday_range_pct: mean(&range_pcts),
            avg_open_close_move: mean(&moves),
            avg_open_close_pct: mean(&move_pcts),
            max_intraday_range: max(&ranges),
            max_intraday_range_pct: max(&range_pcts),
            min_intraday_range: min(&ranges),
            min_intraday_range_pct: min(&range_pcts),
            avg_volume: mean(&volumes),
            max_volume: max(&volumes),
            min_volume: min(&volumes),
            total_volume: volumes.iter().sum(),
            days: days.len(),
        })
    }

    /// Last close against first open
    pub fn period_change<T: OhlcRow>(rows: &[T]) -> Option<PeriodChange> {
        let first = rows.first()?;
        let last = rows.last()?;
        let change = last.close() - first.open();
        Some(PeriodChange {
            first_open: first.open(),
            last_close: last.close(),
            change,
            change_pct: change / first.open() * 100.0,
        })
    }

    /// Mean close, used to pick display precision
    pub fn mean_close<T: OhlcRow>(rows: &[T]) -> f64 {
        let closes: Vec<f64> = rows.iter().map(|r| r.close()).collect();
        mean(&closes)
    }

    /// Keep rows whose timestamp lies in the window
    pub fn filter_date_range(rows: Vec<EnrichedCandle>, range: &DateRange) -> Vec<EnrichedCandle> {
        rows.into_iter()
            .filter(|r| range.contains(r.candle.timestamp))
            .collect()
    }

    /// Keep rows that touched the price bounds; each bound narrows on its own
    pub fn filter_price_range(rows: Vec<EnrichedCandle>, range: &PriceRange) -> Vec<EnrichedCandle> {
        rows.into_iter()
            .filter(|r| range.min.map_or(true, |min| r.candle.high >= min))
            .filter(|r| range.max.map_or(true, |max| r.candle.low <= max))
            .collect()
    }

    /// Nearest-timestamp join of a volume series onto candles.
    ///
    /// A candle takes the volume of the closest point when that point lies
    /// within `tolerance` (inclusive); otherwise its volume stays `None`. On
    /// an exact tie the earlier point wins. An empty series sets every
    /// volume to zero. Candle order is untouched.
    pub fn merge_volumes_asof(candles: &mut [Candle], volumes: &[VolumePoint], tolerance: Duration) {
        if volumes.is_empty() {
            for candle in candles.iter_mut() {
                candle.volume = Some(0.0);
            }
            return;
        }

        let mut sorted: Vec<&VolumePoint> = volumes.iter().collect();
        sorted.sort_by_key(|v| v.timestamp);

        for candle in candles.iter_mut() {
            let ts = candle.timestamp;
            let idx = sorted.partition_point(|v| v.timestamp < ts);

            let before = idx.checked_sub(1).and_then(|i| sorted.get(i));
            let after = sorted.get(idx);

            let nearest = match (before, after) {
                (Some(b), Some(a)) => {
                    if ts - b.timestamp <= a.timestamp - ts {
                        Some(*b)
                    } else {
                        Some(*a)
                    }
                }
                (Some(b), None) => Some(*b),
                (None, Some(a)) => Some(*a),
                (None, None) => None,
            };

            candle.volume = nearest
                .filter(|v| (v.timestamp - ts).abs() <= tolerance)
                .map(|v| v.volume);
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn max(values: &[f64]) -> f64 {
    values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
}

fn min(values: &[f64]) -> f64 {
    values.iter().cloned().fold(f64::INFINITY, f64::min)
}

//! Number and timestamp formatting for console output

use chrono::{DateTime, Utc};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Decimal places for prices: 6 below 0.01, 4 below 1, else 2
pub fn price_decimals(reference_price: f64) -> usize {
    if reference_price < 0.01 {
        6
    } else if reference_price < 1.0 {
        4
    } else {
        2
    }
}

/// Fixed-point with `,` thousands separators (`1234567.891` becomes `1,234,567.89`)
pub fn with_thousands(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// `$1,234.56`
pub fn usd(value: f64, decimals: usize) -> String {
    format!("${}", with_thousands(value, decimals))
}

/// `$1,234.56` or `N/A` when the source does not report the value
pub fn usd_opt(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| usd(v, decimals))
}

/// Volume with a B/M/K suffix at 1e9/1e6/1e3
pub fn compact_volume(volume: f64) -> String {
    if volume >= 1_000_000_000.0 {
        format!("${:.2}B", volume / 1_000_000_000.0)
    } else if volume >= 1_000_000.0 {
        format!("${:.2}M", volume / 1_000_000.0)
    } else if volume >= 1_000.0 {
        format!("${:.2}K", volume / 1_000.0)
    } else {
        format!("${}", with_thousands(volume, 2))
    }
}

/// `1.23%`
pub fn pct(value: f64) -> String {
    format!("{:.2}%", value)
}

/// `+1.23%` / `-1.23%`
pub fn signed_pct(value: f64) -> String {
    format!("{:+.2}%", value)
}

/// `$12.50 (1.23%)`
pub fn usd_with_pct(change: f64, change_pct: f64, decimals: usize) -> String {
    format!("{} ({})", usd(change, decimals), pct(change_pct))
}

pub fn timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// `key.............. value`
pub fn dotted(key: &str, width: usize, value: impl std::fmt::Display) -> String {
    format!("{:.<width$} {}", key, value, width = width)
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

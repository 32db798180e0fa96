//! JSON Parsing Utilities
//!
//! Upstream APIs disagree on number encoding: Binance sends prices as
//! strings, CoinGecko and CoinMarketCap as JSON numbers. These helpers
//! accept both.

use crate::error::{FetchError, FetchResult};

/// Read a number that may be encoded as a JSON number or a numeric string
pub fn as_f64_lenient(value: &serde_json::Value) -> Option<f64> {
    if let Some(n) = value.as_f64() {
        Some(n)
    } else if let Some(s) = value.as_str() {
        s.trim().parse().ok()
    } else {
        None
    }
}

/// Extract an f64 field (number or numeric string) from a JSON object
pub fn get_json_f64(value: &serde_json::Value, field: &str) -> Option<f64> {
    value.get(field).and_then(as_f64_lenient)
}

/// Extract a required f64 field, failing with a parse error naming the field
pub fn require_json_f64(value: &serde_json::Value, field: &str) -> FetchResult<f64> {
    get_json_f64(value, field)
        .ok_or_else(|| FetchError::parse_error(format!("missing or non-numeric field '{}'", field)))
}

/// Extract a string field from a JSON object
pub fn get_json_string(value: &serde_json::Value, field: &str) -> Option<String> {
    value.get(field).and_then(|v| v.as_str()).map(|s| s.to_string())
}

/// Extract an integer field (number or numeric string)
pub fn get_json_i64(value: &serde_json::Value, field: &str) -> Option<i64> {
    value.get(field).and_then(|v| {
        if let Some(n) = v.as_i64() {
            Some(n)
        } else if let Some(f) = v.as_f64() {
            Some(f as i64)
        } else {
            v.as_str().and_then(|s| s.trim().parse().ok())
        }
    })
}

/// Read element `index` of a JSON array row as f64
pub fn row_f64(row: &[serde_json::Value], index: usize) -> FetchResult<f64> {
    row.get(index)
        .and_then(as_f64_lenient)
        .ok_or_else(|| FetchError::parse_error(format!("row column {} is not numeric", index)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_json_f64_lenient() {
        let value = json!({
            "number": 42.5,
            "string": "42.50000000",
            "garbage": "n/a"
        });

        assert_eq!(get_json_f64(&value, "number"), Some(42.5));
        assert_eq!(get_json_f64(&value, "string"), Some(42.5));
        assert_eq!(get_json_f64(&value, "garbage"), None);
        assert_eq!(get_json_f64(&value, "missing"), None);
        assert!(require_json_f64(&value, "missing").is_err());
    }

    #[test]
    fn test_get_json_i64() {
        let value = json!({"count": 1200, "text": "77", "float": 3.0});
        assert_eq!(get_json_i64(&value, "count"), Some(1200));
        assert_eq!(get_json_i64(&value, "text"), Some(77));
        assert_eq!(get_json_i64(&value, "float"), Some(3));
    }

    #[test]
    fn test_row_f64() {
        let row = vec![json!(1704067200000i64), json!("42000.10"), json!(null)];
        assert_eq!(row_f64(&row, 1).unwrap(), 42000.10);
        assert!(row_f64(&row, 2).is_err());
        assert!(row_f64(&row, 9).is_err());
    }
}

//! Chart-feed JSON and CSV export

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::format;
use crate::charts::EnrichedCandle;
use crate::error::{FetchError, FetchResult};

/// One candle in the chart-feed shape charting front-ends consume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartFeedRecord {
    /// Bucket open time, epoch milliseconds
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl From<&EnrichedCandle> for ChartFeedRecord {
    fn from(row: &EnrichedCandle) -> Self {
        Self {
            time: row.candle.time_ms(),
            open: row.candle.open,
            high: row.candle.high,
            low: row.candle.low,
            close: row.candle.close,
            volume: row.candle.volume,
        }
    }
}

pub fn to_chart_feed(rows: &[EnrichedCandle]) -> Vec<ChartFeedRecord> {
    rows.iter().map(ChartFeedRecord::from).collect()
}

pub fn write_chart_feed(path: &Path, records: &[ChartFeedRecord]) -> FetchResult<()> {
    let file = File::create(path)
        .map_err(|e| FetchError::io(format!("Cannot create {}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn read_chart_feed(path: &Path) -> FetchResult<Vec<ChartFeedRecord>> {
    let file = File::open(path)
        .map_err(|e| FetchError::io(format!("Cannot open {}: {}", path.display(), e)))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

const BASE_COLUMNS: &[&str] = &[
    "timestamp",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "price_change",
    "price_change_pct",
    "high_low_range",
    "range_pct",
];

const KLINE_COLUMNS: &[&str] = &[
    "close_time",
    "quote_volume",
    "trades",
    "taker_buy_base",
    "taker_buy_quote",
];

/// Full enriched table as CSV, header included.
///
/// Kline columns are appended when any row carries them.
pub fn write_csv_to<W: Write>(writer: W, rows: &[EnrichedCandle]) -> FetchResult<()> {
    let with_klines = rows.iter().any(|r| r.candle.extras.is_some());
    let mut csv = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = BASE_COLUMNS.to_vec();
    if with_klines {
        header.extend_from_slice(KLINE_COLUMNS);
    }
    csv.write_record(&header)?;

    for row in rows {
        let c = &row.candle;
        let mut record = vec![
            format::timestamp(c.timestamp),
            c.open.to_string(),
            c.high.to_string(),
            c.low.to_string(),
            c.close.to_string(),
            c.volume.map(|v| v.to_string()).unwrap_or_default(),
            row.price_change.to_string(),
            row.price_change_pct.to_string(),
            row.high_low_range.to_string(),
            row.range_pct.to_string(),
        ];
        if with_klines {
            match &c.extras {
                Some(x) => record.extend([
                    format::timestamp(x.close_time),
                    x.quote_volume.to_string(),
                    x.trades.to_string(),
                    x.taker_buy_base.to_string(),
                    x.taker_buy_quote.to_string(),
                ]),
                None => record.extend(std::iter::repeat(String::new()).take(KLINE_COLUMNS.len())),
            }
        }
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

pub fn write_csv(path: &Path, rows: &[EnrichedCandle]) -> FetchResult<()> {
    let file = File::create(path)
        .map_err(|e| FetchError::io(format!("Cannot create {}: {}", path.display(), e)))?;
    write_csv_to(BufWriter::new(file), rows)
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Arbitrary list of JSON objects as CSV.
///
/// Columns are the union of object keys in first-seen order; missing keys
/// become empty cells.
pub fn records_to_csv(records: &[Value]) -> FetchResult<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        let object = record
            .as_object()
            .ok_or_else(|| FetchError::invalid_input("Export data must be a list of objects"))?;
        for key in object.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    let mut csv = csv::Writer::from_writer(Vec::new());
    csv.write_record(&columns)?;
    for record in records {
        let row: Vec<String> = columns.iter().map(|c| cell(record.get(c))).collect();
        csv.write_record(&row)?;
    }

    let bytes = csv
        .into_inner()
        .map_err(|e| FetchError::io(format!("CSV error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| FetchError::internal(format!("CSV output is not UTF-8: {}", e)))
}

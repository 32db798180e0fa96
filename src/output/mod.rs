//! Console rendering and file export

pub mod export;
pub mod format;
pub mod report;
pub mod table;

pub use export::{read_chart_feed, to_chart_feed, write_chart_feed, write_csv, ChartFeedRecord};

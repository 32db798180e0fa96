//! Intraday Fetcher Library
//!
//! Intraday and daily OHLC data from Binance, CoinGecko and CoinMarketCap.
//!
//! # Architecture
//!
//! This crate provides:
//! - **charts**: Source clients, symbol resolution and candle metrics
//! - **pipeline**: resolve, fetch, enrich, filter, then summarize
//! - **output**: Console tables, summary blocks, CSV and chart-feed export
//! - **web**: HTTP API and embedded UI
//!
//! # Example
//!
//! ```rust,ignore
//! use intraday_fetcher::{charts::{source_for, CandleQuery, SourceKind}, config::AppConfig, pipeline};
//!
//! let config = AppConfig::from_env()?;
//! let source = source_for(SourceKind::Binance, &config)?;
//! let report = pipeline::run(source.as_ref(), &pipeline::PipelineRequest::new("BTCUSDT", CandleQuery::default()))?;
//! println!("Last close: {:?}", report.last_close());
//! ```

pub mod charts;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod types;
pub mod utils;
pub mod web;

pub use error::{ErrorCode, FetchError, FetchResult};

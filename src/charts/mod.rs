//! Market data sources and candle metrics
//!
//! Provides:
//! - Binance, CoinGecko and CoinMarketCap clients behind `MarketSource`
//! - Pair/ticker/coin-id resolution
//! - Per-candle and per-day derived metrics
//! - Date and price filters

pub mod binance;
pub mod calculator;
pub mod coingecko;
pub mod coinmarketcap;
pub mod resolver;
pub mod source;
pub mod types;
#[cfg(test)]
pub mod tests;

pub use binance::BinanceClient;
pub use calculator::*;
pub use coingecko::CoinGeckoClient;
pub use coinmarketcap::CoinMarketCapClient;
pub use source::{source_for, MarketSource};
pub use types::*;

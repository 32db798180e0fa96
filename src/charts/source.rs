//! Pluggable market data sources

use super::binance::BinanceClient;
use super::coingecko::CoinGeckoClient;
use super::coinmarketcap::CoinMarketCapClient;
use super::types::*;
use crate::config::AppConfig;
use crate::error::FetchResult;

/// One upstream provider behind a common capability set.
///
/// Every method performs at most the network calls it names and blocks
/// until they complete.
pub trait MarketSource {
    fn kind(&self) -> SourceKind;

    /// Map user input (`BTCUSDT`, `bitcoin`, `YOOLDO`) to the identifier this
    /// source expects. Never fails on unknown input; it guesses instead.
    fn resolve_identifier(&self, input: &str) -> FetchResult<String>;

    /// Candles in ascending time order, exactly as the source returned them
    fn fetch_candles(&self, identifier: &str, query: &CandleQuery) -> FetchResult<Vec<Candle>>;

    /// Current price and 24h statistics
    fn fetch_summary_stats(&self, identifier: &str) -> FetchResult<MarketSummary>;

    /// When true a failed summary call degrades to a summary built from the
    /// last close instead of aborting the run.
    fn summary_is_optional(&self) -> bool {
        false
    }
}

/// Build the client for `kind` from configuration.
///
/// CoinMarketCap fails here, before any request, when no API key is set.
pub fn source_for(kind: SourceKind, config: &AppConfig) -> FetchResult<Box<dyn MarketSource>> {
    let source: Box<dyn MarketSource> = match kind {
        SourceKind::Binance => Box::new(BinanceClient::new(&config.binance_url)?),
        SourceKind::CoinGecko => Box::new(
            CoinGeckoClient::new(&config.coingecko_url)?.with_search(config.coingecko_search),
        ),
        SourceKind::CoinMarketCap => Box::new(CoinMarketCapClient::new(
            &config.cmc_url,
            config.cmc_api_key.as_deref(),
        )?),
    };
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_source_for_kinds() {
        let config = AppConfig::default();
        assert_eq!(source_for(SourceKind::Binance, &config).unwrap().kind(), SourceKind::Binance);
        assert_eq!(source_for(SourceKind::CoinGecko, &config).unwrap().kind(), SourceKind::CoinGecko);
    }

    #[test]
    fn test_cmc_requires_key_up_front() {
        let config = AppConfig::default();
        let err = source_for(SourceKind::CoinMarketCap, &config).err().unwrap();
        assert_eq!(err.code, ErrorCode::Config);
        assert!(err.message.contains("API key"));

        let config = AppConfig::default().with_api_key(Some("test-key".into()));
        let source = source_for(SourceKind::CoinMarketCap, &config).unwrap();
        assert!(source.summary_is_optional());
    }
}

//! Trading-pair to source identifier resolution
//!
//! Resolution never fails: unknown inputs degrade to a best-effort guess and
//! the following fetch reports whatever the upstream thinks of it.

/// A well-known USDT pair and its identifiers on the quote-only sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownPair {
    pub pair: &'static str,
    /// CoinMarketCap ticker
    pub cmc_symbol: &'static str,
    /// CoinGecko coin id
    pub coingecko_id: &'static str,
}

const fn pair(pair: &'static str, cmc_symbol: &'static str, coingecko_id: &'static str) -> KnownPair {
    KnownPair {
        pair,
        cmc_symbol,
        coingecko_id,
    }
}

pub const KNOWN_PAIRS: &[KnownPair] = &[
    pair("BTCUSDT", "BTC", "bitcoin"),
    pair("ETHUSDT", "ETH", "ethereum"),
    pair("BNBUSDT", "BNB", "binancecoin"),
    pair("ADAUSDT", "ADA", "cardano"),
    pair("SOLUSDT", "SOL", "solana"),
    pair("XRPUSDT", "XRP", "ripple"),
    pair("DOTUSDT", "DOT", "polkadot"),
    pair("DOGEUSDT", "DOGE", "dogecoin"),
    pair("MATICUSDT", "MATIC", "matic-network"),
    pair("LINKUSDT", "LINK", "chainlink"),
    pair("AVAXUSDT", "AVAX", "avalanche-2"),
    pair("UNIUSDT", "UNI", "uniswap"),
    pair("ATOMUSDT", "ATOM", "cosmos"),
    pair("LTCUSDT", "LTC", "litecoin"),
    pair("ALGOUSDT", "ALGO", "algorand"),
];

/// Look up a pair in the static table (case-insensitive)
pub fn known_pair(input: &str) -> Option<&'static KnownPair> {
    let upper = input.trim().to_uppercase();
    KNOWN_PAIRS.iter().find(|p| p.pair == upper)
}

/// Remove one trailing `USDT`, or else one trailing `USD`.
///
/// Matching is case-insensitive. When nothing would be left the input is
/// returned unchanged.
pub fn strip_quote_suffix(input: &str) -> &str {
    let trimmed = input.trim();
    let upper = trimmed.to_ascii_uppercase();

    for suffix in ["USDT", "USD"] {
        if upper.ends_with(suffix) {
            let base = &trimmed[..trimmed.len() - suffix.len()];
            return if base.is_empty() { trimmed } else { base };
        }
    }
    trimmed
}

/// Input that already looks like a CoinGecko id (`bitcoin`, `orochi-network`)
pub fn looks_like_coingecko_id(input: &str) -> bool {
    let has_cased = input.chars().any(|c| c.is_alphabetic());
    input.contains('-') || (has_cased && !input.chars().any(|c| c.is_uppercase()))
}

/// Binance symbols are upper-case pairs used as-is
pub fn binance_symbol(input: &str) -> String {
    input.trim().to_uppercase()
}

/// CoinMarketCap ticker: table first, else the upper-cased base ticker
pub fn cmc_symbol(input: &str) -> String {
    match known_pair(input) {
        Some(p) => p.cmc_symbol.to_string(),
        None => strip_quote_suffix(input).to_uppercase(),
    }
}

/// CoinGecko id from local knowledge only.
///
/// `None` means the caller may ask the search endpoint before settling on
/// [`coingecko_guess`].
pub fn coingecko_static_id(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if let Some(p) = known_pair(trimmed) {
        return Some(p.coingecko_id.to_string());
    }
    if looks_like_coingecko_id(trimmed) {
        return Some(trimmed.to_lowercase());
    }
    None
}

/// Search query for an unresolved input
pub fn coingecko_search_term(input: &str) -> String {
    strip_quote_suffix(input).to_uppercase()
}

/// Last-resort CoinGecko id: the lower-cased base ticker
pub fn coingecko_guess(input: &str) -> String {
    strip_quote_suffix(input).to_lowercase()
}

/// Full offline CoinGecko resolution
pub fn coingecko_id_offline(input: &str) -> String {
    coingecko_static_id(input).unwrap_or_else(|| coingecko_guess(input))
}

//! Runtime configuration derived from environment variables.
//!
//! Read once at startup; CLI flags override individual values afterwards.

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::{FetchError, FetchResult};

pub const BINANCE_API_BASE: &str = "https://api.binance.com/api/v3";
pub const COINGECKO_API_BASE: &str = "https://api.coingecko.com/api/v3";
pub const CMC_API_BASE: &str = "https://pro-api.coinmarketcap.com/v1";

/// Environment variable holding the CoinMarketCap key
pub const CMC_API_KEY_ENV: &str = "CMC_API_KEY";

/// Bound for candle-history calls (CoinGecko, CoinMarketCap)
pub const HISTORY_TIMEOUT: Duration = Duration::from_secs(30);
/// Bound for scalar quote, metadata and search calls
pub const QUOTE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub binance_url: String,
    pub coingecko_url: String,
    pub cmc_url: String,
    /// CoinMarketCap key. `None` when empty or unset.
    pub cmc_api_key: Option<String>,
    /// Allow the CoinGecko `/search` fallback during symbol resolution
    pub coingecko_search: bool,
    pub bind: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            binance_url: BINANCE_API_BASE.to_string(),
            coingecko_url: COINGECKO_API_BASE.to_string(),
            cmc_url: CMC_API_BASE.to_string(),
            cmc_api_key: None,
            coingecko_search: true,
            bind: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_str(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

fn env_u16(name: &str, default: u16) -> u16 {
    env_opt(name)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_bool(name: &str, default: bool) -> bool {
    env_opt(name)
        .map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes" | "y" | "on"))
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> FetchResult<Self> {
        let config = Self {
            binance_url: env_str("BINANCE_API_URL", BINANCE_API_BASE),
            coingecko_url: env_str("COINGECKO_API_URL", COINGECKO_API_BASE),
            cmc_url: env_str("CMC_API_URL", CMC_API_BASE),
            cmc_api_key: env_opt(CMC_API_KEY_ENV),
            coingecko_search: env_bool("COINGECKO_SEARCH", true),
            bind: env_str("WEB_BIND", "0.0.0.0"),
            port: env_u16("WEB_PORT", 5000),
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the CoinMarketCap key when one was given explicitly.
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
            self.cmc_api_key = Some(key);
        }
        self
    }

    pub fn validate(&self) -> FetchResult<()> {
        for (name, value) in [
            ("BINANCE_API_URL", &self.binance_url),
            ("COINGECKO_API_URL", &self.coingecko_url),
            ("CMC_API_URL", &self.cmc_url),
        ] {
            let url = Url::parse(value)
                .map_err(|e| FetchError::config(format!("{} is not a valid URL: {}", name, e)))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(FetchError::config(format!(
                    "{} must use http or https, got {}",
                    name,
                    url.scheme()
                )));
            }
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
        assert!(config.cmc_api_key.is_none());
    }

    #[test]
    fn test_explicit_key_overrides() {
        let config = AppConfig::default().with_api_key(Some("  abc  ".into()));
        assert_eq!(config.cmc_api_key.as_deref(), Some("abc"));

        let unchanged = config.clone().with_api_key(Some("   ".into()));
        assert_eq!(unchanged.cmc_api_key.as_deref(), Some("abc"));
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let config = AppConfig {
            binance_url: "ftp://example.com".into(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            cmc_url: "not a url".into(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

//! # config — read configuration from environment variables
//!
//! | Variable                     | Default                       |
//! |------------------------------|-------------------------------|
//! | `BIND_ADDR`                  | `0.0.0.0:3000`                |
//! | `TWELVE_DATA_API_KEY`        | —                             |
//! | `PUBLIC_TWELVE_DATA_API_KEY` | fallback for local dev        |
//! | `TWELVE_DATA_BASE_URL`       | `https://api.twelvedata.com`  |
//! | `QUOTE_PROVIDER`             | `twelvedata`                  |
//! | `QUOTE_PROXY_URL`            | required for `proxy`          |
//! | `DEFAULT_EXCHANGE`           | `NSE`                         |
//! | `ENRICH_EXCHANGES`           | `NASDAQ,NYSE`                 |
//! | `AUTH_PROVIDER`              | `memory`                      |
//! | `FIREBASE_API_KEY`           | required for `firebase`       |
//! | `WATCHLIST_MAX_RETRIES`      | `5`                           |
//! | `DATABASE_URL`               | used with `--features postgres` |
//! | `CORS_ORIGIN`                | any origin                    |

use std::net::SocketAddr;

use anyhow::{bail, Context};

pub const DEFAULT_TWELVE_DATA_URL: &str = "https://api.twelvedata.com";

// ─── Provider selection ───────────────────────────────────────────────────────

/// Where live quotes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteProvider {
    /// Direct call to Twelve Data with the server-side key.
    TwelveData,
    /// Another StockSwipe instance's `/api/price` proxy.
    Proxy,
    /// No live data; catalog snapshots are shown as-is.
    Offline,
}

impl std::fmt::Display for QuoteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuoteProvider::TwelveData => write!(f, "twelvedata"),
            QuoteProvider::Proxy => write!(f, "proxy"),
            QuoteProvider::Offline => write!(f, "offline"),
        }
    }
}

/// Which identity provider backs accounts and tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthBackend {
    /// In-process accounts, for local development and tests.
    Memory,
    /// Firebase Identity Toolkit REST API.
    Firebase,
}

impl std::fmt::Display for AuthBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthBackend::Memory => write!(f, "memory"),
            AuthBackend::Firebase => write!(f, "firebase"),
        }
    }
}

// ─── Config ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Market-data credential.  Optional at startup: the price proxy reports
    /// its absence per request.
    pub twelve_data_api_key: Option<String>,
    pub twelve_data_base_url: String,
    pub quote_provider: QuoteProvider,
    pub quote_proxy_url: Option<String>,
    /// Home-market exchange used when a request omits one.
    pub default_exchange: String,
    /// Exchanges eligible for live price refresh (provider plan limits).
    pub enrich_exchanges: Vec<String>,
    pub auth_provider: AuthBackend,
    pub firebase_api_key: Option<String>,
    /// Optimistic-concurrency attempts per watchlist mutation.
    pub watchlist_max_retries: u32,
    pub database_url: Option<String>,
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; empty values count as unset.
    pub fn from_vars<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr: SocketAddr = var("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()
            .context("BIND_ADDR must be a socket address, e.g. 0.0.0.0:3000")?;

        let quote_provider = match var("QUOTE_PROVIDER")
            .unwrap_or_else(|| "twelvedata".to_string())
            .to_lowercase()
            .as_str()
        {
            "twelvedata" => QuoteProvider::TwelveData,
            "proxy" => QuoteProvider::Proxy,
            "offline" => QuoteProvider::Offline,
            other => bail!("Unknown QUOTE_PROVIDER: '{other}'. Use 'twelvedata', 'proxy' or 'offline'"),
        };

        let quote_proxy_url = var("QUOTE_PROXY_URL").map(|u| u.trim_end_matches('/').to_string());
        if quote_provider == QuoteProvider::Proxy && quote_proxy_url.is_none() {
            bail!("QUOTE_PROXY_URL is required when QUOTE_PROVIDER=proxy");
        }

        let auth_provider = match var("AUTH_PROVIDER")
            .unwrap_or_else(|| "memory".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => AuthBackend::Memory,
            "firebase" => AuthBackend::Firebase,
            other => bail!("Unknown AUTH_PROVIDER: '{other}'. Use 'memory' or 'firebase'"),
        };

        let firebase_api_key = var("FIREBASE_API_KEY");
        if auth_provider == AuthBackend::Firebase && firebase_api_key.is_none() {
            bail!("FIREBASE_API_KEY is required when AUTH_PROVIDER=firebase");
        }

        let watchlist_max_retries: u32 = var("WATCHLIST_MAX_RETRIES")
            .unwrap_or_else(|| "5".to_string())
            .parse()
            .context("WATCHLIST_MAX_RETRIES must be a number")?;

        let enrich_exchanges = var("ENRICH_EXCHANGES")
            .unwrap_or_else(|| "NASDAQ,NYSE".to_string())
            .split(',')
            .map(|e| e.trim().to_uppercase())
            .filter(|e| !e.is_empty())
            .collect();

        Ok(Self {
            bind_addr,
            twelve_data_api_key: var("TWELVE_DATA_API_KEY")
                .or_else(|| var("PUBLIC_TWELVE_DATA_API_KEY")),
            twelve_data_base_url: var("TWELVE_DATA_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_TWELVE_DATA_URL.to_string()),
            quote_provider,
            quote_proxy_url,
            default_exchange: var("DEFAULT_EXCHANGE")
                .map(|e| e.to_uppercase())
                .unwrap_or_else(|| "NSE".to_string()),
            enrich_exchanges,
            auth_provider,
            firebase_api_key,
            watchlist_max_retries: watchlist_max_retries.max(1),
            database_url: var("DATABASE_URL"),
            cors_origin: var("CORS_ORIGIN"),
        })
    }
}

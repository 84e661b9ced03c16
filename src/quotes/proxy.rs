//! # quotes::proxy
//!
//! Quote source that goes through a StockSwipe `/api/price` relay instead of
//! holding the provider credential itself.  This is the client-side path: the
//! terminal client, or an instance deployed without a key, points here.

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use super::{normalize_quote, provider_message, QuoteSource};
use crate::models::Quote;

pub struct ProxySource {
    client: reqwest::Client,
    base_url: String,
}

impl ProxySource {
    /// `base_url` is the relay's origin, e.g. `http://localhost:3000`.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn fetch(&self, symbol: &str, exchange: &str) -> Result<Option<Value>, reqwest::Error> {
        let resp = self
            .client
            .get(format!("{}/api/price", self.base_url))
            .query(&[("symbol", symbol), ("exchange", exchange)])
            .send()
            .await?;

        if !resp.status().is_success() {
            warn!(symbol, status = %resp.status(), "Price proxy rejected request");
            return Ok(None);
        }

        Ok(Some(resp.json().await?))
    }
}

#[async_trait]
impl QuoteSource for ProxySource {
    fn name(&self) -> &'static str {
        "proxy"
    }

    async fn quote(&self, symbol: &str, exchange: &str) -> Option<Quote> {
        match self.fetch(symbol, exchange).await {
            Ok(Some(body)) => {
                let quote = normalize_quote(&body);
                if quote.is_none() {
                    warn!(symbol, exchange, message = provider_message(&body), "No usable quote");
                }
                quote
            }
            Ok(None) => None,
            Err(e) => {
                warn!(symbol, exchange, error = %e, "Network error fetching quote");
                None
            }
        }
    }
}

//! # quotes::twelve_data
//!
//! Direct adapter for the Twelve Data `quote` endpoint.
//!
//! The raw request ([`TwelveData::raw_quote`]) is shared by two callers:
//! * the [`QuoteSource`] impl, which normalises to `Option<Quote>`;
//! * the `/api/price` proxy, which relays the provider JSON untouched.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::{normalize_quote, provider_message, QuoteSource};
use crate::models::Quote;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("market-data API key is not configured")]
    MissingApiKey,

    #[error("market-data request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

// ─── Client ───────────────────────────────────────────────────────────────────

pub struct TwelveData {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl TwelveData {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// One outbound call with the credential injected.
    ///
    /// Returns the HTTP status with the decoded body, whatever the provider
    /// said.  Only a missing key, a network failure or a non-JSON body is an
    /// error.
    pub async fn raw_quote(&self, symbol: &str, exchange: &str) -> Result<(StatusCode, Value), QuoteError> {
        let api_key = self.api_key.as_deref().ok_or(QuoteError::MissingApiKey)?;

        let url = format!("{}/quote", self.base_url);
        debug!(symbol, exchange, "Requesting quote from Twelve Data");

        let resp = self
            .client
            .get(&url)
            .query(&[("symbol", symbol), ("exchange", exchange), ("apikey", api_key)])
            .send()
            .await?;

        let status = resp.status();
        let body: Value = resp.json().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl QuoteSource for TwelveData {
    fn name(&self) -> &'static str {
        "twelvedata"
    }

    async fn quote(&self, symbol: &str, exchange: &str) -> Option<Quote> {
        match self.raw_quote(symbol, exchange).await {
            Ok((status, body)) if status.is_success() => {
                let quote = normalize_quote(&body);
                if quote.is_none() {
                    warn!(symbol, exchange, message = provider_message(&body), "No usable quote");
                }
                quote
            }
            Ok((status, _)) => {
                warn!(symbol, exchange, %status, "Quote request rejected");
                None
            }
            Err(e) => {
                warn!(symbol, exchange, error = %e, "Quote request failed");
                None
            }
        }
    }
}

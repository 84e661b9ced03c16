//! # quotes — Quote Source Adapter
//!
//! One lookup for one ticker/exchange pair, normalised to `Option<Quote>`.
//!
//! ## Sources (selected by `QUOTE_PROVIDER`)
//! 1. [`TwelveData`]  — direct call to the market-data provider
//! 2. [`ProxySource`] — another instance's `/api/price` relay
//! 3. [`OfflineSource`] — no live data at all
//!
//! Every failure (missing key, HTTP error, provider `status: "error"`,
//! unparsable numbers, network error) collapses to `None`.  Callers have a
//! single fallback branch: keep the stale snapshot.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::config::{Config, QuoteProvider};
use crate::models::Quote;

pub mod proxy;
pub mod twelve_data;

pub use proxy::ProxySource;
pub use twelve_data::{QuoteError, TwelveData};

// ─── QuoteSource ──────────────────────────────────────────────────────────────

#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Short provider name for logs and `/api/health`.
    fn name(&self) -> &'static str;

    /// Fetch a live quote.  Never errors: absence is `None`.
    async fn quote(&self, symbol: &str, exchange: &str) -> Option<Quote>;
}

/// Source used when live data is switched off.
pub struct OfflineSource;

#[async_trait]
impl QuoteSource for OfflineSource {
    fn name(&self) -> &'static str {
        "offline"
    }

    async fn quote(&self, _symbol: &str, _exchange: &str) -> Option<Quote> {
        None
    }
}

/// Pick the quote source named by the configuration.
pub fn build_source(
    config: &Config,
    client: reqwest::Client,
    twelve_data: Arc<TwelveData>,
) -> Arc<dyn QuoteSource> {
    match config.quote_provider {
        QuoteProvider::TwelveData => twelve_data,
        QuoteProvider::Proxy => match &config.quote_proxy_url {
            Some(url) => Arc::new(ProxySource::new(client, url.clone())),
            None => {
                warn!("QUOTE_PROXY_URL not set — live quotes disabled");
                Arc::new(OfflineSource)
            }
        },
        QuoteProvider::Offline => Arc::new(OfflineSource),
    }
}

// ─── Normalisation ────────────────────────────────────────────────────────────

/// Turn a provider quote body into a [`Quote`].
///
/// Provider numerics arrive as text (`"close": "189.84"`).  A missing,
/// unparsable or non-positive close, or an unparsable change field, is
/// absence.
pub fn normalize_quote(body: &Value) -> Option<Quote> {
    if body.get("status").and_then(Value::as_str) == Some("error") {
        return None;
    }

    let price = numeric_field(body, "close").filter(|p| *p > 0.0)?;
    let change = numeric_field(body, "change")?;
    let change_percent = numeric_field(body, "percent_change")?;

    Some(Quote {
        price,
        change,
        change_percent,
    })
}

fn numeric_field(body: &Value, key: &str) -> Option<f64> {
    let parsed = match body.get(key)? {
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Number(number) => number.as_f64(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Provider-supplied error message, for logging only.
pub(crate) fn provider_message(body: &Value) -> &str {
    body.get("message").and_then(Value::as_str).unwrap_or("no usable quote")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_text_numerics() {
        let body = json!({
            "symbol": "AAPL",
            "close": "189.84",
            "change": "1.17",
            "percent_change": "0.62",
        });
        let quote = normalize_quote(&body).unwrap();
        assert_eq!(quote.price, 189.84);
        assert_eq!(quote.change, 1.17);
        assert_eq!(quote.change_percent, 0.62);
    }

    #[test]
    fn accepts_plain_numbers() {
        let body = json!({ "close": 10.5, "change": -0.5, "percent_change": -4.5 });
        assert!(normalize_quote(&body).is_some());
    }

    #[test]
    fn provider_error_status_is_absence() {
        let body = json!({
            "code": 404,
            "message": "symbol not found",
            "status": "error",
        });
        assert_eq!(normalize_quote(&body), None);
    }

    #[test]
    fn missing_or_bad_close_is_absence() {
        assert_eq!(normalize_quote(&json!({ "change": "1", "percent_change": "1" })), None);
        assert_eq!(
            normalize_quote(&json!({ "close": "n/a", "change": "1", "percent_change": "1" })),
            None
        );
        assert_eq!(
            normalize_quote(&json!({ "close": "0", "change": "0", "percent_change": "0" })),
            None
        );
    }

    #[test]
    fn unparsable_change_is_absence() {
        let body = json!({ "close": "100", "change": "", "percent_change": "1.0" });
        assert_eq!(normalize_quote(&body), None);
    }

    #[tokio::test]
    async fn offline_source_never_has_data() {
        assert_eq!(OfflineSource.quote("AAPL", "NASDAQ").await, None);
    }
}

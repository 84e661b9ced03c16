//! # enrich — Watchlist Enrichment Flow
//!
//! Overlay live prices onto stored snapshots.
//!
//! ```text
//! [s0, s1, s2, s3]                      (input order)
//!   │    │    │    └─ exchange not enrichable → passed through
//!   │    │    └────── quote() → None        → s2 unchanged
//!   │    └─────────── quote() → Some(q)     → s1 with q.price / q.change_percent
//!   └──────────────── quote() → Some(q)     → s0 with ...
//! join_all ─▶ [s0', s1', s2, s3]        (same length, same order)
//! ```
//!
//! Each fetch is an independent future; a failure only affects its own entry
//! and the result is emitted after every fetch has settled.

use futures_util::future::join_all;
use tracing::debug;

use crate::models::Stock;
use crate::quotes::QuoteSource;

// ─── Policy ───────────────────────────────────────────────────────────────────

/// Which entries are eligible for a live refresh.
#[derive(Debug, Clone)]
pub struct EnrichPolicy {
    exchanges: Vec<String>,
}

impl EnrichPolicy {
    pub fn new<I, S>(exchanges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            exchanges: exchanges
                .into_iter()
                .map(|e| e.as_ref().trim().to_uppercase())
                .collect(),
        }
    }

    pub fn is_enrichable(&self, stock: &Stock) -> bool {
        let exchange = stock.exchange.trim();
        self.exchanges.iter().any(|e| e.eq_ignore_ascii_case(exchange))
    }

    pub fn exchanges(&self) -> &[String] {
        &self.exchanges
    }
}

// ─── Flow ─────────────────────────────────────────────────────────────────────

/// Refresh one snapshot, or hand it back unchanged.
pub async fn enrich_one(source: &dyn QuoteSource, policy: &EnrichPolicy, stock: Stock) -> Stock {
    if !policy.is_enrichable(&stock) {
        return stock;
    }

    match source.quote(&stock.symbol, &stock.exchange).await {
        Some(quote) => {
            debug!(
                symbol = %stock.symbol,
                stale = stock.price,
                live = quote.price,
                "Live price applied"
            );
            stock.with_live_price(quote.price, quote.change_percent)
        }
        None => stock,
    }
}

/// Refresh a whole watchlist concurrently, preserving order.
pub async fn enrich_all(source: &dyn QuoteSource, policy: &EnrichPolicy, stocks: Vec<Stock>) -> Vec<Stock> {
    join_all(stocks.into_iter().map(|stock| enrich_one(source, policy, stock))).await
}

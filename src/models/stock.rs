//! # models::stock
//!
//! Defines [`Stock`] — the snapshot record that the catalog serves, the
//! watchlist persists and the enrichment flow refreshes.
//!
//! Identity is the numeric `id`.  Every other field is snapshot data that may
//! go stale between live-quote refreshes.

use serde::{Deserialize, Serialize};

// ─── Volatility ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Volatility {
    Low,
    Medium,
    High,
}

// ─── Stock ────────────────────────────────────────────────────────────────────

/// A saved or browsable stock snapshot.
///
/// Serialized in camelCase so stored documents and API payloads share one
/// shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    /// Stable, unique identifier.
    pub id: i64,

    /// Ticker symbol, e.g. `"AAPL"`, `"RELIANCE"`.
    pub symbol: String,

    pub name: String,

    pub sector: String,

    /// Exchange code, e.g. `"NASDAQ"`, `"NSE"`.  Decides whether the entry is
    /// eligible for a live price refresh.
    pub exchange: String,

    /// Last-known price.
    pub price: f64,

    /// Last-known percent change.
    pub change_percent: f64,

    /// Display string, e.g. `"2.9T"`.
    pub market_cap: String,

    pub pe_ratio: f64,

    pub volume: i64,

    pub volatility: Volatility,

    pub one_year_return: f64,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector_tag: Option<String>,

    /// Eligible for futures & options trading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_fno: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_label: Option<String>,
}

impl Stock {
    /// Copy of this snapshot with a fresh price overlay applied.
    pub fn with_live_price(&self, price: f64, change_percent: f64) -> Self {
        Self {
            price,
            change_percent,
            ..self.clone()
        }
    }

    /// Case-insensitive substring match on name or symbol.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle) || self.symbol.to_lowercase().contains(&needle)
    }
}

// ─── Catalog ──────────────────────────────────────────────────────────────────

/// The built-in stock universe served by `/api/stocks`.
///
/// Its prices are the stale fallback shown whenever a live quote is
/// unavailable.
#[derive(Debug, Clone)]
pub struct Catalog {
    stocks: Vec<Stock>,
}

const BUILTIN_CATALOG: &str = include_str!("../../data/stocks.json");

impl Catalog {
    pub fn new(stocks: Vec<Stock>) -> Self {
        Self { stocks }
    }

    /// Load the catalog bundled with the binary.
    pub fn builtin() -> anyhow::Result<Self> {
        let stocks: Vec<Stock> = serde_json::from_str(BUILTIN_CATALOG)?;
        Ok(Self::new(stocks))
    }

    pub fn all(&self) -> &[Stock] {
        &self.stocks
    }

    pub fn find(&self, id: i64) -> Option<&Stock> {
        self.stocks.iter().find(|s| s.id == id)
    }

    /// Case-insensitive sector filter.
    pub fn by_sector(&self, sector: &str) -> Vec<Stock> {
        self.stocks
            .iter()
            .filter(|s| s.sector.eq_ignore_ascii_case(sector))
            .cloned()
            .collect()
    }

    /// Case-insensitive substring match on name or symbol.  An empty needle
    /// matches everything.
    pub fn search(&self, needle: &str) -> Vec<Stock> {
        self.stocks.iter().filter(|s| s.matches(needle)).cloned()
            .collect()
    }

    /// Best `limit` performers by percent change, highest first.
    pub fn top_gainers(&self, limit: usize) -> Vec<Stock> {
        let mut stocks = self.stocks.clone();
        stocks.sort_by(|a, b| b.change_percent.total_cmp(&a.change_percent));
        stocks.truncate(limit);
        stocks
    }

    /// Worst `limit` performers by percent change, lowest first.
    pub fn top_losers(&self, limit: usize) -> Vec<Stock> {
        let mut stocks = self.stocks.clone();
        stocks.sort_by(|a, b| a.change_percent.total_cmp(&b.change_percent));
        stocks.truncate(limit);
        stocks
    }
}

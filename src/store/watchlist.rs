//! # store::watchlist — Watchlist Store
//!
//! `watchlists/{uid}` → `{ "stocks": [Stock, ...] }`
//!
//! | Operation      | No document         | Id present        | Id absent          |
//! |----------------|---------------------|-------------------|--------------------|
//! | `get`          | `[]`                | —                 | —                  |
//! | `add(stock)`   | create `[stock]`    | `false`, no write | append, `true`     |
//! | `remove(id)`   | `false`             | drop it, `true`   | `false`, no write  |
//!
//! `get` never fails: read errors are logged and reported as an empty list.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use super::{read_modify_write, Change, DocumentStore, StoreError, WATCHLISTS};
use crate::models::Stock;

#[derive(Debug, Default, Serialize, Deserialize)]
struct WatchlistDoc {
    #[serde(default)]
    stocks: Vec<Stock>,
}

impl WatchlistDoc {
    fn parse(value: Option<&Value>) -> Result<Option<Self>, StoreError> {
        value
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(StoreError::from)
    }

    fn to_value(&self) -> Result<Value, StoreError> {
        serde_json::to_value(self).map_err(StoreError::from)
    }
}

#[derive(Clone)]
pub struct WatchlistStore {
    docs: Arc<dyn DocumentStore>,
    max_attempts: u32,
}

impl WatchlistStore {
    pub fn new(docs: Arc<dyn DocumentStore>, max_attempts: u32) -> Self {
        Self { docs, max_attempts: max_attempts.max(1) }
    }

    pub async fn get(&self, uid: &str) -> Vec<Stock> {
        let loaded = match self.docs.load(WATCHLISTS, uid).await {
            Ok(doc) => doc,
            Err(e) => {
                error!(uid, "Error fetching watchlist: {e}");
                return Vec::new();
            }
        };

        match WatchlistDoc::parse(loaded.as_ref().map(|d| &d.value)) {
            Ok(doc) => doc.map(|d| d.stocks).unwrap_or_default(),
            Err(e) => {
                error!(uid, "Error fetching watchlist: {e}");
                Vec::new()
            }
        }
    }

    /// `Ok(true)` if the stock was appended, `Ok(false)` if its id was
    /// already saved.
    pub async fn add(&self, uid: &str, stock: &Stock) -> Result<bool, StoreError> {
        let added = read_modify_write(self.docs.as_ref(), WATCHLISTS, uid, self.max_attempts, |current| {
            let mut doc = WatchlistDoc::parse(current)?.unwrap_or_default();
            if doc.stocks.iter().any(|s| s.id == stock.id) {
                return Ok(Change::Skip(false));
            }
            doc.stocks.push(stock.clone());
            Ok(Change::Write(doc.to_value()?, true))
        })
        .await?;

        if added {
            info!(uid, stock_id = stock.id, symbol = %stock.symbol, "Added to watchlist");
        }
        Ok(added)
    }

    /// `Ok(true)` if an entry with `stock_id` was removed.
    pub async fn remove(&self, uid: &str, stock_id: i64) -> Result<bool, StoreError> {
        let removed = read_modify_write(self.docs.as_ref(), WATCHLISTS, uid, self.max_attempts, |current| {
            let Some(mut doc) = WatchlistDoc::parse(current)? else {
                return Ok(Change::Skip(false));
            };
            let before = doc.stocks.len();
            doc.stocks.retain(|s| s.id != stock_id);
            if doc.stocks.len() == before {
                return Ok(Change::Skip(false));
            }
            Ok(Change::Write(doc.to_value()?, true))
        })
        .await?;

        if removed {
            info!(uid, stock_id, "Removed from watchlist");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stock::fixtures::stock;
    use crate::store::{MemoryDocuments, Versioned};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn store() -> WatchlistStore {
        WatchlistStore::new(Arc::new(MemoryDocuments::new()), 5)
    }

    fn ids(stocks: &[Stock]) -> Vec<i64> {
        stocks.iter().map(|s| s.id).collect()
    }

    #[tokio::test]
    async fn missing_document_reads_as_empty() {
        assert!(store().get("nobody").await.is_empty());
    }

    #[tokio::test]
    async fn first_add_creates_document() {
        let store = store();
        assert!(store.add("u1", &stock(1, "AAPL", "NASDAQ")).await.unwrap());
        assert_eq!(ids(&store.get("u1").await), vec![1]);
    }

    #[tokio::test]
    async fn adding_twice_keeps_one_entry() {
        let store = store();
        let s = stock(7, "MSFT", "NASDAQ");
        assert!(store.add("u1", &s).await.unwrap());
        assert!(!store.add("u1", &s).await.unwrap());
        assert_eq!(ids(&store.get("u1").await), vec![7]);
    }

    #[tokio::test]
    async fn add_appends_in_order() {
        let store = store();
        for (id, sym) in [(3, "HDFCBANK"), (1, "RELIANCE"), (2, "TCS")] {
            store.add("u1", &stock(id, sym, "NSE")).await.unwrap();
        }
        assert_eq!(ids(&store.get("u1").await), vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn remove_drops_only_that_id() {
        let store = store();
        store.add("u1", &stock(1, "RELIANCE", "NSE")).await.unwrap();
        store.add("u1", &stock(2, "TCS", "NSE")).await.unwrap();

        assert!(store.remove("u1", 1).await.unwrap());
        assert_eq!(ids(&store.get("u1").await), vec![2]);
    }

    #[tokio::test]
    async fn removing_absent_id_changes_nothing() {
        let store = store();
        store.add("u1", &stock(2, "TCS", "NSE")).await.unwrap();

        assert!(!store.remove("u1", 99).await.unwrap());
        assert!(!store.remove("someone-else", 2).await.unwrap());
        assert_eq!(ids(&store.get("u1").await), vec![2]);
    }

    #[tokio::test]
    async fn watchlists_are_per_user() {
        let store = store();
        store.add("u1", &stock(1, "AAPL", "NASDAQ")).await.unwrap();
        assert!(store.get("u2").await.is_empty());
    }

    #[tokio::test]
    async fn malformed_document_reads_as_empty_but_blocks_writes() {
        let docs = Arc::new(MemoryDocuments::new());
        docs.create(WATCHLISTS, "u1", json!({ "stocks": "not-a-list" })).await.unwrap();
        let store = WatchlistStore::new(docs, 5);

        assert!(store.get("u1").await.is_empty());
        assert!(matches!(
            store.add("u1", &stock(1, "AAPL", "NASDAQ")).await,
            Err(StoreError::Malformed(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_of_same_stock_yield_one_entry() {
        let store = WatchlistStore::new(Arc::new(MemoryDocuments::new()), 50);
        let s = stock(5, "AAPL", "NASDAQ");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                let s = s.clone();
                tokio::spawn(async move { store.add("u1", &s).await })
            })
            .collect();

        let mut added = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                added += 1;
            }
        }

        assert_eq!(added, 1);
        assert_eq!(ids(&store.get("u1").await), vec![5]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_of_distinct_stocks_lose_nothing() {
        let store = WatchlistStore::new(Arc::new(MemoryDocuments::new()), 50);

        let handles: Vec<_> = (1..=16)
            .map(|id| {
                let store = store.clone();
                tokio::spawn(async move { store.add("u1", &stock(id, "SYM", "NYSE")).await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().unwrap());
        }

        let mut saved = ids(&store.get("u1").await);
        saved.sort_unstable();
        assert_eq!(saved, (1..=16).collect::<Vec<_>>());
    }

    // ─── Racing backend ───────────────────────────────────────────────────────

    /// Lets another writer slip in an add right before the first replace.
    struct RacingDocuments {
        inner: MemoryDocuments,
        raced: AtomicBool,
        replaces: AtomicUsize,
    }

    impl RacingDocuments {
        fn new() -> Self {
            Self {
                inner: MemoryDocuments::new(),
                raced: AtomicBool::new(false),
                replaces: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DocumentStore for RacingDocuments {
        async fn load(&self, c: &str, id: &str) -> Result<Option<Versioned<Value>>, StoreError> {
            self.inner.load(c, id).await
        }

        async fn create(&self, c: &str, id: &str, doc: Value) -> Result<bool, StoreError> {
            self.inner.create(c, id, doc).await
        }

        async fn replace(&self, c: &str, id: &str, doc: Value, expected: i64) -> Result<bool, StoreError> {
            self.replaces.fetch_add(1, Ordering::SeqCst);
            if !self.raced.swap(true, Ordering::SeqCst) {
                let current = self.inner.load(c, id).await?.expect("seeded");
                let mut other: WatchlistDoc = serde_json::from_value(current.value)?;
                other.stocks.push(stock(99, "INTRUDER", "NYSE"));
                self.inner.replace(c, id, other.to_value()?, current.version).await?;
            }
            self.inner.replace(c, id, doc, expected).await
        }
    }

    #[tokio::test]
    async fn conflicting_write_is_replayed_without_losing_either_add() {
        let docs = Arc::new(RacingDocuments::new());
        let store = WatchlistStore::new(docs.clone(), 5);
        store.add("u1", &stock(1, "AAPL", "NASDAQ")).await.unwrap();

        assert!(store.add("u1", &stock(2, "NVDA", "NASDAQ")).await.unwrap());

        assert_eq!(ids(&store.get("u1").await), vec![1, 99, 2]);
        assert_eq!(docs.replaces.load(Ordering::SeqCst), 2);
    }

    /// Every replace loses the race.
    struct AlwaysStale(MemoryDocuments);

    #[async_trait]
    impl DocumentStore for AlwaysStale {
        async fn load(&self, c: &str, id: &str) -> Result<Option<Versioned<Value>>, StoreError> {
            self.0.load(c, id).await
        }

        async fn create(&self, c: &str, id: &str, doc: Value) -> Result<bool, StoreError> {
            self.0.create(c, id, doc).await
        }

        async fn replace(&self, _: &str, _: &str, _: Value, _: i64) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn exhausted_retries_surface_as_contention() {
        let store = WatchlistStore::new(Arc::new(AlwaysStale(MemoryDocuments::new())), 3);
        store.add("u1", &stock(1, "AAPL", "NASDAQ")).await.unwrap();

        let err = store.remove("u1", 1).await.unwrap_err();
        assert!(matches!(err, StoreError::Contention(3)));
        assert_eq!(ids(&store.get("u1").await), vec![1]);
    }

    /// Backend that is always down.
    struct Down;

    #[async_trait]
    impl DocumentStore for Down {
        async fn load(&self, _: &str, _: &str) -> Result<Option<Versioned<Value>>, StoreError> {
            Err(StoreError::Backend("connection reset".into()))
        }

        async fn create(&self, _: &str, _: &str, _: Value) -> Result<bool, StoreError> {
            Err(StoreError::Backend("connection reset".into()))
        }

        async fn replace(&self, _: &str, _: &str, _: Value, _: i64) -> Result<bool, StoreError> {
            Err(StoreError::Backend("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn backend_failure_is_swallowed_by_get_only() {
        let store = WatchlistStore::new(Arc::new(Down), 5);
        assert!(store.get("u1").await.is_empty());
        assert!(store.add("u1", &stock(1, "AAPL", "NASDAQ")).await.is_err());
        assert!(store.remove("u1", 1).await.is_err());
    }
}

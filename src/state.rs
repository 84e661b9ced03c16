//! # state
//!
//! Shared application state handed to every Axum handler.
//!
//! ```text
//! AppState
//! ├─ config        immutable, loaded once at startup
//! ├─ twelve_data   raw provider client (used by /api/price)
//! ├─ quotes        dyn QuoteSource picked by QUOTE_PROVIDER
//! ├─ policy        enrichable exchanges
//! ├─ catalog       built-in stock list
//! ├─ watchlists ─┐
//! ├─ profiles  ──┴─ share one dyn DocumentStore (memory | postgres)
//! └─ auth          dyn AuthProvider picked by AUTH_PROVIDER
//! ```
//!
//! Nothing here is behind a lock; every mutable resource lives behind its
//! own port.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::Config;
use crate::enrich::EnrichPolicy;
use crate::identity::{self, AuthProvider};
use crate::models::Catalog;
use crate::quotes::{self, QuoteSource, TwelveData};
use crate::store::{DocumentStore, MemoryDocuments, ProfileStore, WatchlistStore};

// ─── AppState ─────────────────────────────────────────────────────────────────

pub struct AppState {
    pub config: Config,
    pub twelve_data: Arc<TwelveData>,
    pub quotes: Arc<dyn QuoteSource>,
    pub policy: EnrichPolicy,
    pub catalog: Catalog,
    pub watchlists: WatchlistStore,
    pub profiles: ProfileStore,
    pub auth: Arc<dyn AuthProvider>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wire everything that does not depend on the storage backend.
    pub fn new(
        config: Config,
        client: reqwest::Client,
        docs: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
    ) -> anyhow::Result<Self> {
        let twelve_data = Arc::new(TwelveData::new(
            client.clone(),
            config.twelve_data_base_url.clone(),
            config.twelve_data_api_key.clone(),
        ));
        let quotes = quotes::build_source(&config, client, Arc::clone(&twelve_data));
        let policy = EnrichPolicy::new(&config.enrich_exchanges);
        let catalog = Catalog::builtin().context("Failed to load built-in stock catalog")?;

        Ok(Self {
            twelve_data,
            quotes,
            policy,
            catalog,
            watchlists: WatchlistStore::new(Arc::clone(&docs), config.watchlist_max_retries),
            profiles: ProfileStore::new(docs, config.watchlist_max_retries),
            auth,
            config,
        })
    }
}

/// Build the state from configuration, connecting to PostgreSQL when the
/// `postgres` feature is on and `DATABASE_URL` is set.
pub async fn build_state(config: Config) -> anyhow::Result<SharedState> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("stockswipe/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let docs = document_store(&config).await?;
    let auth = identity::build_provider(&config, client.clone());

    info!(
        quotes = %config.quote_provider,
        auth = %config.auth_provider,
        exchanges = ?config.enrich_exchanges,
        "State initialised"
    );

    Ok(Arc::new(AppState::new(config, client, docs, auth)?))
}

#[cfg(feature = "postgres")]
async fn document_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match &config.database_url {
        Some(url) => {
            let pool = crate::store::postgres::init_pool(url).await?;
            Ok(Arc::new(crate::store::PgDocuments::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set — using in-memory documents");
            Ok(Arc::new(MemoryDocuments::new()))
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn document_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    if config.database_url.is_some() {
        tracing::warn!("DATABASE_URL ignored — built without the `postgres` feature");
    }
    info!("Using in-memory documents");
    Ok(Arc::new(MemoryDocuments::new()))
}

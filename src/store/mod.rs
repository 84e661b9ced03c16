//! # store — Document store port + Watchlist / Profile stores
//!
//! ## Layers
//! ```text
//! WatchlistStore / ProfileStore      domain rules (no duplicate ids, field merge)
//!          │  read_modify_write()    optimistic retry keyed on version token
//!          ▼
//! dyn DocumentStore                  load / create-if-absent / replace-if-version
//!   ├─ MemoryDocuments               tokio RwLock<HashMap>
//!   └─ PgDocuments                   JSONB + version column   (--features postgres)
//! ```
//!
//! Documents live under `collection/id` (e.g. `watchlists/{uid}`).  Every
//! write names the version it was computed from; a stale write is refused
//! and the whole read-modify-write is replayed.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod profile;
pub mod watchlist;

pub use memory::MemoryDocuments;
#[cfg(feature = "postgres")]
pub use postgres::PgDocuments;
pub use profile::ProfileStore;
pub use watchlist::WatchlistStore;

pub const WATCHLISTS: &str = "watchlists";
pub const USERS: &str = "users";

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document backend failure: {0}")]
    Backend(String),

    #[error("stored document is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("write conflict persisted after {0} attempts")]
    Contention(u32),
}

// ─── Port ─────────────────────────────────────────────────────────────────────

/// A document together with the version token it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: i64,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load(&self, collection: &str, id: &str) -> Result<Option<Versioned<Value>>, StoreError>;

    /// Create the document.  `Ok(false)` if one already exists.
    async fn create(&self, collection: &str, id: &str, doc: Value) -> Result<bool, StoreError>;

    /// Replace the document if it is still at `expected_version`.
    /// `Ok(false)` when another writer got there first.
    async fn replace(
        &self,
        collection: &str,
        id: &str,
        doc: Value,
        expected_version: i64,
    ) -> Result<bool, StoreError>;
}

// ─── Optimistic read-modify-write ─────────────────────────────────────────────

/// What a mutation decided to do with the current document.
pub enum Change<R> {
    /// Write this document and report `R`.
    Write(Value, R),
    /// Leave the document alone and report `R`.
    Skip(R),
}

/// Load → apply → conditional write, replayed on conflict.
///
/// `apply` sees the latest committed document on every attempt, so a
/// decision such as "id already present" is always taken against the state
/// the write is conditioned on.
pub async fn read_modify_write<R, F>(
    docs: &dyn DocumentStore,
    collection: &str,
    id: &str,
    max_attempts: u32,
    mut apply: F,
) -> Result<R, StoreError>
where
    F: FnMut(Option<&Value>) -> Result<Change<R>, StoreError> + Send,
    R: Send,
{
    for attempt in 1..=max_attempts {
        let current = docs.load(collection, id).await?;

        let (doc, outcome) = match apply(current.as_ref().map(|d| &d.value))? {
            Change::Skip(outcome) => return Ok(outcome),
            Change::Write(doc, outcome) => (doc, outcome),
        };

        let written = match &current {
            None => docs.create(collection, id, doc).await?,
            Some(existing) => docs.replace(collection, id, doc, existing.version).await?,
        };

        if written {
            return Ok(outcome);
        }

        debug!(collection, id, attempt, "Write conflict — replaying mutation");
    }

    Err(StoreError::Contention(max_attempts))
}

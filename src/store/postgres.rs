//! # store::postgres — PostgreSQL document backend
//!
//! One `documents` table: `(collection, id)` primary key, JSONB body and a
//! `version` counter bumped on every replace.
//!
//! ## Setup
//! 1. Create a database and set `DATABASE_URL` in `.env`
//! 2. `cargo run --features postgres` (the migration runs at startup)

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool, Row};
use tracing::info;

use super::{DocumentStore, StoreError, Versioned};

// ─── Pool Init ────────────────────────────────────────────────────────────────

pub async fn init_pool(database_url: &str) -> anyhow::Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    sqlx::query(include_str!("../../migrations/001_documents.sql"))
        .execute(&pool)
        .await
        .context("Failed to run migration 001_documents.sql")?;

    info!("✅ PostgreSQL connected and migrations applied");
    Ok(pool)
}

// ─── Adapter ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct PgDocuments {
    pool: PgPool,
}

impl PgDocuments {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl DocumentStore for PgDocuments {
    async fn load(&self, collection: &str, id: &str) -> Result<Option<Versioned<Value>>, StoreError> {
        let row = sqlx::query("SELECT body, version FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.map(|row| {
            let Json(value): Json<Value> = row.try_get("body").map_err(backend)?;
            let version: i64 = row.try_get("version").map_err(backend)?;
            Ok(Versioned { value, version })
        })
        .transpose()
    }

    async fn create(&self, collection: &str, id: &str, doc: Value) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body, version)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (collection, id) DO NOTHING
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(doc))
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(result.rows_affected() == 1)
    }

    async fn replace(
        &self,
        collection: &str,
        id: &str,
        doc: Value,
        expected_version: i64,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE documents
               SET body = $3, version = version + 1, updated_at = now()
             WHERE collection = $1 AND id = $2 AND version = $4
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(doc))
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(result.rows_affected() == 1)
    }
}

//! # routes::stocks
//!
//! Catalog browsing.  The detail view overlays a live price when the
//! stock's exchange is enrichable; listings and movers serve the catalog
//! snapshot as-is.

use axum::{
    extract::State,
    Json,
};
use serde::Deserialize;

use crate::{
    enrich::enrich_one,
    error::AppError,
    extract::{PathParam, QueryParams},
    models::Stock,
    state::SharedState,
};

#[derive(Debug, Deserialize)]
pub struct StocksQuery {
    pub sector: Option<String>,
    /// Substring of the name or symbol.
    pub q: Option<String>,
}

/// Size of the gainers and losers lists.
pub const MOVERS_LIMIT: usize = 10;

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// ─── GET /api/stocks ──────────────────────────────────────────────────────────

pub async fn list_stocks(
    State(state): State<SharedState>,
    QueryParams(query): QueryParams<StocksQuery>,
) -> Json<Vec<Stock>> {
    let mut stocks = match non_empty(&query.sector) {
        Some(sector) => state.catalog.by_sector(sector),
        None => state.catalog.all().to_vec(),
    };
    if let Some(needle) = non_empty(&query.q) {
        stocks.retain(|s| s.matches(needle));
    }
    Json(stocks)
}

// ─── GET /api/stocks/gainers | /api/stocks/losers ─────────────────────────────

pub async fn top_gainers(State(state): State<SharedState>) -> Json<Vec<Stock>> {
    Json(state.catalog.top_gainers(MOVERS_LIMIT))
}

pub async fn top_losers(State(state): State<SharedState>) -> Json<Vec<Stock>> {
    Json(state.catalog.top_losers(MOVERS_LIMIT))
}

// ─── GET /api/stocks/:id ──────────────────────────────────────────────────────

pub async fn get_stock(
    State(state): State<SharedState>,
    PathParam(id): PathParam<i64>,
) -> Result<Json<Stock>, AppError> {
    let stock = state
        .catalog
        .find(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound("Stock not found".into()))?;

    Ok(Json(enrich_one(state.quotes.as_ref(), &state.policy, stock).await))
}

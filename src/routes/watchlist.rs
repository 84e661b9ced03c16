//! # routes::watchlist
//!
//! The signed-in user's saved stocks.  Reads are enriched with live prices
//! before sorting; writes go through the optimistic watchlist store.

use std::str::FromStr;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::{
    auth::CurrentUser,
    enrich::enrich_all,
    error::AppError,
    extract::{JsonBody, PathParam, QueryParams},
    models::Stock,
    state::SharedState,
};

// ─── Sorting ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Order saved.
    #[default]
    Saved,
    PriceAsc,
    PriceDesc,
    ChangeDesc,
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "default" => Ok(SortOrder::Saved),
            "price-asc" => Ok(SortOrder::PriceAsc),
            "price-desc" => Ok(SortOrder::PriceDesc),
            "change-desc" => Ok(SortOrder::ChangeDesc),
            other => Err(AppError::BadRequest(format!(
                "Unknown sort '{other}'. Use default, price-asc, price-desc or change-desc"
            ))),
        }
    }
}

impl SortOrder {
    pub fn apply(self, stocks: &mut [Stock]) {
        match self {
            SortOrder::Saved => {}
            SortOrder::PriceAsc => stocks.sort_by(|a, b| a.price.total_cmp(&b.price)),
            SortOrder::PriceDesc => stocks.sort_by(|a, b| b.price.total_cmp(&a.price)),
            SortOrder::ChangeDesc => stocks.sort_by(|a, b| b.change_percent.total_cmp(&a.change_percent)),
        }
    }
}

// ─── GET /api/watchlist ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WatchlistQuery {
    pub sort: Option<String>,
}

pub async fn get_watchlist(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentUser>,
    QueryParams(query): QueryParams<WatchlistQuery>,
) -> Result<Json<Vec<Stock>>, AppError> {
    let order: SortOrder = query.sort.as_deref().unwrap_or_default().parse()?;

    let saved = state.watchlists.get(&current.user.uid).await;
    let mut stocks = enrich_all(state.quotes.as_ref(), &state.policy, saved).await;
    order.apply(&mut stocks);

    Ok(Json(stocks))
}

// ─── POST /api/watchlist ──────────────────────────────────────────────────────

/// Either a full snapshot or a catalog id.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AddRequest {
    ById {
        #[serde(rename = "stockId")]
        stock_id: i64,
    },
    Snapshot(Stock),
}

pub async fn add_stock(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentUser>,
    JsonBody(req): JsonBody<AddRequest>,
) -> Result<impl IntoResponse, AppError> {
    let stock = match req {
        AddRequest::Snapshot(stock) => stock,
        AddRequest::ById { stock_id } => state
            .catalog
            .find(stock_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Stock not found".into()))?,
    };

    let added = state
        .watchlists
        .add(&current.user.uid, &stock)
        .await
        .map_err(|e| {
            error!(uid = %current.user.uid, stock_id = stock.id, error = %e, "Error adding to watchlist");
            AppError::Unavailable("Error adding to watchlist".into())
        })?;

    if added {
        Ok((
            StatusCode::CREATED,
            Json(json!({ "ok": true, "added": true, "symbol": stock.symbol })),
        ))
    } else {
        Ok((
            StatusCode::OK,
            Json(json!({ "ok": true, "added": false, "message": "Stock already in watchlist" })),
        ))
    }
}

// ─── DELETE /api/watchlist/:id ────────────────────────────────────────────────

pub async fn remove_stock(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentUser>,
    PathParam(stock_id): PathParam<i64>,
) -> Result<impl IntoResponse, AppError> {
    let removed = state
        .watchlists
        .remove(&current.user.uid, stock_id)
        .await
        .map_err(|e| {
            error!(uid = %current.user.uid, stock_id, error = %e, "Error removing from watchlist");
            AppError::Unavailable("Error removing from watchlist".into())
        })?;

    if removed {
        Ok(Json(json!({ "ok": true, "removed": true })))
    } else {
        Err(AppError::NotFound("Stock not in watchlist".into()))
    }
}

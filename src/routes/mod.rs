//! # routes
//!
//! | Method | Path                  | Auth   | Handler                      |
//! |--------|-----------------------|--------|------------------------------|
//! | GET    | `/api/health`         | —      | [`health`]                   |
//! | GET    | `/api/price`          | —      | [`price::get_price`]         |
//! | GET    | `/api/stocks`         | —      | [`stocks::list_stocks`]      |
//! | GET    | `/api/stocks/gainers` | —      | [`stocks::top_gainers`]      |
//! | GET    | `/api/stocks/losers`  | —      | [`stocks::top_losers`]       |
//! | GET    | `/api/stocks/:id`     | —      | [`stocks::get_stock`]        |
//! | POST   | `/api/auth/signup`    | —      | [`auth::signup`]             |
//! | POST   | `/api/auth/login`     | —      | [`auth::login`]              |
//! | POST   | `/api/auth/logout`    | Bearer | [`auth::logout`]             |
//! | GET    | `/api/watchlist`      | Bearer | [`watchlist::get_watchlist`] |
//! | POST   | `/api/watchlist`      | Bearer | [`watchlist::add_stock`]     |
//! | DELETE | `/api/watchlist/:id`  | Bearer | [`watchlist::remove_stock`]  |
//! | GET    | `/api/profile`        | Bearer | [`profile::get_profile`]     |
//! | PUT    | `/api/profile`        | Bearer | [`profile::update_profile`]  |

use axum::{
    extract::State,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::auth::require_user;
use crate::state::SharedState;

pub mod auth;
pub mod price;
pub mod profile;
pub mod stocks;
pub mod watchlist;

/// All API routes with state attached.  Tracing and CORS layers are added by
/// the binary.
pub fn router(state: SharedState) -> Router {
    let protected = Router::new()
        .route("/api/auth/logout",   post(auth::logout))
        .route("/api/watchlist",     get(watchlist::get_watchlist).post(watchlist::add_stock))
        .route("/api/watchlist/:id", delete(watchlist::remove_stock))
        .route("/api/profile",       get(profile::get_profile).put(profile::update_profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user));

    Router::new()
        .route("/api/health",        get(health))
        .route("/api/price",         get(price::get_price))
        .route("/api/stocks",        get(stocks::list_stocks))
        .route("/api/stocks/gainers", get(stocks::top_gainers))
        .route("/api/stocks/losers", get(stocks::top_losers))
        .route("/api/stocks/:id",    get(stocks::get_stock))
        .route("/api/auth/signup",   post(auth::signup))
        .route("/api/auth/login",    post(auth::login))
        .merge(protected)
        .with_state(state)
}

// ─── GET /api/health ──────────────────────────────────────────────────────────

pub async fn health(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "ok":               true,
        "service":          "stockswipe",
        "version":          env!("CARGO_PKG_VERSION"),
        "quotes":           state.quotes.name(),
        "auth":             state.auth.name(),
        "apiKeyConfigured": state.twelve_data.has_api_key(),
        "enrichExchanges":  state.policy.exchanges(),
    }))
}


#[cfg(test)]
mod tests {
    use super::router;
    use super::testing::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn health_reports_providers() {
        let state = offline_state();
        let (status, body) = send(router(state), get("/api/health", None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["quotes"], "offline");
        assert_eq!(body["auth"], "memory");
        assert_eq!(body["apiKeyConfigured"], false);
        assert_eq!(body["enrichExchanges"], json!(["NASDAQ", "NYSE"]));
    }

    #[tokio::test]
    async fn protected_routes_require_bearer() {
        let state = offline_state();
        for (method, uri) in [
            ("GET", "/api/watchlist"),
            ("POST", "/api/watchlist"),
            ("DELETE", "/api/watchlist/1"),
            ("GET", "/api/profile"),
            ("PUT", "/api/profile"),
            ("POST", "/api/auth/logout"),
        ] {
            let (status, body) = send(router(state.clone()), request(method, uri, None, None)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn malformed_input_gets_json_error_body() {
        let state = offline_state();
        let token = signed_in(&state, "jane@example.com").await;

        let malformed_body = axum::http::Request::builder()
            .method("POST")
            .uri("/api/watchlist")
            .header("authorization", format!("Bearer {token}"))
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();

        for req in [
            request("DELETE", "/api/watchlist/abc", Some(&token), None),
            request("POST", "/api/watchlist", Some(&token), Some(json!({ "stockId": "five" }))),
            malformed_body,
            get("/api/stocks/abc", None),
            request("POST", "/api/auth/login", None, None),
        ] {
            let label = format!("{} {}", req.method(), req.uri());
            let (status, body) = send(router(state.clone()), req).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{label}");
            assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()), "{label}: {body}");
        }
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let state = offline_state();
        let (status, body) = send(router(state), get("/api/watchlist", Some("forged"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid or expired session");
    }
}

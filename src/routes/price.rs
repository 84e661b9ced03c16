//! # routes::price — Quote Proxy
//!
//! `GET /api/price?symbol=<TICKER>&exchange=<CODE>`
//!
//! Relays one Twelve Data quote with the server-side key injected, so the key
//! never reaches a client.  The provider body is returned as-is, including
//! provider-level error bodies.
//!
//! | Condition                  | Status | Body                                                   |
//! |----------------------------|--------|--------------------------------------------------------|
//! | `symbol` missing / empty   | 400    | `{"error":"Symbol is required"}`                       |
//! | no API key configured      | 500    | `{"error":"Server configuration error: API Key missing"}` |
//! | provider answered          | 200    | provider JSON                                          |
//! | network / decode failure   | 500    | `{"error":"Failed to fetch data"}`                     |

use axum::{
    extract::State,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::{error::AppError, extract::QueryParams, quotes::QuoteError, state::SharedState};

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub symbol: Option<String>,
    pub exchange: Option<String>,
}

pub async fn get_price(
    State(state): State<SharedState>,
    QueryParams(query): QueryParams<PriceQuery>,
) -> Result<Json<Value>, AppError> {
    let symbol = query
        .symbol
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Symbol is required".into()))?;

    let exchange = query
        .exchange
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| state.config.default_exchange.clone());

    match state.twelve_data.raw_quote(&symbol, &exchange).await {
        Ok((status, body)) => {
            debug!(%symbol, %exchange, %status, "Relayed provider quote");
            Ok(Json(body))
        }
        Err(QuoteError::MissingApiKey) => {
            error!("TWELVE_DATA_API_KEY is not set");
            Err(AppError::Config("API Key missing".into()))
        }
        Err(e) => {
            error!(%symbol, %exchange, error = %e, "Error fetching stock data");
            Err(AppError::Upstream)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::routes::router;
    use crate::routes::testing::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn missing_symbol_is_bad_request() {
        let state = offline_state();
        for uri in ["/api/price", "/api/price?symbol=", "/api/price?exchange=NYSE"] {
            let (status, body) = send(router(state.clone()), get(uri, None)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body, json!({ "error": "Symbol is required" }));
        }
    }

    #[tokio::test]
    async fn missing_key_is_configuration_error() {
        let state = offline_state();
        let (status, body) = send(router(state), get("/api/price?symbol=AAPL", None)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Server configuration error: API Key missing" }));
    }

    #[tokio::test]
    async fn relays_provider_body_with_default_exchange() {
        let server = MockServer::start().await;
        let provider_body = json!({
            "symbol": "TCS",
            "exchange": "NSE",
            "close": "3890.55",
            "change": "12.30",
            "percent_change": "0.32"
        });
        Mock::given(method("GET"))
            .and(path("/quote"))
            .and(query_param("symbol", "TCS"))
            .and(query_param("exchange", "NSE"))
            .and(query_param("apikey", "server-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(provider_body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let state = state_with(config(&[
            ("TWELVE_DATA_API_KEY", "server-key"),
            ("TWELVE_DATA_BASE_URL", uri.as_str()),
        ]));
        let (status, body) = send(router(state), get("/api/price?symbol=TCS", None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, provider_body);
    }

    #[tokio::test]
    async fn provider_error_body_is_passed_through() {
        let server = MockServer::start().await;
        let provider_body = json!({ "code": 404, "message": "symbol not found", "status": "error" });
        Mock::given(method("GET"))
            .and(path("/quote"))
            .respond_with(ResponseTemplate::new(200).set_body_json(provider_body.clone()))
            .mount(&server)
            .await;

        let uri = server.uri();
        let state = state_with(config(&[
            ("TWELVE_DATA_API_KEY", "server-key"),
            ("TWELVE_DATA_BASE_URL", uri.as_str()),
        ]));
        let (status, body) =
            send(router(state), get("/api/price?symbol=NOPE&exchange=NYSE", None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, provider_body);
    }

    #[tokio::test]
    async fn transport_failure_is_generic_error() {
        let state = state_with(config(&[
            ("TWELVE_DATA_API_KEY", "server-key"),
            ("TWELVE_DATA_BASE_URL", "http://127.0.0.1:9"),
        ]));
        let (status, body) = send(router(state), get("/api/price?symbol=AAPL", None)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Failed to fetch data" }));
    }
}

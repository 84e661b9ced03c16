//! # client — HTTP client for a StockSwipe server
//!
//! [`ApiClient`] is a thin typed wrapper over the REST surface.
//! [`ClientAuth`] keeps the id token and publishes the signed-in state as a
//! [`SessionSource`], which is what [`crate::session::IdentitySession`]
//! mirrors in the terminal client.

use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tokio::sync::{watch, RwLock};
use tracing::debug;

use crate::models::{Stock, User, UserProfile};
use crate::session::{AuthState, SessionSource};

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    pub id_token: String,
}

impl LoginResponse {
    fn user(&self) -> User {
        User {
            uid: self.uid.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddResponse {
    pub added: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// ─── ApiClient ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

/// Decode a success body, or turn `{"error": ".."}` into an error.
async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> anyhow::Result<T> {
    let status = resp.status();
    if status.is_success() {
        return resp.json::<T>().await.context("Malformed response body");
    }
    let body: Value = resp.json().await.unwrap_or(Value::Null);
    let message = body.get("error").and_then(Value::as_str).unwrap_or("Request failed");
    bail!("{message} ({status})")
}

impl ApiClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn signup(&self, email: &str, password: &str, confirm: &str) -> anyhow::Result<LoginResponse> {
        let resp = self
            .http
            .post(self.url("/api/auth/signup"))
            .json(&json!({ "email": email, "password": password, "confirmPassword": confirm }))
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn login(&self, email: &str, password: &str) -> anyhow::Result<LoginResponse> {
        let resp = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn logout(&self, token: &str) -> anyhow::Result<()> {
        let resp = self.http.post(self.url("/api/auth/logout")).bearer_auth(token).send().await?;
        decode::<Value>(resp).await.map(|_| ())
    }

    pub async fn profile(&self, token: &str) -> anyhow::Result<UserProfile> {
        let resp = self.http.get(self.url("/api/profile")).bearer_auth(token).send().await?;
        decode(resp).await
    }

    /// Catalog listing, optionally narrowed by sector and a name/symbol search.
    pub async fn stocks(&self, sector: Option<&str>, search: Option<&str>) -> anyhow::Result<Vec<Stock>> {
        let mut req = self.http.get(self.url("/api/stocks"));
        if let Some(sector) = sector {
            req = req.query(&[("sector", sector)]);
        }
        if let Some(search) = search {
            req = req.query(&[("q", search)]);
        }
        decode(req.send().await?).await
    }

    pub async fn gainers(&self) -> anyhow::Result<Vec<Stock>> {
        decode(self.http.get(self.url("/api/stocks/gainers")).send().await?).await
    }

    pub async fn losers(&self) -> anyhow::Result<Vec<Stock>> {
        decode(self.http.get(self.url("/api/stocks/losers")).send().await?).await
    }

    pub async fn stock(&self, id: i64) -> anyhow::Result<Stock> {
        let resp = self.http.get(self.url(&format!("/api/stocks/{id}"))).send().await?;
        decode(resp).await
    }

    pub async fn watchlist(&self, token: &str, sort: &str) -> anyhow::Result<Vec<Stock>> {
        let resp = self
            .http
            .get(self.url("/api/watchlist"))
            .query(&[("sort", sort)])
            .bearer_auth(token)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn add(&self, token: &str, stock_id: i64) -> anyhow::Result<AddResponse> {
        let resp = self
            .http
            .post(self.url("/api/watchlist"))
            .bearer_auth(token)
            .json(&json!({ "stockId": stock_id }))
            .send()
            .await?;
        decode(resp).await
    }

    /// `Ok(false)` when the stock was not in the watchlist.
    pub async fn remove(&self, token: &str, stock_id: i64) -> anyhow::Result<bool> {
        let resp = self
            .http
            .delete(self.url(&format!("/api/watchlist/{stock_id}")))
            .bearer_auth(token)
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        decode::<Value>(resp).await.map(|_| true)
    }
}

// ─── ClientAuth ───────────────────────────────────────────────────────────────

/// Holds the id token and publishes [`AuthState`] changes.
pub struct ClientAuth {
    api: ApiClient,
    token: RwLock<Option<String>>,
    state: watch::Sender<AuthState>,
}

impl ClientAuth {
    /// Starts out [`AuthState::Resolving`] until [`restore`](Self::restore)
    /// or a sign-in settles it.
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            token: RwLock::new(None),
            state: watch::channel(AuthState::Resolving).0,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Resolve a previously issued token.  A rejected token resolves to
    /// signed out.
    pub async fn restore(&self, token: Option<String>) {
        let Some(token) = token else {
            self.state.send_replace(AuthState::SignedOut);
            return;
        };

        match self.api.profile(&token).await {
            Ok(profile) => {
                let user = User {
                    uid: profile.uid,
                    email: Some(profile.email).filter(|e| !e.is_empty()),
                    display_name: Some(profile.name).filter(|n| !n.is_empty()),
                };
                *self.token.write().await = Some(token);
                self.state.send_replace(AuthState::SignedIn(user));
            }
            Err(e) => {
                debug!(error = %e, "Stored token rejected");
                self.state.send_replace(AuthState::SignedOut);
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> anyhow::Result<User> {
        let login = match self.api.login(email, password).await {
            Ok(login) => login,
            Err(e) => {
                self.state.send_replace(AuthState::SignedOut);
                return Err(e);
            }
        };
        let user = login.user();
        *self.token.write().await = Some(login.id_token);
        self.state.send_replace(AuthState::SignedIn(user.clone()));
        Ok(user)
    }
}

#[async_trait]
impl SessionSource for ClientAuth {
    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    async fn sign_out(&self) -> anyhow::Result<()> {
        if let Some(token) = self.token().await {
            self.api.logout(&token).await?;
        }
        *self.token.write().await = None;
        self.state.send_replace(AuthState::SignedOut);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{router, testing::offline_state};
    use crate::session::IdentitySession;
    use std::sync::Arc;
    use std::time::Duration;

    /// Serve the full router on an ephemeral port.
    async fn spawn_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(offline_state());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn api(base: &str) -> ApiClient {
        ApiClient::new(reqwest::Client::new(), base)
    }

    #[tokio::test]
    async fn end_to_end_watchlist_through_identity_session() {
        let base = spawn_server().await;
        let api = api(&base);
        api.signup("jane@example.com", "secret12!", "secret12!").await.unwrap();

        let auth = Arc::new(ClientAuth::new(api.clone()));
        let mut session = IdentitySession::init(auth.clone());
        assert!(session.is_loading());

        auth.sign_in("jane@example.com", "secret12!").await.unwrap();
        let snapshot = tokio::time::timeout(Duration::from_secs(2), session.ready()).await.unwrap();
        assert_eq!(snapshot.user.unwrap().display_name.as_deref(), Some("jane"));

        let token = auth.token().await.unwrap();
        assert!(api.add(&token, 5).await.unwrap().added);
        let again = api.add(&token, 5).await.unwrap();
        assert!(!again.added);
        assert_eq!(again.message.as_deref(), Some("Stock already in watchlist"));

        let list = api.watchlist(&token, "default").await.unwrap();
        assert_eq!(list.iter().map(|s| s.id).collect::<Vec<_>>(), vec![5]);

        assert!(api.remove(&token, 5).await.unwrap());
        assert!(!api.remove(&token, 5).await.unwrap());

        session.logout(|| async { Ok(()) }).await.unwrap();
        assert_eq!(session.current_user(), None);
        assert!(auth.token().await.is_none());
        assert!(api.watchlist(&token, "default").await.is_err());
    }

    #[tokio::test]
    async fn restore_resolves_valid_and_rejected_tokens() {
        let base = spawn_server().await;
        let api = api(&base);
        let login = api.signup("jane@example.com", "secret12!", "secret12!").await.unwrap();

        let auth = ClientAuth::new(api.clone());
        auth.restore(Some(login.id_token.clone())).await;
        assert_eq!(auth.subscribe().borrow().user().map(|u| u.uid.clone()), Some(login.uid));

        let auth = ClientAuth::new(api);
        auth.restore(Some("forged".into())).await;
        assert_eq!(*auth.subscribe().borrow(), AuthState::SignedOut);
    }

    #[tokio::test]
    async fn browses_catalog_search_and_movers() {
        let base = spawn_server().await;
        let api = api(&base);

        let hits = api.stocks(None, Some("micro")).await.unwrap();
        assert_eq!(hits.iter().map(|s| s.symbol.as_str()).collect::<Vec<_>>(), vec!["MSFT"]);

        let gainers = api.gainers().await.unwrap();
        let losers = api.losers().await.unwrap();
        assert!(!gainers.is_empty() && gainers.len() <= 10);
        assert_eq!(gainers.len(), losers.len());
        assert!(gainers[0].change_percent >= losers[0].change_percent);
    }

    #[tokio::test]
    async fn server_errors_carry_message() {
        let base = spawn_server().await;
        let err = api(&base).signup("a@b.c", "short", "short").await.unwrap_err();
        assert!(err.to_string().contains("Password must be 8-20 characters long."));

        let err = api(&base).stock(9999).await.unwrap_err();
        assert!(err.to_string().starts_with("Stock not found"));
    }
}

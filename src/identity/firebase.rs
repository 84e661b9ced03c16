//! # identity::firebase
//!
//! Firebase Authentication via the Identity Toolkit REST API.
//!
//! | Operation             | Endpoint                               |
//! |-----------------------|----------------------------------------|
//! | `create_account`      | `POST accounts:signUp`                 |
//! | `sign_in`             | `POST accounts:signInWithPassword`     |
//! | `verify_id_token`     | `POST accounts:lookup`                 |
//! | `update_display_name` | `POST accounts:update`                 |
//!
//! Every call carries `?key=<FIREBASE_API_KEY>`.  Failures come back as
//! `{"error": {"message": "EMAIL_EXISTS", ...}}` and are mapped through
//! [`AuthError::from_code`].

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{AuthError, AuthProvider};
use crate::models::{AuthSession, User};

pub const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

impl From<TokenResponse> for AuthSession {
    fn from(r: TokenResponse) -> Self {
        AuthSession {
            user: User {
                uid: r.local_id,
                email: r.email,
                display_name: r.display_name.filter(|n| !n.is_empty()),
            },
            id_token: r.id_token,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

// ─── Client ───────────────────────────────────────────────────────────────────

pub struct FirebaseAuth {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FirebaseAuth {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> Result<T, AuthError> {
        let url = format!("{}/accounts:{}", self.base_url, method);
        debug!(method, "Identity Toolkit request");

        let resp = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if resp.status().is_success() {
            return Ok(resp.json::<T>().await?);
        }

        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(Value::Null);
        let code = body
            .pointer("/error/message")
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN");
        warn!(method, %status, code, "Identity Toolkit rejected request");
        Err(AuthError::from_code(code))
    }
}

#[async_trait]
impl AuthProvider for FirebaseAuth {
    fn name(&self) -> &'static str {
        "firebase"
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let resp: TokenResponse = self
            .call("signUp", json!({ "email": email, "password": password, "returnSecureToken": true }))
            .await?;
        Ok(resp.into())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let resp: TokenResponse = self
            .call(
                "signInWithPassword",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        Ok(resp.into())
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<User, AuthError> {
        let resp: LookupResponse = self.call("lookup", json!({ "idToken": id_token })).await?;
        let user = resp.users.into_iter().next().ok_or(AuthError::InvalidToken)?;
        Ok(User {
            uid: user.local_id,
            email: user.email,
            display_name: user.display_name.filter(|n| !n.is_empty()),
        })
    }

    async fn update_display_name(&self, id_token: &str, name: &str) -> Result<(), AuthError> {
        let _: Value = self
            .call(
                "update",
                json!({ "idToken": id_token, "displayName": name, "returnSecureToken": false }),
            )
            .await?;
        Ok(())
    }

    /// Id tokens are stateless; they lapse on their own.
    async fn sign_out(&self, _id_token: &str) -> Result<(), AuthError> {
        debug!("Firebase sign-out is client-side only");
        Ok(())
    }
}

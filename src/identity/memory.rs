//! # identity::memory
//!
//! Process-local identity provider.  Accounts and tokens vanish on restart.
//! Mirrors the provider-side checks of the hosted backend (email shape,
//! six-character minimum) so error paths behave the same locally.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{AuthError, AuthProvider};
use crate::models::{AuthSession, User};

const MIN_PROVIDER_PASSWORD: usize = 6;

/// Live tokens kept per account; signing in past this revokes the oldest.
pub const MAX_SESSIONS_PER_ACCOUNT: usize = 5;

struct Account {
    uid: String,
    email: String,
    password: String,
    display_name: Option<String>,
    /// Issued tokens, oldest first.
    sessions: VecDeque<String>,
}

impl Account {
    fn user(&self) -> User {
        User {
            uid: self.uid.clone(),
            email: Some(self.email.clone()),
            display_name: self.display_name.clone(),
        }
    }
}

#[derive(Default)]
struct Inner {
    /// Keyed by lower-cased email.
    accounts: HashMap<String, Account>,
    /// id token → email key
    tokens: HashMap<String, String>,
}

impl Inner {
    /// New token for an existing account.
    fn issue(&mut self, key: &str) -> Result<String, AuthError> {
        let account = self.accounts.get_mut(key).ok_or(AuthError::InvalidCredentials)?;
        let token = Uuid::new_v4().to_string();
        account.sessions.push_back(token.clone());
        while account.sessions.len() > MAX_SESSIONS_PER_ACCOUNT {
            if let Some(stale) = account.sessions.pop_front() {
                self.tokens.remove(&stale);
            }
        }
        self.tokens.insert(token.clone(), key.to_string());
        Ok(token)
    }

    fn account_for(&self, id_token: &str) -> Result<&Account, AuthError> {
        let key = self.tokens.get(id_token).ok_or(AuthError::InvalidToken)?;
        self.accounts.get(key).ok_or(AuthError::InvalidToken)
    }

    fn account_for_mut(&mut self, id_token: &str) -> Result<&mut Account, AuthError> {
        let key = self.tokens.get(id_token).ok_or(AuthError::InvalidToken)?;
        self.accounts.get_mut(key).ok_or(AuthError::InvalidToken)
    }

    fn revoke(&mut self, id_token: &str) {
        if let Some(key) = self.tokens.remove(id_token) {
            if let Some(account) = self.accounts.get_mut(&key) {
                account.sessions.retain(|t| t != id_token);
            }
        }
    }
}

#[derive(Default)]
pub struct MemoryAuth {
    inner: RwLock<Inner>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let key = email.trim().to_lowercase();
        if !key.contains('@') {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < MIN_PROVIDER_PASSWORD {
            return Err(AuthError::WeakPassword);
        }

        let mut inner = self.inner.write().await;
        if inner.accounts.contains_key(&key) {
            return Err(AuthError::EmailExists);
        }

        let account = Account {
            uid: Uuid::new_v4().simple().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
            display_name: None,
            sessions: VecDeque::new(),
        };
        let user = account.user();
        inner.accounts.insert(key.clone(), account);
        let id_token = inner.issue(&key)?;

        info!(uid = %user.uid, "Account created");
        Ok(AuthSession { user, id_token })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let key = email.trim().to_lowercase();
        let mut inner = self.inner.write().await;

        let user = match inner.accounts.get(&key) {
            Some(account) if account.password == password => account.user(),
            _ => return Err(AuthError::InvalidCredentials),
        };
        let id_token = inner.issue(&key)?;
        Ok(AuthSession { user, id_token })
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<User, AuthError> {
        let inner = self.inner.read().await;
        Ok(inner.account_for(id_token)?.user())
    }

    async fn update_display_name(&self, id_token: &str, name: &str) -> Result<(), AuthError> {
        let mut inner = self.inner.write().await;
        inner.account_for_mut(id_token)?.display_name = Some(name.to_string());
        Ok(())
    }

    async fn sign_out(&self, id_token: &str) -> Result<(), AuthError> {
        self.inner.write().await.revoke(id_token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn account_lifecycle() {
        let auth = MemoryAuth::new();
        let created = auth.create_account("Jane@Example.com", "secret1!").await.unwrap();

        let user = auth.verify_id_token(&created.id_token).await.unwrap();
        assert_eq!(user.uid, created.user.uid);

        auth.update_display_name(&created.id_token, "jane").await.unwrap();
        let signed_in = auth.sign_in("jane@example.com", "secret1!").await.unwrap();
        assert_eq!(signed_in.user.display_name.as_deref(), Some("jane"));
        assert_ne!(signed_in.id_token, created.id_token);

        auth.sign_out(&created.id_token).await.unwrap();
        assert!(matches!(
            auth.verify_id_token(&created.id_token).await,
            Err(AuthError::InvalidToken)
        ));
        assert!(auth.verify_id_token(&signed_in.id_token).await.is_ok());
    }

    #[tokio::test]
    async fn repeated_sign_ins_revoke_the_oldest_tokens() {
        let auth = MemoryAuth::new();
        let first = auth.create_account("a@b.c", "secret1!").await.unwrap().id_token;

        let mut tokens = vec![first.clone()];
        for _ in 0..MAX_SESSIONS_PER_ACCOUNT + 2 {
            tokens.push(auth.sign_in("a@b.c", "secret1!").await.unwrap().id_token);
        }

        assert_eq!(auth.inner.read().await.tokens.len(), MAX_SESSIONS_PER_ACCOUNT);
        assert!(matches!(auth.verify_id_token(&first).await, Err(AuthError::InvalidToken)));
        for token in &tokens[tokens.len() - MAX_SESSIONS_PER_ACCOUNT..] {
            assert!(auth.verify_id_token(token).await.is_ok());
        }
    }

    #[tokio::test]
    async fn sign_out_frees_the_session_slot() {
        let auth = MemoryAuth::new();
        let token = auth.create_account("a@b.c", "secret1!").await.unwrap().id_token;
        auth.sign_out(&token).await.unwrap();

        let inner = auth.inner.read().await;
        assert!(inner.tokens.is_empty());
        assert!(inner.accounts["a@b.c"].sessions.is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let auth = MemoryAuth::new();
        auth.create_account("a@b.c", "secret1!").await.unwrap();
        assert!(matches!(
            auth.create_account("A@B.C", "secret1!").await,
            Err(AuthError::EmailExists)
        ));
    }

    #[tokio::test]
    async fn provider_side_checks() {
        let auth = MemoryAuth::new();
        assert!(matches!(auth.create_account("nope", "secret1!").await, Err(AuthError::InvalidEmail)));
        assert!(matches!(auth.create_account("a@b.c", "12345").await, Err(AuthError::WeakPassword)));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let auth = MemoryAuth::new();
        auth.create_account("a@b.c", "secret1!").await.unwrap();
        assert!(matches!(auth.sign_in("a@b.c", "other1!").await, Err(AuthError::InvalidCredentials)));
        assert!(matches!(auth.sign_in("x@b.c", "secret1!").await, Err(AuthError::InvalidCredentials)));
    }
}

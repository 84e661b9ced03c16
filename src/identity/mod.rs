//! # identity — Auth Provider port
//!
//! Account creation, sign-in and id-token verification are delegated to an
//! external identity provider.  The server only ever sees opaque id tokens.
//!
//! | Adapter            | `AUTH_PROVIDER` | Notes                                  |
//! |--------------------|-----------------|----------------------------------------|
//! | [`FirebaseAuth`]   | `firebase`      | Identity Toolkit REST, `FIREBASE_API_KEY` |
//! | [`MemoryAuth`]     | `memory`        | process-local accounts, dev / tests    |

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{AuthBackend, Config};
use crate::models::{AuthSession, User};

pub mod firebase;
pub mod memory;

pub use firebase::FirebaseAuth;
pub use memory::MemoryAuth;

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already in use")]
    EmailExists,

    #[error("Password is too weak")]
    WeakPassword,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired session")]
    InvalidToken,

    /// Provider code with no dedicated mapping.
    #[error("Authentication failed ({0})")]
    Provider(String),

    #[error("Authentication service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

impl AuthError {
    /// Map a provider error code.  Codes may carry a trailing detail
    /// (`"WEAK_PASSWORD : Password should be at least 6 characters"`).
    pub fn from_code(code: &str) -> Self {
        let head = code.split(':').next().unwrap_or(code).trim();
        match head {
            "EMAIL_EXISTS" => AuthError::EmailExists,
            "WEAK_PASSWORD" => AuthError::WeakPassword,
            "INVALID_EMAIL" | "MISSING_EMAIL" => AuthError::InvalidEmail,
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
                AuthError::InvalidCredentials
            }
            "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_NOT_FOUND" => AuthError::InvalidToken,
            other => AuthError::Provider(other.to_string()),
        }
    }

    /// The caller can fix this by changing their input.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, AuthError::Provider(_) | AuthError::Transport(_))
    }
}

// ─── Port ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_account(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    async fn verify_id_token(&self, id_token: &str) -> Result<User, AuthError>;

    async fn update_display_name(&self, id_token: &str, name: &str) -> Result<(), AuthError>;

    async fn sign_out(&self, id_token: &str) -> Result<(), AuthError>;
}

pub fn build_provider(config: &Config, client: reqwest::Client) -> Arc<dyn AuthProvider> {
    match config.auth_provider {
        AuthBackend::Firebase => Arc::new(FirebaseAuth::new(
            client,
            firebase::DEFAULT_BASE_URL,
            config.firebase_api_key.clone().unwrap_or_default(),
        )),
        AuthBackend::Memory => Arc::new(MemoryAuth::new()),
    }
}

// ─── Signup rules ─────────────────────────────────────────────────────────────

const PASSWORD_SYMBOLS: &str = "!@#$%^&*";

/// Reject a signup form before it reaches the provider.  `Err` carries the
/// message shown to the user.
pub fn validate_signup(password: &str, confirm_password: &str) -> Result<(), &'static str> {
    let len = password.chars().count();
    if !(8..=20).contains(&len) {
        return Err("Password must be 8-20 characters long.");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain a number.");
    }
    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        return Err("Password must contain a symbol.");
    }
    if password != confirm_password {
        return Err("Passwords do not match");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_rules_in_order() {
        assert_eq!(validate_signup("a1!", "a1!"), Err("Password must be 8-20 characters long."));
        assert_eq!(
            validate_signup("abcdefghijklmnop1!xyz", "abcdefghijklmnop1!xyz"),
            Err("Password must be 8-20 characters long.")
        );
        assert_eq!(validate_signup("abcdefgh!", "abcdefgh!"), Err("Password must contain a number."));
        assert_eq!(validate_signup("abcdefgh1", "abcdefgh1"), Err("Password must contain a symbol."));
        assert_eq!(validate_signup("abcdefg1!", "abcdefg1?"), Err("Passwords do not match"));
        assert_eq!(validate_signup("abcdefg1!", "abcdefg1!"), Ok(()));
    }

    #[test]
    fn provider_codes_map_to_messages() {
        assert_eq!(AuthError::from_code("EMAIL_EXISTS").to_string(), "Email already in use");
        assert_eq!(
            AuthError::from_code("WEAK_PASSWORD : Password should be at least 6 characters").to_string(),
            "Password is too weak"
        );
        assert_eq!(
            AuthError::from_code("INVALID_LOGIN_CREDENTIALS").to_string(),
            "Invalid email or password"
        );
        assert!(matches!(AuthError::from_code("TOKEN_EXPIRED"), AuthError::InvalidToken));
        assert!(matches!(
            AuthError::from_code("QUOTA_EXCEEDED"),
            AuthError::Provider(ref c) if c == "QUOTA_EXCEEDED"
        ));
    }

    #[test]
    fn only_provider_faults_are_server_errors() {
        assert!(AuthError::EmailExists.is_user_error());
        assert!(AuthError::InvalidToken.is_user_error());
        assert!(!AuthError::Provider("X".into()).is_user_error());
    }
}

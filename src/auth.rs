//! # auth — Bearer-token middleware
//!
//! Guards the per-user endpoints (watchlist, profile, logout).
//!
//! ```bash
//! curl -H "Authorization: Bearer <idToken>" http://localhost:3000/api/watchlist
//! ```
//!
//! The token is verified with the configured identity provider and the
//! resolved [`CurrentUser`] is stored in the request extensions.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};

use crate::error::AppError;
use crate::identity::AuthError;
use crate::models::User;
use crate::state::SharedState;

/// The signed-in caller, available to handlers as `Extension<CurrentUser>`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub id_token: String,
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub async fn require_user(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();

    let Some(token) = bearer_token(&request).map(str::to_string) else {
        warn!(path = %path, "Missing bearer token");
        return Err(AppError::Unauthorized("Please login to continue".into()));
    };

    let user = match state.auth.verify_id_token(&token).await {
        Ok(user) => user,
        Err(e) if e.is_user_error() => {
            warn!(path = %path, error = %e, "Rejected bearer token");
            return Err(AppError::Unauthorized(AuthError::InvalidToken.to_string()));
        }
        Err(e) => {
            error!(path = %path, error = %e, "Token verification failed");
            return Err(AppError::Unavailable("Authentication service unavailable".into()));
        }
    };

    request.extensions_mut().insert(CurrentUser { user, id_token: token });
    Ok(next.run(request).await)
}

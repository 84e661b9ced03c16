//! # routes::auth
//!
//! Account endpoints on top of the configured identity provider.
//!
//! Signup: validate the password rules → create the account → set the
//! display name to the email prefix → write `users/{uid}`.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    auth::CurrentUser,
    error::AppError,
    extract::JsonBody,
    identity::{validate_signup, AuthError},
    models::{user::email_prefix, AuthSession, UserProfile},
    state::SharedState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn session_body(session: &AuthSession) -> serde_json::Value {
    json!({
        "uid":         session.user.uid,
        "email":       session.user.email,
        "displayName": session.user.display_name,
        "idToken":     session.id_token,
    })
}

/// Provider errors the user can act on keep their message; the rest become
/// `fallback`.
fn provider_error(e: AuthError, fallback: &str) -> AppError {
    if e.is_user_error() {
        AppError::BadRequest(e.to_string())
    } else {
        error!(error = %e, "{fallback}");
        AppError::Unavailable(fallback.to_string())
    }
}

// ─── POST /api/auth/signup ────────────────────────────────────────────────────

pub async fn signup(
    State(state): State<SharedState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_signup(&req.password, &req.confirm_password).map_err(|msg| AppError::BadRequest(msg.into()))?;

    let mut session = state
        .auth
        .create_account(&req.email, &req.password)
        .await
        .map_err(|e| provider_error(e, "Registration failed"))?;

    let name = email_prefix(&req.email).to_string();
    state
        .auth
        .update_display_name(&session.id_token, &name)
        .await
        .map_err(|e| provider_error(e, "Registration failed"))?;
    session.user.display_name = Some(name);

    let profile = UserProfile::for_new_account(&session.user.uid, &req.email);
    state.profiles.put(&profile).await.map_err(|e| {
        error!(uid = %session.user.uid, error = %e, "Profile creation failed");
        AppError::Unavailable("Registration failed".into())
    })?;

    info!(uid = %session.user.uid, "Account created");
    Ok((StatusCode::CREATED, Json(session_body(&session))))
}

// ─── POST /api/auth/login ─────────────────────────────────────────────────────

pub async fn login(
    State(state): State<SharedState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    match state.auth.sign_in(&req.email, &req.password).await {
        Ok(session) => {
            info!(uid = %session.user.uid, "Signed in");
            Ok(Json(session_body(&session)))
        }
        Err(e) if e.is_user_error() => {
            warn!(error = %e, "Sign-in rejected");
            Err(AppError::Unauthorized(e.to_string()))
        }
        Err(e) => Err(provider_error(e, "Login failed")),
    }
}

// ─── POST /api/auth/logout ────────────────────────────────────────────────────

pub async fn logout(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth
        .sign_out(&current.id_token)
        .await
        .map_err(|e| provider_error(e, "Error logging out"))?;

    info!(uid = %current.user.uid, "Signed out");
    Ok(Json(json!({ "ok": true, "message": "Logged out successfully" })))
}

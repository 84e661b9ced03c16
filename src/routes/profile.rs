//! # routes::profile

use axum::{extract::State, Extension, Json};
use tracing::{error, info};

use crate::{
    auth::CurrentUser,
    error::AppError,
    extract::JsonBody,
    models::{ProfileUpdate, UserProfile},
    state::SharedState,
};

// ─── GET /api/profile ─────────────────────────────────────────────────────────

/// Stored profile, or one derived from the account when none exists yet.
pub async fn get_profile(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<UserProfile>, AppError> {
    let stored = state.profiles.get(&current.user.uid).await.map_err(|e| {
        error!(uid = %current.user.uid, error = %e, "Error fetching profile");
        AppError::Unavailable("Failed to load profile".into())
    })?;

    Ok(Json(stored.unwrap_or_else(|| UserProfile::from_user(&current.user))))
}

// ─── PUT /api/profile ─────────────────────────────────────────────────────────

pub async fn update_profile(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentUser>,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> Result<Json<UserProfile>, AppError> {
    if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::BadRequest("Name cannot be empty".into()));
    }

    let merged = state.profiles.update(&current.user, &update).await.map_err(|e| {
        error!(uid = %current.user.uid, error = %e, "Error updating profile");
        AppError::Unavailable("Failed to update profile".into())
    })?;

    if let Some(name) = update.name.as_deref() {
        if current.user.display_name.as_deref() != Some(name) {
            state
                .auth
                .update_display_name(&current.id_token, name)
                .await
                .map_err(|e| {
                    error!(uid = %current.user.uid, error = %e, "Display name sync failed");
                    AppError::Unavailable("Failed to update profile".into())
                })?;
        }
    }

    info!(uid = %current.user.uid, "Profile updated successfully");
    Ok(Json(merged))
}

//! # models::user
//!
//! Identity and profile records.
//!
//! `User` = what the identity provider reports for a signed-in account.
//! `UserProfile` = the app-owned profile document stored under `users/{uid}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── User ─────────────────────────────────────────────────────────────────────

/// A signed-in account as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Result of a successful sign-in / sign-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user: User,
    pub id_token: String,
}

// ─── UserProfile ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub gender: String,
    /// Avatar image (URL or data URI).
    #[serde(default)]
    pub image: String,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Profile created at signup: display name defaults to the email prefix.
    pub fn for_new_account(uid: &str, email: &str) -> Self {
        Self {
            uid: uid.to_string(),
            email: email.to_string(),
            name: email_prefix(email).to_string(),
            bio: String::new(),
            dob: String::new(),
            gender: String::new(),
            image: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Profile synthesised from provider data when no document exists yet.
    pub fn from_user(user: &User) -> Self {
        Self {
            uid: user.uid.clone(),
            email: user.email.clone().unwrap_or_default(),
            name: user.display_name.clone().unwrap_or_default(),
            bio: String::new(),
            dob: String::new(),
            gender: String::new(),
            image: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Field-merge: only fields present in `update` are overwritten.
    pub fn merge(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(bio) = &update.bio {
            self.bio = bio.clone();
        }
        if let Some(dob) = &update.dob {
            self.dob = dob.clone();
        }
        if let Some(gender) = &update.gender {
            self.gender = gender.clone();
        }
        if let Some(image) = &update.image {
            self.image = image.clone();
        }
    }
}

/// Partial profile update.  Email is not editable here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub image: Option<String>,
}

pub fn email_prefix(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

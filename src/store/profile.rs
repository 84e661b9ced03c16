//! # store::profile — `users/{uid}` profile documents

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use super::{read_modify_write, Change, DocumentStore, StoreError, USERS};
use crate::models::{ProfileUpdate, User, UserProfile};

#[derive(Clone)]
pub struct ProfileStore {
    docs: Arc<dyn DocumentStore>,
    max_attempts: u32,
}

fn parse(value: Option<&Value>) -> Result<Option<UserProfile>, StoreError> {
    value
        .map(|v| serde_json::from_value(v.clone()))
        .transpose()
        .map_err(StoreError::from)
}

impl ProfileStore {
    pub fn new(docs: Arc<dyn DocumentStore>, max_attempts: u32) -> Self {
        Self { docs, max_attempts: max_attempts.max(1) }
    }

    pub async fn get(&self, uid: &str) -> Result<Option<UserProfile>, StoreError> {
        let doc = self.docs.load(USERS, uid).await?;
        parse(doc.as_ref().map(|d| &d.value))
    }

    /// Write the whole profile, replacing any existing document.
    pub async fn put(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let value = serde_json::to_value(profile)?;
        read_modify_write(self.docs.as_ref(), USERS, &profile.uid, self.max_attempts, |_| {
            Ok(Change::Write(value.clone(), ()))
        })
        .await?;

        info!(uid = %profile.uid, "Profile saved");
        Ok(())
    }

    /// Merge the provided fields.  A user without a stored profile gets one
    /// seeded from the provider's account data.
    pub async fn update(&self, user: &User, update: &ProfileUpdate) -> Result<UserProfile, StoreError> {
        let merged = read_modify_write(self.docs.as_ref(), USERS, &user.uid, self.max_attempts, |current| {
            let mut profile = parse(current)?.unwrap_or_else(|| UserProfile::from_user(user));
            profile.merge(update);
            Ok(Change::Write(serde_json::to_value(&profile)?, profile))
        })
        .await?;

        info!(uid = %user.uid, "Profile updated");
        Ok(merged)
    }
}

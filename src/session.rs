//! # session — Identity Session
//!
//! Client-side mirror of "who is signed in", fed by a [`SessionSource`].
//!
//! ```text
//!  SessionSource ──watch<AuthState>──▶ mirror task ──watch<Snapshot>──▶ IdentitySession
//!                                                                        ├─ current_user()
//!                                                                        ├─ is_loading()
//!                                                                        ├─ changed()
//!                                                                        └─ logout(navigate)
//! ```
//!
//! Lifecycle: [`IdentitySession::init`] subscribes and spawns the mirror;
//! [`IdentitySession::shutdown`] (or drop) aborts it.  `is_loading()` stays
//! true until the source has resolved the persisted session once.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::User;

// ─── Source ───────────────────────────────────────────────────────────────────

/// What a session source publishes.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// Persisted session not resolved yet.
    Resolving,
    SignedOut,
    SignedIn(User),
}

impl AuthState {
    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::SignedIn(user) => Some(user),
            _ => None,
        }
    }
}

#[async_trait]
pub trait SessionSource: Send + Sync {
    fn subscribe(&self) -> watch::Receiver<AuthState>;

    async fn sign_out(&self) -> anyhow::Result<()>;
}

// ─── Session ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub user: Option<User>,
    pub loading: bool,
}

impl Snapshot {
    fn initial() -> Self {
        Self { user: None, loading: true }
    }

    fn from_state(state: &AuthState) -> Option<Self> {
        match state {
            AuthState::Resolving => None,
            AuthState::SignedOut => Some(Self { user: None, loading: false }),
            AuthState::SignedIn(user) => Some(Self { user: Some(user.clone()), loading: false }),
        }
    }
}

pub struct IdentitySession {
    source: Arc<dyn SessionSource>,
    tx: Arc<watch::Sender<Snapshot>>,
    rx: watch::Receiver<Snapshot>,
    mirror: JoinHandle<()>,
}

impl IdentitySession {
    /// Subscribe to `source` and start mirroring.  Must be called inside a
    /// Tokio runtime.
    pub fn init(source: Arc<dyn SessionSource>) -> Self {
        let (tx, rx) = watch::channel(Snapshot::initial());
        let tx = Arc::new(tx);
        let mut feed = source.subscribe();

        let mirror_tx = Arc::clone(&tx);
        let mirror = tokio::spawn(async move {
            loop {
                let state = feed.borrow_and_update().clone();
                if let Some(snapshot) = Snapshot::from_state(&state) {
                    debug!(signed_in = snapshot.user.is_some(), "Session state changed");
                    mirror_tx.send_replace(snapshot);
                }
                if feed.changed().await.is_err() {
                    debug!("Session source closed");
                    break;
                }
            }
        });

        Self { source, tx, rx, mirror }
    }

    pub fn current_user(&self) -> Option<User> {
        self.rx.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.rx.borrow().loading
    }

    pub fn snapshot(&self) -> Snapshot {
        self.rx.borrow().clone()
    }

    /// Wait for the next mirrored change.  `false` once the mirror is gone,
    /// whether it was shut down or its source closed.
    pub async fn changed(&mut self) -> bool {
        if self.mirror.is_finished() {
            return false;
        }
        tokio::select! {
            biased;
            changed = self.rx.changed() => changed.is_ok(),
            _ = &mut self.mirror => false,
        }
    }

    /// Wait until the initial resolution is done.  Returns early, still
    /// loading, if the mirror stops first.
    pub async fn ready(&mut self) -> Snapshot {
        while self.is_loading() {
            if !self.changed().await {
                break;
            }
        }
        self.snapshot()
    }

    /// A separate receiver for observers that outlive a borrow of `self`.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.rx.clone()
    }

    /// Sign out, clear the mirrored identity, then run `navigate`.
    ///
    /// If signing out fails nothing changes.  Once it succeeds the session is
    /// signed out regardless of what `navigate` does.
    pub async fn logout<F, Fut>(&self, navigate: F) -> anyhow::Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        self.source.sign_out().await.context("Error logging out")?;
        self.tx.send_replace(Snapshot { user: None, loading: false });
        info!("Signed out");

        if let Err(e) = navigate().await {
            warn!(error = %e, "Post-logout navigation failed");
            return Err(e.context("Navigation after logout failed"));
        }
        Ok(())
    }

    pub fn shutdown(&self) {
        self.mirror.abort();
    }
}

impl Drop for IdentitySession {
    fn drop(&mut self) {
        self.mirror.abort();
    }
}

//! Foreground/background transitions and the re-auth requirement.
//!
//! The platform shim forwards lifecycle events here. Backgrounding with
//! a live access token locks the session gate so the next foreground
//! pass must clear a biometric challenge; the very first launch is
//! exempt, since there is nothing to protect before the user has ever
//! seen the app.

use tracing::debug;

use crate::auth::CredentialStore;

use super::SessionState;

/// Platform-delivered app state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Foregrounded,
    Backgrounded,
}

/// Observes lifecycle events and flags mandatory re-authentication.
#[derive(Clone)]
pub struct AppLifecycleGate<S> {
    state: SessionState,
    store: S,
}

impl<S: CredentialStore> AppLifecycleGate<S> {
    pub fn new(state: SessionState, store: S) -> Self {
        Self { state, store }
    }

    /// Handle a lifecycle event, awaiting the credential read on
    /// backgrounding. Platform shims that cannot await use [`notify`].
    ///
    /// [`notify`]: AppLifecycleGate::notify
    pub async fn handle(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Foregrounded => {
                self.state.mark_foregrounded();
            }
            LifecycleEvent::Backgrounded => {
                if self.state.is_first_launch() {
                    debug!("backgrounded before first foreground, skipping re-auth flag");
                    return;
                }
                // The flag is eventually-set: if the app foregrounds before
                // this read completes, the gate may lock slightly after the
                // UI has resumed. Subscribers react the moment it flips.
                let has_token = self
                    .store
                    .access_token()
                    .await
                    .is_some_and(|t| !t.is_empty());
                if has_token {
                    debug!("backgrounded with live token, re-auth required on return");
                    self.state.require_reauth();
                }
            }
        }
    }

    /// Fire-and-forget variant of [`handle`] for synchronous callers
    /// (platform lifecycle callbacks).
    ///
    /// [`handle`]: AppLifecycleGate::handle
    pub fn notify(&self, event: LifecycleEvent) {
        let gate = self.clone();
        tokio::spawn(async move {
            gate.handle(event).await;
        });
    }
}

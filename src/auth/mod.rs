//! Authentication module for managing credentials and the silent-refresh path.
//!
//! This module provides:
//! - `CredentialStore`: durable access/refresh token storage (keychain-backed)
//! - `SessionAuthenticator`: single-retry token refresh on 401 responses
//! - `persist_login` / `logout`: the entry and exit points of an
//!   authenticated session
//!
//! All failure paths resolve to logged-out (absent tokens); nothing here
//! surfaces an uncaught error across the HTTP boundary.

pub mod authenticator;
pub mod credentials;

pub use authenticator::{RetryDecision, SessionAuthenticator, AUTH_RETRY_HEADER};
pub use credentials::{CredentialStore, KeyringCredentialStore, MemoryCredentialStore};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::api::{AuthApi, LoginResponse};

/// Persist the token pair from a successful login response.
///
/// Errors if the server rejected the login or the response carries no
/// token; a missing refresh token is allowed (the session simply cannot
/// be silently refreshed later).
pub async fn persist_login<S: CredentialStore>(store: &S, response: &LoginResponse) -> Result<()> {
    if !response.success {
        anyhow::bail!("login rejected by server");
    }
    let token = response
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .context("login response missing access token")?;

    store.save_access_token(token).await?;
    if let Some(refresh) = response.refresh_token.as_deref().filter(|t| !t.is_empty()) {
        store.save_refresh_token(refresh).await?;
    }

    info!("session established");
    Ok(())
}

/// End the session: best-effort server-side invalidation, then durable
/// local credential clearing. A failed logout call never blocks the
/// local clear.
pub async fn logout<S: CredentialStore>(api: &AuthApi, store: &S) -> Result<()> {
    if let Some(refresh) = store.refresh_token().await.filter(|t| !t.is_empty()) {
        if let Err(e) = api.logout(&refresh).await {
            warn!(error = %e, "server-side logout failed, clearing local credentials anyway");
        }
    }
    store.clear_credentials().await?;
    info!("session cleared");
    Ok(())
}

//! Durable credential storage for the session core.
//!
//! Tokens survive process restarts and are shared with the request-signing
//! layer, which reads the access token for the `Authorization` header.
//! Reads never fail: an unreadable store reports absent tokens so the app
//! falls back to logged-out rather than proceeding with a half-valid session.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use keyring::Entry;
use tracing::warn;

/// Keychain service name shared by all Shopfront credential entries
const SERVICE_NAME: &str = "shopfront-admin";

/// Logical key for the short-lived access token
const ACCESS_TOKEN_KEY: &str = "auth_token";

/// Logical key for the long-lived refresh token
const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Durable, process-independent storage for the access/refresh token pair.
///
/// Contract: reads never fail (absent or unreadable both report `None`),
/// writes are last-write-wins per key, and `clear_credentials` is
/// idempotent. All methods may suspend on I/O.
pub trait CredentialStore: Clone + Send + Sync + 'static {
    fn access_token(&self) -> impl Future<Output = Option<String>> + Send;
    fn refresh_token(&self) -> impl Future<Output = Option<String>> + Send;
    fn save_access_token(&self, token: &str) -> impl Future<Output = Result<()>> + Send;
    fn save_refresh_token(&self, token: &str) -> impl Future<Output = Result<()>> + Send;
    fn clear_credentials(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Credential store backed by the OS keychain.
///
/// Keyring calls are blocking, so they run on the blocking thread pool
/// rather than an async worker. A failed dispatch is reported as absent
/// tokens on the read path.
#[derive(Clone)]
pub struct KeyringCredentialStore {
    service: &'static str,
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME,
        }
    }

    /// Use a custom keychain service name (separate credential sets, tests)
    pub fn with_service(service: &'static str) -> Self {
        Self { service }
    }

    fn read_entry(service: &str, key: &str) -> Option<String> {
        let entry = Entry::new(service, key).ok()?;
        match entry.get_password() {
            Ok(token) => Some(token),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(key, error = %e, "keychain read failed, treating token as absent");
                None
            }
        }
    }

    fn write_entry(service: &str, key: &str, token: &str) -> Result<()> {
        let entry = Entry::new(service, key).context("Failed to create keyring entry")?;
        entry
            .set_password(token)
            .context("Failed to store token in keychain")?;
        Ok(())
    }

    fn delete_entry(service: &str, key: &str) -> Result<()> {
        let entry = Entry::new(service, key).context("Failed to create keyring entry")?;
        match entry.delete_credential() {
            // Already gone counts as deleted
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }

    async fn read(&self, key: &'static str) -> Option<String> {
        let service = self.service;
        tokio::task::spawn_blocking(move || Self::read_entry(service, key))
            .await
            .ok()
            .flatten()
    }

    async fn write(&self, key: &'static str, token: String) -> Result<()> {
        let service = self.service;
        tokio::task::spawn_blocking(move || Self::write_entry(service, key, &token))
            .await
            .context("Keychain write task failed")?
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringCredentialStore {
    async fn access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY).await
    }

    async fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY).await
    }

    async fn save_access_token(&self, token: &str) -> Result<()> {
        self.write(ACCESS_TOKEN_KEY, token.to_string()).await
    }

    async fn save_refresh_token(&self, token: &str) -> Result<()> {
        self.write(REFRESH_TOKEN_KEY, token.to_string()).await
    }

    async fn clear_credentials(&self) -> Result<()> {
        let service = self.service;
        tokio::task::spawn_blocking(move || {
            Self::delete_entry(service, ACCESS_TOKEN_KEY)?;
            Self::delete_entry(service, REFRESH_TOKEN_KEY)
        })
        .await
        .context("Keychain delete task failed")?
    }
}

#[derive(Default)]
struct StoredTokens {
    access: Option<String>,
    refresh: Option<String>,
}

/// In-memory credential store for tests and host-app previews.
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    inner: Arc<Mutex<StoredTokens>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoredTokens> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn access_token(&self) -> Option<String> {
        self.lock().access.clone()
    }

    async fn refresh_token(&self) -> Option<String> {
        self.lock().refresh.clone()
    }

    async fn save_access_token(&self, token: &str) -> Result<()> {
        self.lock().access = Some(token.to_string());
        Ok(())
    }

    async fn save_refresh_token(&self, token: &str) -> Result<()> {
        self.lock().refresh = Some(token.to_string());
        Ok(())
    }

    async fn clear_credentials(&self) -> Result<()> {
        let mut tokens = self.lock();
        tokens.access = None;
        tokens.refresh = None;
        Ok(())
    }
}

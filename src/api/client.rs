//! API client for the Shopfront authentication endpoints.
//!
//! This module provides the `AuthApi` struct for the login, token-refresh,
//! and logout calls. Everything else the admin app talks to (products,
//! orders, customers, analytics) lives in the host app's own client and
//! is out of scope for the session core.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Default base URL for the Shopfront admin API
const DEFAULT_API_BASE_URL: &str = "https://api.shopfront.app";

/// HTTP request timeout in seconds.
/// 30s allows for slow mobile networks while failing fast enough that a
/// blocked refresh doesn't hang the original request indefinitely.
const REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Request/response types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "rememberMe")]
    pub remember_me: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, rename = "refreshToken")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "fullName")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct RefreshTokenRequest<'a> {
    #[serde(rename = "accessToken")]
    access_token: &'a str,
    #[serde(rename = "refreshToken")]
    refresh_token: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenResponse {
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct LogoutRequest<'a> {
    #[serde(rename = "refreshToken")]
    refresh_token: &'a str,
}

/// Client for the Shopfront auth endpoints.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct AuthApi {
    client: Client,
    base_url: String,
}

impl AuthApi {
    /// Create a new auth client against the given API base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Create a client from the app config, falling back to the default base URL
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config
            .api_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        Self::new(base_url)
    }

    /// Authenticate with email and password
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let url = format!("{}/auth/login", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .context("Failed to send login request")?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .context("Failed to parse login response")
    }

    /// Exchange the current access+refresh token pair for a fresh access token
    pub async fn refresh_token(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<RefreshTokenResponse> {
        let url = format!("{}/auth/refresh-token", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&RefreshTokenRequest {
                access_token,
                refresh_token,
            })
            .send()
            .await
            .context("Failed to send token refresh request")?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .context("Failed to parse token refresh response")
    }

    /// Invalidate the refresh token server-side.
    /// Best-effort: callers clear local credentials whether or not this succeeds.
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        let url = format!("{}/auth/logout", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&LogoutRequest { refresh_token })
            .send()
            .await
            .context("Failed to send logout request")?;

        Self::check_response(response).await?;
        debug!("server-side logout acknowledged");
        Ok(())
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }
}

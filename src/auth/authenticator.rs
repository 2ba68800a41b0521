//! Single-retry token refresh for requests rejected with HTTP 401.
//!
//! When a request fails authentication, the authenticator exchanges the
//! stored access+refresh pair for a fresh access token and hands back a
//! copy of the original request to retry, at most once per logical
//! request. Any failure along the way ends the session: credentials are
//! cleared and the original 401 propagates to the caller, which the UI
//! observes as logged-out through token absence.
//!
//! Concurrent 401s each run this sequence independently; there is no
//! cross-request single-flight, so simultaneous failures may issue
//! redundant refresh calls with last-write-wins on the store.

use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Request;
use tracing::{debug, warn};

use crate::api::AuthApi;

use super::CredentialStore;

/// Marker header attached to a retried request.
///
/// Bounds the refresh-and-retry cycle to exactly one attempt: if the
/// retried request itself comes back 401, the marker short-circuits a
/// second refresh. Request-scoped, never persisted.
pub const AUTH_RETRY_HEADER: &str = "x-auth-retry";

/// Outcome of handling an authentication failure.
#[derive(Debug)]
pub enum RetryDecision {
    /// Retry this copy of the original request; it carries the fresh
    /// bearer token and the retry marker.
    Retry(Request),
    /// Let the original failure propagate. Credentials may have been
    /// cleared if the session turned out to be unrecoverable.
    NoRetry,
}

impl RetryDecision {
    pub fn is_retry(&self) -> bool {
        matches!(self, RetryDecision::Retry(_))
    }
}

/// Handles 401 responses: one silent refresh, one retry, or session end.
#[derive(Clone)]
pub struct SessionAuthenticator<S> {
    store: S,
    api: AuthApi,
}

impl<S: CredentialStore> SessionAuthenticator<S> {
    pub fn new(store: S, api: AuthApi) -> Self {
        Self { store, api }
    }

    /// Decide whether `failed` (a request rejected with 401) should be
    /// retried with a refreshed token.
    ///
    /// The caller awaits the full refresh round-trip before the original
    /// request resolves; that serialization is intentional and bounded to
    /// this one request's retry path.
    pub async fn on_auth_failure(&self, failed: &Request) -> RetryDecision {
        if failed.headers().contains_key(AUTH_RETRY_HEADER) {
            debug!(url = %failed.url(), "request already retried once, giving up");
            return RetryDecision::NoRetry;
        }

        // Streaming bodies cannot be replayed
        let Some(mut retried) = failed.try_clone() else {
            warn!(url = %failed.url(), "request body is not cloneable, cannot retry");
            return RetryDecision::NoRetry;
        };

        let access = self.store.access_token().await.unwrap_or_default();
        let refresh = self.store.refresh_token().await.unwrap_or_default();
        if access.is_empty() || refresh.is_empty() {
            debug!("no stored token pair, session is unrecoverable");
            self.end_session().await;
            return RetryDecision::NoRetry;
        }

        let token = match self.refresh(&access, &refresh).await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "token refresh failed, ending session");
                self.end_session().await;
                return RetryDecision::NoRetry;
            }
        };

        let bearer = match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => value,
            Err(_) => {
                warn!("refreshed token is not a valid header value, ending session");
                self.end_session().await;
                return RetryDecision::NoRetry;
            }
        };

        retried.headers_mut().insert(AUTHORIZATION, bearer);
        retried
            .headers_mut()
            .insert(AUTH_RETRY_HEADER, HeaderValue::from_static("1"));

        debug!(url = %retried.url(), "retrying request with refreshed token");
        RetryDecision::Retry(retried)
    }

    /// Call the refresh endpoint and persist the new token pair.
    /// Returns the new access token.
    async fn refresh(&self, access: &str, refresh: &str) -> Result<String> {
        let response = self.api.refresh_token(access, refresh).await?;

        if !response.success {
            return Err(anyhow!("refresh endpoint reported failure"));
        }

        let token = response
            .token
            .filter(|t| !t.is_empty())
            .context("refresh response missing access token")?;

        // Persist before handing the token back so a concurrent reader of
        // the store never sees a retry succeed with stale storage
        self.store
            .save_access_token(&token)
            .await
            .context("Failed to persist refreshed access token")?;
        if let Some(new_refresh) = response.refresh_token.filter(|t| !t.is_empty()) {
            self.store
                .save_refresh_token(&new_refresh)
                .await
                .context("Failed to persist rotated refresh token")?;
        }

        Ok(token)
    }

    /// Clear credentials; the UI sees logged-out through token absence.
    async fn end_session(&self) {
        if let Err(e) = self.store.clear_credentials().await {
            warn!(error = %e, "failed to clear credentials");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryCredentialStore;
    use reqwest::Client;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn seeded_store() -> MemoryCredentialStore {
        let store = MemoryCredentialStore::new();
        store.save_access_token("T1").await.unwrap();
        store.save_refresh_token("R1").await.unwrap();
        store
    }

    fn authenticator(store: MemoryCredentialStore, server: &MockServer) -> SessionAuthenticator<MemoryCredentialStore> {
        SessionAuthenticator::new(store, AuthApi::new(server.uri()).unwrap())
    }

    fn orders_request(server: &MockServer) -> Request {
        Client::new()
            .get(format!("{}/orders", server.uri()))
            .build()
            .unwrap()
    }

    fn refresh_endpoint() -> wiremock::MockBuilder {
        Mock::given(method("POST")).and(path("/auth/refresh-token"))
    }

    #[tokio::test]
    async fn marked_request_is_never_retried() {
        let server = MockServer::start().await;
        // The refresh endpoint must not be touched
        refresh_endpoint()
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "token": "T2" })))
            .expect(0)
            .mount(&server)
            .await;

        let store = seeded_store().await;
        let auth = authenticator(store.clone(), &server);

        let mut request = orders_request(&server);
        request
            .headers_mut()
            .insert(AUTH_RETRY_HEADER, HeaderValue::from_static("1"));

        let decision = auth.on_auth_failure(&request).await;
        assert!(!decision.is_retry());
        // Credentials are untouched: the original failure simply propagates
        assert_eq!(store.access_token().await.as_deref(), Some("T1"));
        assert_eq!(store.refresh_token().await.as_deref(), Some("R1"));
    }

    #[tokio::test]
    async fn successful_refresh_retries_with_new_token() {
        let server = MockServer::start().await;
        refresh_endpoint()
            .and(body_json(json!({ "accessToken": "T1", "refreshToken": "R1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "token": "T2" })))
            .expect(1)
            .mount(&server)
            .await;

        let store = seeded_store().await;
        let auth = authenticator(store.clone(), &server);

        let decision = auth.on_auth_failure(&orders_request(&server)).await;
        let RetryDecision::Retry(retried) = decision else {
            panic!("expected retry decision");
        };

        let bearer = retried.headers().get(AUTHORIZATION).unwrap();
        assert_eq!(bearer.to_str().unwrap(), "Bearer T2");
        assert!(retried.headers().contains_key(AUTH_RETRY_HEADER));
        assert_eq!(store.access_token().await.as_deref(), Some("T2"));
        // Refresh token was not rotated
        assert_eq!(store.refresh_token().await.as_deref(), Some("R1"));
    }

    #[tokio::test]
    async fn rotated_refresh_token_is_persisted() {
        let server = MockServer::start().await;
        refresh_endpoint()
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({ "success": true, "token": "T2", "refreshToken": "R2" }),
            ))
            .mount(&server)
            .await;

        let store = seeded_store().await;
        let auth = authenticator(store.clone(), &server);

        let decision = auth.on_auth_failure(&orders_request(&server)).await;
        assert!(decision.is_retry());
        assert_eq!(store.refresh_token().await.as_deref(), Some("R2"));
    }

    #[tokio::test]
    async fn rejected_refresh_clears_credentials() {
        let server = MockServer::start().await;
        refresh_endpoint()
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
            .mount(&server)
            .await;

        let store = seeded_store().await;
        let auth = authenticator(store.clone(), &server);

        let decision = auth.on_auth_failure(&orders_request(&server)).await;
        assert!(!decision.is_retry());
        assert_eq!(store.access_token().await, None);
        assert_eq!(store.refresh_token().await, None);
    }

    #[tokio::test]
    async fn server_error_clears_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh-token"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = seeded_store().await;
        let auth = authenticator(store.clone(), &server);

        let decision = auth.on_auth_failure(&orders_request(&server)).await;
        assert!(!decision.is_retry());
        assert_eq!(store.access_token().await, None);
    }

    #[tokio::test]
    async fn missing_refresh_token_skips_endpoint_and_clears() {
        let server = MockServer::start().await;
        refresh_endpoint()
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "token": "T2" })))
            .expect(0)
            .mount(&server)
            .await;

        let store = MemoryCredentialStore::new();
        store.save_access_token("T1").await.unwrap();
        let auth = authenticator(store.clone(), &server);

        let decision = auth.on_auth_failure(&orders_request(&server)).await;
        assert!(!decision.is_retry());
        assert_eq!(store.access_token().await, None);
        assert_eq!(store.refresh_token().await, None);
    }

    #[tokio::test]
    async fn empty_access_token_is_treated_as_absent() {
        let server = MockServer::start().await;
        refresh_endpoint()
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "token": "T2" })))
            .expect(0)
            .mount(&server)
            .await;

        let store = MemoryCredentialStore::new();
        store.save_access_token("").await.unwrap();
        store.save_refresh_token("R1").await.unwrap();
        let auth = authenticator(store.clone(), &server);

        let decision = auth.on_auth_failure(&orders_request(&server)).await;
        assert!(!decision.is_retry());
        assert_eq!(store.refresh_token().await, None);
    }

    #[tokio::test]
    async fn malformed_refresh_response_clears_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let store = seeded_store().await;
        let auth = authenticator(store.clone(), &server);

        let decision = auth.on_auth_failure(&orders_request(&server)).await;
        assert!(!decision.is_retry());
        assert_eq!(store.access_token().await, None);
    }

    #[tokio::test]
    async fn refresh_success_without_token_is_a_failure() {
        let server = MockServer::start().await;
        refresh_endpoint()
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .mount(&server)
            .await;

        let store = seeded_store().await;
        let auth = authenticator(store.clone(), &server);

        let decision = auth.on_auth_failure(&orders_request(&server)).await;
        assert!(!decision.is_retry());
        assert_eq!(store.access_token().await, None);
    }
}

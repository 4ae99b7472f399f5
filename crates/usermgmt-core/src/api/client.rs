//! API client for the user-management REST service.
//!
//! This module provides the `ApiClient` struct, a thin request/response
//! pipeline: the outbound stage attaches the stored bearer token, the inbound
//! stage unwraps JSON payloads and turns HTTP 401 into a session invalidation.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::auth::store::{SharedStore, TOKEN_KEY, USER_KEY};
use crate::models::{JwtResponse, LoginRequest, MessageResponse, RegisterRequest, User, UserUpdate};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Path prefix every API endpoint lives under.
pub const API_PREFIX: &str = "/api";

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Signals from the transport layer to whoever owns navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The server rejected our credential. Stored credentials are already gone.
    Invalidated { status: u16 },
}

/// API client for the user-management service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: SharedStore,
    events: Option<mpsc::Sender<SessionEvent>>,
}

impl ApiClient {
    /// Create a new API client for `server_url` (e.g. `http://localhost:8080`).
    ///
    /// The token is read from `store` on every request, so a login performed
    /// through any handle sharing the store is picked up immediately.
    pub fn new(server_url: &str, store: SharedStore, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = format!("{}{}", server_url.trim_end_matches('/'), API_PREFIX);
        debug!(%base_url, timeout_secs = timeout.as_secs(), "API client created");

        Ok(Self {
            client,
            base_url,
            store,
            events: None,
        })
    }

    /// Report session invalidations on `tx`.
    pub fn with_events(mut self, tx: mpsc::Sender<SessionEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let token = match self.store.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read token from store, sending request unauthenticated");
                None
            }
        };

        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .context("Stored token is not a valid header value")?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Clear the persisted credentials and tell the navigation layer.
    fn invalidate_session(&self, status: u16) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!(error = %e, key, "Failed to clear stored credential");
            }
        }

        match &self.events {
            Some(tx) => match tx.try_send(SessionEvent::Invalidated { status }) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("Session event channel full, dropping invalidation");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("Session event receiver gone");
                }
            },
            None => debug!("No session event listener registered"),
        }
        info!(status, "Session invalidated by server");
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_status(status, &body);
        if err.is_unauthorized() {
            self.invalidate_session(status.as_u16());
        }
        Err(err.into())
    }

    async fn send<T: DeserializeOwned>(&self, method: Method, path: &str, request: RequestBuilder) -> Result<T> {
        let url = self.url(path);
        debug!(%method, %url, "Sending request");

        let response = request
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(ApiError::NetworkError)
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;

        let response = self.check_response(response).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.client.get(self.url(path));
        self.send(Method::GET, path, request).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let request = self.client.post(self.url(path)).json(body);
        self.send(Method::POST, path, request).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let request = self.client.put(self.url(path)).json(body);
        self.send(Method::PUT, path, request).await
    }

    async fn patch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.client.patch(self.url(path));
        self.send(Method::PATCH, path, request).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.client.delete(self.url(path));
        self.send(Method::DELETE, path, request).await
    }

    // ===== Authentication =====

    /// Exchange credentials for an access token and the user record
    pub async fn login(&self, credentials: &LoginRequest) -> Result<JwtResponse> {
        self.post("auth/login", credentials).await
    }

    /// Create a new account. Does not log in.
    pub async fn register(&self, user_data: &RegisterRequest) -> Result<MessageResponse> {
        self.post("auth/register", user_data).await
    }

    /// Fetch the authenticated user's own record
    pub async fn current_user(&self) -> Result<User> {
        self.get("users/me").await
    }

    // ===== User Management =====

    pub async fn get_user(&self, id: i64) -> Result<User> {
        self.get(&format!("users/{}", id)).await
    }

    /// List all users (administrators only, enforced by the server)
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.get("users").await
    }

    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<MessageResponse> {
        self.put(&format!("users/{}", id), update).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<MessageResponse> {
        self.delete(&format!("users/{}", id)).await
    }

    /// Flip a user between ACTIVE and INACTIVE
    pub async fn toggle_user_status(&self, id: i64) -> Result<MessageResponse> {
        self.patch(&format!("users/{}/status", id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemoryStore;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn client_for(server: &Server, store: SharedStore) -> ApiClient {
        ApiClient::new(&server.url(), store, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_base_url_has_api_prefix() {
        let client = ApiClient::new("http://localhost:8080/", MemoryStore::shared(), Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert_eq!(client.url("users/me"), "http://localhost:8080/api/users/me");
        assert_eq!(client.url("/users/3"), "http://localhost:8080/api/users/3");
    }

    #[tokio::test]
    async fn test_bearer_token_attached_when_stored() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/api/users/me")
            .match_header("authorization", "Bearer T1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":1,"username":"root","role":"ADMIN"}"#)
            .create_async()
            .await;

        let store = MemoryStore::shared();
        store.set(TOKEN_KEY, "T1").unwrap();
        let client = client_for(&server, store);

        let user = client.current_user().await.unwrap();
        m.assert_async().await;
        assert_eq!(user.id, 1);
        assert!(user.is_admin());
    }

    #[tokio::test]
    async fn test_no_authorization_header_without_token() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/api/auth/login")
            .match_header("authorization", Matcher::Missing)
            .match_body(Matcher::Json(json!({"username": "a", "password": "b"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"accessToken":"T1","tokenType":"Bearer","expiresIn":86400000,"user":{"id":1,"role":"ADMIN"}}"#)
            .create_async()
            .await;

        let client = client_for(&server, MemoryStore::shared());
        let resp = client.login(&LoginRequest::new("a", "b")).await.unwrap();
        m.assert_async().await;
        assert_eq!(resp.access_token, "T1");
        assert_eq!(resp.expires_in, 86_400_000);
    }

    #[tokio::test]
    async fn test_unauthorized_clears_store_and_emits_event() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/users")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Token expired"}"#)
            .create_async()
            .await;

        let store = MemoryStore::shared();
        store.set(TOKEN_KEY, "stale").unwrap();
        store.set(USER_KEY, r#"{"id":1}"#).unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        let client = client_for(&server, store.clone()).with_events(tx);

        let err = client.list_users().await.unwrap_err();
        let api_err = err.downcast_ref::<ApiError>().expect("expected ApiError");
        assert!(api_err.is_unauthorized());
        assert_eq!(api_err.server_message(), Some("Token expired"));

        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get(USER_KEY).unwrap(), None);
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Invalidated { status: 401 });
    }

    #[tokio::test]
    async fn test_other_errors_propagate_without_invalidation() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/users/42")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"User not found"}"#)
            .create_async()
            .await;

        let store = MemoryStore::shared();
        store.set(TOKEN_KEY, "T1").unwrap();
        let (tx, mut rx) = mpsc::channel(4);
        let client = client_for(&server, store.clone()).with_events(tx);

        let err = client.get_user(42).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::NotFound(m)) if m == "User not found"));
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("T1"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_update_sends_partial_body() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("PUT", "/api/users/5")
            .match_body(Matcher::Json(json!({"role": "ADMIN"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"User updated"}"#)
            .create_async()
            .await;

        let client = client_for(&server, MemoryStore::shared());
        let update = UserUpdate {
            role: Some("ADMIN".to_string()),
            ..Default::default()
        };
        let resp = client.update_user(5, &update).await.unwrap();
        m.assert_async().await;
        assert_eq!(resp.message, "User updated");
    }

    #[tokio::test]
    async fn test_toggle_and_delete_paths() {
        let mut server = Server::new_async().await;
        let toggle = server
            .mock("PATCH", "/api/users/9/status")
            .with_status(200)
            .with_body(r#"{"message":"User disabled"}"#)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/api/users/9")
            .with_status(200)
            .with_body(r#"{"message":"User deleted"}"#)
            .create_async()
            .await;

        let client = client_for(&server, MemoryStore::shared());
        assert_eq!(client.toggle_user_status(9).await.unwrap().message, "User disabled");
        assert_eq!(client.delete_user(9).await.unwrap().message, "User deleted");
        toggle.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_json_is_invalid_response() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/users/me")
            .with_status(200)
            .with_body("<html>proxy error</html>")
            .create_async()
            .await;

        let client = client_for(&server, MemoryStore::shared());
        let err = client.current_user().await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_network_failure_propagates() {
        // Port 9 (discard) on localhost is not expected to accept HTTP
        let client = ApiClient::new("http://127.0.0.1:9", MemoryStore::shared(), Duration::from_secs(2)).unwrap();
        let err = client.current_user().await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::NetworkError(_))));
    }
}

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{JwtResponse, LoginRequest, MessageResponse, RegisterRequest, User};

use super::store::{SharedStore, TOKEN_KEY, USER_KEY};

/// Shown when a login fails without a message from the server.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed, please check your username and password";

/// Shown when a registration fails without a message from the server.
pub const REGISTER_FAILED_MESSAGE: &str = "Registration failed";

/// The client's view of who is logged in.
///
/// `token` being set is what "logged in" means. `user` may briefly lag the
/// token during login.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub token: Option<String>,
    pub user: Option<User>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SessionState {
    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().map(User::is_admin).unwrap_or(false)
    }
}

/// Owner of the session state, mirrored to a persistent store.
pub struct Session {
    api: ApiClient,
    store: SharedStore,
    state: SessionState,
}

impl Session {
    /// Create an empty session. Call `check_auth` to rehydrate from the store.
    pub fn new(api: ApiClient, store: SharedStore) -> Self {
        Self {
            api,
            store,
            state: SessionState::default(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn token(&self) -> Option<&str> {
        self.state.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.is_logged_in()
    }

    pub fn is_admin(&self) -> bool {
        self.state.is_admin()
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Log in and mirror the token and user to the store.
    ///
    /// On failure `error` holds a displayable message and the error is
    /// returned. `loading` is false again on both paths.
    pub async fn login(&mut self, credentials: &LoginRequest) -> Result<JwtResponse> {
        self.state.loading = true;
        self.state.error = None;

        let result = self.api.login(credentials).await;
        self.state.loading = false;

        match result {
            Ok(response) => {
                self.state.token = Some(response.access_token.clone());
                self.state.user = Some(response.user.clone());
                self.mirror_token(&response.access_token);
                self.mirror_user(&response.user);
                info!(username = %credentials.username, "Login successful");
                Ok(response)
            }
            Err(e) => {
                warn!(error = %e, username = %credentials.username, "Login failed");
                self.state.error =
                    Some(ApiError::message_of(&e).unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_string()));
                Err(e)
            }
        }
    }

    /// Create an account. The session is left untouched: registering does not log in.
    pub async fn register(&mut self, user_data: &RegisterRequest) -> Result<MessageResponse> {
        self.state.loading = true;
        self.state.error = None;

        let result = self.api.register(user_data).await;
        self.state.loading = false;

        match result {
            Ok(response) => {
                info!(username = %user_data.username, "Registration successful");
                Ok(response)
            }
            Err(e) => {
                warn!(error = %e, username = %user_data.username, "Registration failed");
                self.state.error =
                    Some(ApiError::message_of(&e).unwrap_or_else(|| REGISTER_FAILED_MESSAGE.to_string()));
                Err(e)
            }
        }
    }

    /// Forget the session in memory and in the store. Safe to call repeatedly.
    pub fn logout(&mut self) {
        self.state.token = None;
        self.state.user = None;
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!(error = %e, key, "Failed to remove stored session entry");
            }
        }
        debug!("Session cleared");
    }

    /// Rehydrate from the store at startup.
    ///
    /// Only a complete pair (token and user) is restored; empty values count
    /// as missing. A stored user that does not parse means the session is
    /// corrupt, and we log out entirely.
    pub fn check_auth(&mut self) {
        let token = self.read_entry(TOKEN_KEY);
        let user_json = self.read_entry(USER_KEY);

        let (Some(token), Some(user_json)) = (token, user_json) else {
            debug!("No stored session");
            return;
        };

        self.state.token = Some(token);
        match serde_json::from_str::<User>(&user_json) {
            Ok(user) => {
                debug!(user_id = user.id, "Session restored from store");
                self.state.user = Some(user);
            }
            Err(e) => {
                warn!(error = %e, "Stored user record is corrupt, logging out");
                self.logout();
            }
        }
    }

    /// Re-fetch the user record from the server and mirror it.
    ///
    /// Any failure means the session can't be trusted: we log out and return
    /// the error.
    pub async fn fetch_current_user(&mut self) -> Result<User> {
        match self.api.current_user().await {
            Ok(user) => {
                self.state.user = Some(user.clone());
                self.mirror_user(&user);
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch current user, logging out");
                self.logout();
                Err(e)
            }
        }
    }

    fn read_entry(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(error = %e, key, "Failed to read stored session entry");
                None
            }
        }
    }

    fn mirror_token(&self, token: &str) {
        if let Err(e) = self.store.set(TOKEN_KEY, token) {
            warn!(error = %e, "Failed to save token");
        }
    }

    fn mirror_user(&self, user: &User) {
        let result = serde_json::to_string(user)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.store.set(USER_KEY, &json));
        if let Err(e) = result {
            warn!(error = %e, "Failed to save user");
        }
    }
}

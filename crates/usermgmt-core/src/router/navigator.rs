use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::api::SessionEvent;
use crate::auth::{Session, SessionState};

use super::guard::{guard_route, Decision, Redirect};
use super::routes::{resolve, ResolvedRoute, View, HOME_PATH, LOGIN_PATH};

/// Redirect targets are public, so one hop always settles; the extra is slack.
const MAX_REDIRECTS: usize = 2;

/// Outcome of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Where we ended up after any redirect.
    pub route: ResolvedRoute,
    /// Set when the guard refused the requested route.
    pub redirected: Option<Redirect>,
}

impl Navigation {
    pub fn view(&self) -> View {
        self.route.route.view
    }

    pub fn is_redirect(&self) -> bool {
        self.redirected.is_some()
    }
}

/// Top-level navigation controller.
///
/// Owns the current location and is the only place that reacts to session
/// invalidation from the HTTP client.
pub struct Navigator {
    current: ResolvedRoute,
    events: Option<mpsc::Receiver<SessionEvent>>,
}

impl Navigator {
    pub fn new(events: mpsc::Receiver<SessionEvent>) -> Self {
        Self {
            current: resolve(HOME_PATH),
            events: Some(events),
        }
    }

    /// A navigator with no event source, e.g. for offline route checks.
    pub fn detached() -> Self {
        Self {
            current: resolve(HOME_PATH),
            events: None,
        }
    }

    pub fn current(&self) -> &ResolvedRoute {
        &self.current
    }

    /// Navigate to `path`, following guard redirects.
    pub fn navigate(&mut self, path: &str, state: &SessionState) -> Navigation {
        let mut target = resolve(path);
        let mut redirected = None;

        for _ in 0..MAX_REDIRECTS {
            match guard_route(target.route, state) {
                Decision::Proceed => break,
                Decision::Redirect(redirect) => {
                    debug!(from = %target.path, to = redirect.path(), "Navigation redirected");
                    redirected.get_or_insert(redirect);
                    target = resolve(redirect.path());
                }
            }
        }

        self.current = target.clone();
        Navigation {
            route: target,
            redirected,
        }
    }

    /// Apply pending session events without blocking.
    ///
    /// An invalidation logs the session out (the HTTP client has already
    /// cleared the store) and moves to the login page. Returns whether one
    /// was seen.
    pub fn process_events(&mut self, session: &mut Session) -> bool {
        // Collect first so the receiver borrow ends before we mutate
        let events: Vec<SessionEvent> = match self.events {
            Some(ref mut rx) => {
                let mut events = Vec::new();
                while let Ok(event) = rx.try_recv() {
                    events.push(event);
                }
                events
            }
            None => Vec::new(),
        };

        let mut invalidated = false;
        for event in events {
            match event {
                SessionEvent::Invalidated { status } => {
                    info!(status, "Session invalidated, returning to login");
                    session.logout();
                    self.current = resolve(LOGIN_PATH);
                    invalidated = true;
                }
            }
        }
        invalidated
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::api::ApiClient;
    use crate::auth::{MemoryStore, TOKEN_KEY, USER_KEY};
    use crate::models::User;

    fn state_with_role(role: &str) -> SessionState {
        let user: User = serde_json::from_value(serde_json::json!({"id": 5, "role": role})).unwrap();
        SessionState {
            token: Some("T".to_string()),
            user: Some(user),
            ..Default::default()
        }
    }

    #[test]
    fn test_navigate_public_route() {
        let mut nav = Navigator::detached();
        let result = nav.navigate("/register", &SessionState::default());
        assert_eq!(result.view(), View::Register);
        assert!(!result.is_redirect());
        assert_eq!(nav.current().path, "/register");
    }

    #[test]
    fn test_navigate_protected_without_token_goes_to_login() {
        let mut nav = Navigator::detached();
        let result = nav.navigate("/users/3", &SessionState::default());
        assert_eq!(result.view(), View::Login);
        assert_eq!(result.redirected, Some(Redirect::Login));
        assert_eq!(nav.current().path, "/login");
    }

    #[test]
    fn test_navigate_admin_as_user_goes_home() {
        let mut nav = Navigator::detached();
        let result = nav.navigate("/admin/users", &state_with_role("USER"));
        assert_eq!(result.view(), View::Home);
        assert_eq!(result.redirected, Some(Redirect::Home));
    }

    #[test]
    fn test_navigate_admin_as_admin() {
        let mut nav = Navigator::detached();
        let result = nav.navigate("/admin/users", &state_with_role("ADMIN"));
        assert_eq!(result.view(), View::UserManagement);
        assert!(!result.is_redirect());
    }

    #[test]
    fn test_navigate_unknown_path_is_not_found() {
        let mut nav = Navigator::detached();
        let result = nav.navigate("/does/not/exist", &SessionState::default());
        assert_eq!(result.view(), View::NotFound);
        assert!(!result.is_redirect());
    }

    #[tokio::test]
    async fn test_invalidation_event_logs_out_and_goes_to_login() {
        let store = MemoryStore::shared();
        store.set(TOKEN_KEY, "T1").unwrap();
        store.set(USER_KEY, r#"{"id":1,"role":"ADMIN"}"#).unwrap();

        let (tx, rx) = mpsc::channel(4);
        let api = ApiClient::new("http://127.0.0.1:9", store.clone(), Duration::from_secs(1))
            .unwrap()
            .with_events(tx.clone());
        let mut session = Session::new(api, store.clone());
        session.check_auth();

        let mut nav = Navigator::new(rx);
        nav.navigate("/admin/users", session.state());
        assert_eq!(nav.current().route.view, View::UserManagement);

        // Nothing pending yet
        assert!(!nav.process_events(&mut session));
        assert!(session.is_logged_in());

        tx.send(SessionEvent::Invalidated { status: 401 }).await.unwrap();
        assert!(nav.process_events(&mut session));
        assert!(!session.is_logged_in());
        assert_eq!(session.user(), None);
        assert_eq!(nav.current().route.view, View::Login);

        // The next protected navigation is refused
        let result = nav.navigate("/profile", session.state());
        assert_eq!(result.redirected, Some(Redirect::Login));
    }
}

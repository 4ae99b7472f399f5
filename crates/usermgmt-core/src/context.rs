//! Application context: the single owner of the session and navigation state.
//!
//! `AppContext::init` wires the store, HTTP client, session and navigator
//! together and restores any persisted session. Front ends hold one context
//! for the life of the process and call `shutdown` when done.

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::auth::{Session, SharedStore};
use crate::config::Config;
use crate::router::{Navigation, Navigator};

/// Buffer size for the session event channel.
/// Invalidations are rare and idempotent, a small buffer is plenty.
const EVENT_BUFFER_SIZE: usize = 16;

pub struct AppContext {
    session: Session,
    navigator: Navigator,
}

impl AppContext {
    /// Build the context and rehydrate the session from `store`.
    pub fn init(config: &Config, store: SharedStore) -> Result<Self> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER_SIZE);

        let api = ApiClient::new(config.server_url(), store.clone(), config.request_timeout())?
            .with_events(tx);

        let mut session = Session::new(api, store);
        session.check_auth();
        debug!(logged_in = session.is_logged_in(), "Session initialized");

        Ok(Self {
            session,
            navigator: Navigator::new(rx),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn api(&self) -> &ApiClient {
        self.session.api()
    }

    /// Apply pending session events. Returns true if the session was invalidated.
    pub fn pump_events(&mut self) -> bool {
        self.navigator.process_events(&mut self.session)
    }

    /// Navigate to `path` against the latest session state.
    pub fn open(&mut self, path: &str) -> Navigation {
        self.pump_events();
        self.navigator.navigate(path, self.session.state())
    }

    /// Tear down. Drops the event channel; persisted state is left as is.
    pub fn shutdown(mut self) {
        self.pump_events();
        info!(logged_in = self.session.is_logged_in(), "Context shut down");
    }
}

use crate::auth::SessionState;

use super::routes::{RouteDescriptor, Visibility, HOME_PATH, LOGIN_PATH};

/// Where a refused navigation is sent instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    Login,
    Home,
}

impl Redirect {
    pub fn path(&self) -> &'static str {
        match self {
            Redirect::Login => LOGIN_PATH,
            Redirect::Home => HOME_PATH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Redirect(Redirect),
}

/// Decide whether a navigation to a route with `visibility` may proceed.
///
/// Reads only the already-loaded session; never touches the network. This is
/// UI gating only, the server enforces the real checks.
pub fn guard(visibility: Visibility, state: &SessionState) -> Decision {
    if visibility == Visibility::Public {
        return Decision::Proceed;
    }

    if state.token.is_none() {
        return Decision::Redirect(Redirect::Login);
    }

    if visibility == Visibility::RequiresAdmin && !state.is_admin() {
        return Decision::Redirect(Redirect::Home);
    }

    Decision::Proceed
}

pub fn guard_route(route: &RouteDescriptor, state: &SessionState) -> Decision {
    guard(route.visibility(), state)
}

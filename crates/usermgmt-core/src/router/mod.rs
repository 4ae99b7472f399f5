//! Client-side routing: the route table, the navigation guard, and the
//! controller that applies both.
//!
//! The guard is advisory UI gating. It decides from the in-memory session
//! alone; the server remains the authority on access.

pub mod guard;
pub mod navigator;
pub mod routes;

pub use guard::{guard, guard_route, Decision, Redirect};
pub use navigator::{Navigation, Navigator};
pub use routes::{find_by_name, resolve, ResolvedRoute, RouteDescriptor, View, Visibility, ROUTES};

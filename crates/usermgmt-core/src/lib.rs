//! usermgmt-core - client library for the user-management service.
//!
//! This crate provides:
//! - `api`: HTTP client that injects the bearer token and reports 401s
//! - `auth`: Session state mirrored to a persistent store
//! - `router`: Route table, navigation guard and navigation controller
//! - `models`: Wire types exchanged with the server
//! - `config`: Persisted client configuration
//! - `context`: The `AppContext` that owns all of the above

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod models;
pub mod router;

pub use api::{ApiClient, ApiError, SessionEvent};
pub use auth::{Session, SessionState, SharedStore, Storage};
pub use config::Config;
pub use context::AppContext;

//! REST API client module for the user-management service.
//!
//! This module provides the `ApiClient` for talking to the service's JSON API
//! under the fixed `/api` prefix: login, registration, the current user, and
//! the administrator's user-management endpoints.
//!
//! Requests carry the stored bearer token when one exists. An HTTP 401 clears
//! the stored credentials and emits a `SessionEvent::Invalidated` for the
//! navigation layer to act on.

pub mod client;
pub mod error;

pub use client::{ApiClient, SessionEvent};
pub use error::ApiError;

//! Wire models for the user-management service.
//!
//! This module contains the JSON payloads exchanged with the server:
//!
//! - `User`: The user record returned by `users/me` and the user endpoints
//! - `LoginRequest`, `JwtResponse`: Login payload and token response
//! - `RegisterRequest`, `MessageResponse`: Registration and generic replies
//! - `UserUpdate`: Partial update sent by administrators

pub mod auth;
pub mod user;

pub use auth::{JwtResponse, LoginRequest, MessageResponse, RegisterRequest};
pub use user::{User, UserStatus, UserUpdate, ADMIN_ROLE};

//! Authentication module for managing the client session.
//!
//! This module provides:
//! - `Session`: The login state (`token`, `user`, `loading`, `error`) and the
//!   login/register/logout/rehydrate operations
//! - `Storage`: The persistent key-value store the session is mirrored to,
//!   with memory, file and OS keychain backends
//!
//! The store holds a copy for restarts; the in-memory `SessionState` is what
//! the navigation guard reads.

pub mod keychain;
pub mod session;
pub mod store;

pub use keychain::KeychainStore;
pub use session::{Session, SessionState, LOGIN_FAILED_MESSAGE, REGISTER_FAILED_MESSAGE};
pub use store::{FileStore, MemoryStore, SharedStore, Storage, TOKEN_KEY, USER_KEY};

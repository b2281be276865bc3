//! Client-side session lifecycle for Vigil.
//!
//! This crate decides whether there is a valid session right now:
//!
//! 1. **Rehydration**: restoring a stored session at startup, or
//!    discarding it if its idle window already ran out
//! 2. **Login / logout**: establishing and clearing the session in memory
//!    and in the store together ([`SessionHandle`])
//! 3. **Idle expiry**: one deadline, renewed by activity signals, that
//!    signs the user out when it fires
//! 4. **The login call**: the [`LoginClient`] trait the application
//!    implements over its API
//!
//! # How it fits in the stack
//!
//! ```text
//! Guard layer (above)  ← reads AuthState to allow, block or redirect
//!     ↕
//! Session layer (this crate)  ← owns the session and its deadline
//!     ↕
//! Store + activity layers (below)  ← persistence and input signals
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod clock;
mod error;
mod event;
mod manager;
mod session;

pub use auth::{Credentials, FieldErrors, LoginClient, LoginError, LoginResponse};
pub use clock::Clock;
pub use error::SessionError;
pub use event::{LifecycleEvent, SignOutReason};
pub use manager::{SessionHandle, SessionManager};
pub use session::{ActiveSession, AuthState, SessionConfig};

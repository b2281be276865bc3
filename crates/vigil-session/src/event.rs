//! Lifecycle events broadcast to the navigation layer.
//!
//! The lifecycle never navigates. It announces what happened, with a
//! reason code, and whoever owns routing decides where to go.

use std::time::Duration;

use vigil_store::{Role, UserId};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignOutReason {
    /// The user (or the application on their behalf) logged out.
    Logout,
    /// The idle deadline fired with no activity in between.
    IdleTimeout,
    /// A stored session was already past its idle window at startup.
    StaleOnLoad,
}

impl SignOutReason {
    /// Whether the login surface should explain that the session expired.
    ///
    /// Only a live expiry qualifies. A stale session discovered at startup
    /// is cleared quietly.
    pub fn is_expiry(&self) -> bool {
        matches!(self, Self::IdleTimeout)
    }
}

/// Something that changed in the session lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A login established a new session.
    SignedIn { user_id: UserId, role: Role },

    /// A stored session was rehydrated at startup.
    /// `remaining` is what was left of its idle window.
    Restored {
        user_id: UserId,
        remaining: Duration,
    },

    /// The user record changed; token and deadline did not.
    UserUpdated { user_id: UserId, role: Role },

    /// The session ended.
    SignedOut { reason: SignOutReason },
}

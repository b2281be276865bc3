//! Session types: configuration and the published authentication state.
//!
//! The lifecycle actor owns the truth. What it hands out is a snapshot,
//! an [`AuthState`], which is one of three things:
//!
//! ```text
//!   Initializing ──(initialize: nothing valid stored)──→ Anonymous
//!        │                                                 ↑  │
//!        └──(initialize: live session restored)──┐  (logout │  │ (login)
//!                                                ▼   expiry)│  ▼
//!                                           Authenticated ──┘
//! ```
//!
//! `Initializing` is only ever seen before the first decision. Consumers
//! must treat it as "don't know yet", never as "anonymous".

use std::time::Duration;

use serde::{Deserialize, Serialize};
use vigil_store::{BearerToken, PersistedSession, Role, User};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session lifecycle behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long a session may sit without an activity signal before it is
    /// cleared. Default: 30 minutes.
    pub idle_timeout: Duration,
}

impl SessionConfig {
    /// The console's idle timeout.
    pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

    /// Shortest timeout accepted by [`validated`](Self::validated).
    pub const MIN_IDLE_TIMEOUT: Duration = Duration::from_secs(1);

    /// Longest timeout accepted by [`validated`](Self::validated).
    pub const MAX_IDLE_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    /// Fixes out-of-range values so the config is safe to use.
    ///
    /// A zero timeout would expire every session the instant it was
    /// created; it is raised to [`Self::MIN_IDLE_TIMEOUT`]. Anything above
    /// [`Self::MAX_IDLE_TIMEOUT`] is lowered to it, which keeps deadline
    /// and timestamp arithmetic in range.
    pub fn validated(mut self) -> Self {
        if self.idle_timeout < Self::MIN_IDLE_TIMEOUT {
            tracing::warn!(
                idle_timeout_ms = self.idle_timeout.as_millis() as u64,
                "idle_timeout below minimum, clamping"
            );
            self.idle_timeout = Self::MIN_IDLE_TIMEOUT;
        } else if self.idle_timeout > Self::MAX_IDLE_TIMEOUT {
            tracing::warn!(
                idle_timeout_secs = self.idle_timeout.as_secs(),
                "idle_timeout above maximum, clamping"
            );
            self.idle_timeout = Self::MAX_IDLE_TIMEOUT;
        }
        self
    }

    pub(crate) fn idle_timeout_ms(&self) -> u64 {
        u64::try_from(self.idle_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Self::IDLE_TIMEOUT,
        }
    }
}

// ---------------------------------------------------------------------------
// ActiveSession
// ---------------------------------------------------------------------------

/// An authenticated session as held in memory.
///
/// `token` and `user` only ever exist together; there is no way to build
/// an `ActiveSession` missing either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub token: BearerToken,
    pub user: User,
    /// Start of the current idle window, Unix epoch milliseconds.
    pub last_activity_ms: u64,
    /// When the session expires absent further activity.
    /// Always `last_activity_ms + idle_timeout`.
    pub expires_at_ms: u64,
}

impl ActiveSession {
    pub(crate) fn from_persisted(
        persisted: PersistedSession,
        idle_timeout_ms: u64,
    ) -> Self {
        Self {
            token: persisted.token,
            user: persisted.user,
            last_activity_ms: persisted.last_activity_ms,
            expires_at_ms: persisted.last_activity_ms.saturating_add(idle_timeout_ms),
        }
    }

    /// Milliseconds left before expiry at `now_ms` (zero once past it).
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at_ms.saturating_sub(now_ms)
    }
}

// ---------------------------------------------------------------------------
// AuthState
// ---------------------------------------------------------------------------

/// Snapshot of "is there a valid session right now".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Rehydration from storage hasn't finished.
    #[default]
    Initializing,
    /// No session.
    Anonymous,
    /// A live session.
    Authenticated(ActiveSession),
}

impl AuthState {
    pub fn is_initializing(&self) -> bool {
        matches!(self, Self::Initializing)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn session(&self) -> Option<&ActiveSession> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.session().map(|s| &s.user)
    }

    /// The current user's role, `None` unless authenticated.
    pub fn role(&self) -> Option<Role> {
        self.user().map(|u| u.role)
    }

    /// The bearer token for the request layer.
    pub fn token(&self) -> Option<&BearerToken> {
        self.session().map(|s| &s.token)
    }
}

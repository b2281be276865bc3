//! The one-time "your session expired" notice on the login surface.
//!
//! An idle expiry arms the slot. The next redirect to login carries the
//! `reason=expired` marker, and the login view takes the notice exactly
//! once. After that, plain unauthenticated visits show nothing.

use vigil_session::LifecycleEvent;

/// Login path of the console.
pub const LOGIN_PATH: &str = "/login";

/// Query marker distinguishing "expired" from a plain unauthenticated visit.
pub const EXPIRED_QUERY: &str = "reason=expired";

/// Informational message shown above the login form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginNotice {
    /// The previous session was signed out for inactivity.
    Expired,
}

impl LoginNotice {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Expired => {
                "Your session expired due to inactivity. Please sign in again."
            }
        }
    }

    /// The query marker this notice adds to the login path.
    pub fn query(&self) -> &'static str {
        match self {
            Self::Expired => EXPIRED_QUERY,
        }
    }

    /// Reads the notice marker off a login URL, e.g. `/login?reason=expired`.
    pub fn from_path(path: &str) -> Option<Self> {
        let (_, query) = path.split_once('?')?;
        query
            .split('&')
            .any(|pair| pair == EXPIRED_QUERY)
            .then_some(Self::Expired)
    }
}

/// Holds at most one pending notice.
#[derive(Debug, Clone, Default)]
pub struct NoticeSlot {
    pending: Option<LoginNotice>,
}

impl NoticeSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, notice: LoginNotice) {
        self.pending = Some(notice);
    }

    /// The pending notice, left in place.
    pub fn peek(&self) -> Option<LoginNotice> {
        self.pending
    }

    /// The pending notice, removed. A second call returns `None`.
    pub fn take(&mut self) -> Option<LoginNotice> {
        self.pending.take()
    }

    /// Updates the slot from a lifecycle event.
    ///
    /// Only an idle expiry arms it. A new session (login or restore)
    /// makes any pending notice moot.
    pub fn observe(&mut self, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::SignedOut { reason } if reason.is_expiry() => {
                tracing::debug!("expiry notice armed");
                self.arm(LoginNotice::Expired);
            }
            LifecycleEvent::SignedIn { .. } | LifecycleEvent::Restored { .. } => {
                self.pending = None;
            }
            _ => {}
        }
    }
}

//! Route gates: the navigation layer's render / redirect / block decision.
//!
//! Both gates see three states, not two. While the lifecycle is still
//! initializing they answer [`GateOutcome::Loading`] and never redirect,
//! so a returning user with a valid stored session isn't bounced to login
//! before rehydration finishes.
//!
//! ```text
//!                 Initializing ──→ Loading
//!   AuthGate:     Anonymous    ──→ Redirect(/login)
//!                 Authenticated ─→ Render
//!
//!   RoleGate:     AuthGate first; on Render, has_role decides
//!                 Render or Forbidden { role, required }
//! ```

use std::fmt;

use vigil_session::AuthState;
use vigil_store::Role;

use crate::{LOGIN_PATH, LoginNotice, RoleRequirement};

// ---------------------------------------------------------------------------
// Redirect
// ---------------------------------------------------------------------------

/// Where to send the user instead of the requested route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    notice: Option<LoginNotice>,
}

impl Redirect {
    /// A redirect to the login surface, optionally carrying a notice marker.
    pub fn to_login(notice: Option<LoginNotice>) -> Self {
        Self { notice }
    }

    pub fn notice(&self) -> Option<LoginNotice> {
        self.notice
    }

    /// The target path: `/login`, or `/login?reason=expired`.
    pub fn path(&self) -> String {
        match self.notice {
            Some(notice) => format!("{LOGIN_PATH}?{}", notice.query()),
            None => LOGIN_PATH.to_string(),
        }
    }
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

// ---------------------------------------------------------------------------
// GateOutcome
// ---------------------------------------------------------------------------

/// What the navigation layer should do with a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Session state not known yet: show a neutral loading view.
    Loading,
    /// Show the guarded content.
    Render,
    /// Go somewhere else.
    Redirect(Redirect),
    /// Stay on the URL and show the blocked-access view.
    /// `role` is the user's actual role, shown for their own diagnosis.
    Forbidden {
        role: Role,
        required: RoleRequirement,
    },
}

impl GateOutcome {
    pub fn is_render(&self) -> bool {
        matches!(self, Self::Render)
    }
}

impl fmt::Display for GateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => write!(f, "loading"),
            Self::Render => write!(f, "render"),
            Self::Redirect(redirect) => write!(f, "redirect to {redirect}"),
            Self::Forbidden { role, required } => write!(
                f,
                "access denied: your role is {role}, this page requires {required}"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Gates
// ---------------------------------------------------------------------------

/// A decision point consulted before rendering a route.
pub trait RouteGate {
    fn check(&self, state: &AuthState) -> GateOutcome;
}

/// Requires a session.
#[derive(Debug, Clone, Default)]
pub struct AuthGate {
    notice: Option<LoginNotice>,
}

impl AuthGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a notice to the login redirect this gate may produce.
    pub fn with_notice(mut self, notice: Option<LoginNotice>) -> Self {
        self.notice = notice;
        self
    }
}

impl RouteGate for AuthGate {
    fn check(&self, state: &AuthState) -> GateOutcome {
        match state {
            AuthState::Initializing => GateOutcome::Loading,
            AuthState::Anonymous => {
                GateOutcome::Redirect(Redirect::to_login(self.notice))
            }
            AuthState::Authenticated(_) => GateOutcome::Render,
        }
    }
}

/// Requires a session holding one of the accepted roles.
#[derive(Debug, Clone)]
pub struct RoleGate {
    auth: AuthGate,
    required: RoleRequirement,
}

impl RoleGate {
    pub fn new(required: impl Into<RoleRequirement>) -> Self {
        Self {
            auth: AuthGate::new(),
            required: required.into(),
        }
    }

    pub fn with_notice(mut self, notice: Option<LoginNotice>) -> Self {
        self.auth = self.auth.with_notice(notice);
        self
    }

    pub fn required(&self) -> &RoleRequirement {
        &self.required
    }
}

impl RouteGate for RoleGate {
    fn check(&self, state: &AuthState) -> GateOutcome {
        // Authentication before role: an anonymous visitor is sent to
        // login, never shown the forbidden view.
        let outcome = self.auth.check(state);
        if !outcome.is_render() {
            return outcome;
        }
        match state.role() {
            Some(role) if self.required.accepts(role) => GateOutcome::Render,
            Some(role) => {
                tracing::debug!(%role, required = %self.required, "role gate denied");
                GateOutcome::Forbidden {
                    role,
                    required: self.required.clone(),
                }
            }
            None => GateOutcome::Redirect(Redirect::to_login(None)),
        }
    }
}

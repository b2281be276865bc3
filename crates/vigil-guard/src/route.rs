//! Route access declarations.
//!
//! Every guarded route names the roles it accepts as a literal set. The
//! table never infers roles from context: a path either matches a
//! declaration or falls back to "signed in, any role".

use serde::{Deserialize, Serialize};
use vigil_session::AuthState;
use vigil_store::Role;

use crate::{AuthGate, GateOutcome, LOGIN_PATH, LoginNotice, RoleGate, RoleRequirement, RouteGate};

/// Who may open a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// Anyone, signed in or not.
    Public,
    /// Any signed-in user.
    Authenticated,
    /// A signed-in user holding one of these roles.
    Roles(RoleRequirement),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Route {
    prefix: String,
    access: Access,
}

/// Maps path prefixes to their [`Access`] rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    routes: Vec<Route>,
    fallback: Access,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable {
    /// An empty table: every path requires a session.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            fallback: Access::Authenticated,
        }
    }

    /// Declares `prefix` and everything beneath it. A later declaration
    /// for the same prefix replaces the earlier one.
    pub fn route(mut self, prefix: impl Into<String>, access: Access) -> Self {
        let prefix = normalize(&prefix.into()).to_string();
        self.routes.retain(|r| r.prefix != prefix);
        self.routes.push(Route { prefix, access });
        self
    }

    /// Shorthand for a role-restricted route.
    pub fn roles(self, prefix: impl Into<String>, required: impl Into<RoleRequirement>) -> Self {
        self.route(prefix, Access::Roles(required.into()))
    }

    /// The rule for `path`: the longest declared prefix that matches on a
    /// segment boundary, else the fallback.
    pub fn access(&self, path: &str) -> &Access {
        let path = normalize(path);
        self.routes
            .iter()
            .filter(|r| matches_prefix(path, &r.prefix))
            .max_by_key(|r| r.prefix.len())
            .map_or(&self.fallback, |r| &r.access)
    }

    /// Runs the gate for `path` against `state`.
    ///
    /// `notice` is attached to any login redirect the gate produces.
    pub fn check(
        &self,
        path: &str,
        state: &AuthState,
        notice: Option<LoginNotice>,
    ) -> GateOutcome {
        let outcome = match self.access(path) {
            Access::Public => GateOutcome::Render,
            Access::Authenticated => AuthGate::new().with_notice(notice).check(state),
            Access::Roles(required) => {
                RoleGate::new(required.clone()).with_notice(notice).check(state)
            }
        };
        tracing::trace!(path, %outcome, "route gate");
        outcome
    }

    /// The content console's routes.
    ///
    /// Content sections are for staff who edit; user management and
    /// settings are admin-only. The dashboard is open to every role.
    pub fn cms() -> Self {
        let staff = [Role::Admin, Role::Editor];
        Self::new()
            .route(LOGIN_PATH, Access::Public)
            .route("/", Access::Authenticated)
            .route("/dashboard", Access::Authenticated)
            .roles("/conditions", staff)
            .roles("/interventions", staff)
            .roles("/recipes", staff)
            .roles("/scriptures", staff)
            .roles("/users", Role::Admin)
            .roles("/settings", Role::Admin)
    }
}

/// Drops the query string and any trailing slash (except for the root).
fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return path == "/";
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

//! Role authorization and route gates for Vigil.
//!
//! Everything here is a pure function of an [`AuthState`](vigil_session::AuthState)
//! snapshot. Nothing holds session state of its own.
//!
//! - [`has_role`] and [`Permissions`]: "may this user do X"
//! - [`AuthGate`] and [`RoleGate`]: "render, redirect, or block this route"
//! - [`RouteTable`]: which gate applies to which path
//! - [`NoticeSlot`]: the one-time expiry notice on the login surface

mod gate;
mod notice;
mod role;
mod route;

pub use gate::{AuthGate, GateOutcome, Redirect, RoleGate, RouteGate};
pub use notice::{EXPIRED_QUERY, LOGIN_PATH, LoginNotice, NoticeSlot};
pub use role::{Permissions, RoleRequirement, has_role};
pub use route::{Access, RouteTable};

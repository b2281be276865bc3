//! # Vigil
//!
//! Client-side session lifecycle and route guarding for an admin console.
//!
//! Vigil keeps exactly one answer to "is there a valid session right now,
//! and may this user open this page": it restores a stored session at
//! startup, signs the user out after 30 minutes without interaction, and
//! gates routes by authentication and role.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vigil::prelude::*;
//!
//! // Implement LoginClient over your API, then:
//! // let mut console = Console::builder()
//! //     .storage(FileStorage::new("session.json"))
//! //     .build(my_login_client)
//! //     .await?;
//! // console.sign_in(&Credentials::new("ada@example.org", "pw")).await?;
//! // match console.navigate("/users") { ... }
//! ```

mod console;
mod error;
pub mod logging;

pub use console::{Console, ConsoleBuilder};
pub use error::VigilError;

pub use vigil_activity as activity;
pub use vigil_guard as guard;
pub use vigil_session as session;
pub use vigil_store as store;

pub mod prelude {
    pub use crate::{Console, ConsoleBuilder, VigilError};

    pub use vigil_activity::{ActivitySignal, InputBus, InputEvent};
    pub use vigil_guard::{
        Access, GateOutcome, LoginNotice, Permissions, Redirect, RoleRequirement,
        RouteTable, has_role,
    };
    pub use vigil_session::{
        ActiveSession, AuthState, Clock, Credentials, FieldErrors, LifecycleEvent,
        LoginClient, LoginError, LoginResponse, SessionConfig, SessionHandle,
        SignOutReason,
    };
    pub use vigil_store::{
        BearerToken, FileStorage, MemoryStorage, Role, Storage, User, UserId,
    };
}

//! The login call: the one place a session comes from.
//!
//! Vigil doesn't talk to the API itself. It defines the [`LoginClient`]
//! trait: hand it credentials, get back a token and a user, or an error
//! explaining why not. The application implements it over its HTTP
//! client; tests implement it with a fixture.
//!
//! A failed login never establishes or touches a session. The error goes
//! back to the caller untouched so the form can show it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use vigil_store::{BearerToken, User};

/// What the login form submits.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A successful login: `{ token, user }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: BearerToken,
    pub user: User,
}

/// Field name → messages for that field, as returned by API validation.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Why a login did not produce a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    /// The API rejected specific fields.
    #[error("validation failed: {}", join_field_errors(.0))]
    Validation(FieldErrors),

    /// The API rejected the attempt with a general message
    /// (wrong password, locked account, ...).
    #[error("login rejected: {0}")]
    Rejected(String),

    /// The request never got a usable answer.
    #[error("login request failed: {0}")]
    Transport(String),
}

impl LoginError {
    /// Text to show on the login form.
    ///
    /// Field errors win when there are any; otherwise the generic message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(fields) if !fields.is_empty() => {
                join_field_errors(fields)
            }
            Self::Validation(_) => "Login failed".to_string(),
            Self::Rejected(msg) | Self::Transport(msg) => msg.clone(),
        }
    }
}

fn join_field_errors(fields: &FieldErrors) -> String {
    fields
        .iter()
        .map(|(field, msgs)| format!("{field}: {}", msgs.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Exchanges credentials for a session.
///
/// # Example
///
/// ```rust
/// use vigil_session::{Credentials, LoginClient, LoginError, LoginResponse};
///
/// /// Rejects everyone. Handy for exercising the failure path.
/// struct ClosedDoor;
///
/// impl LoginClient for ClosedDoor {
///     async fn login(
///         &self,
///         _credentials: &Credentials,
///     ) -> Result<LoginResponse, LoginError> {
///         Err(LoginError::Rejected("logins are disabled".into()))
///     }
/// }
/// ```
pub trait LoginClient: Send + Sync + 'static {
    /// Submits credentials to the API.
    ///
    /// # Returns
    /// - `Ok(LoginResponse)`: the API issued a token for this user
    /// - `Err(LoginError)`: anything else; the caller surfaces it as-is
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<LoginResponse, LoginError>> + Send;
}
